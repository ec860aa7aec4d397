//! Support conditions: rigid restraints, prescribed displacements and
//! per-DOF support springs

use serde::{Deserialize, Serialize};

/// Directional behavior of a support spring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpringSense {
    /// Resists displacement in both senses
    #[default]
    TwoWay,
    /// Only resists positive displacement along the DOF
    Positive,
    /// Only resists negative displacement along the DOF
    Negative,
}

/// An elastic spring support on a single nodal DOF.
///
/// The DOF stays free; the spring stiffness is added to the global diagonal
/// when the spring is engaged. One-way springs are engaged or released by the
/// iteration controller based on the trial displacement sign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SupportSpring {
    /// Spring stiffness (force per unit displacement, or moment per radian)
    pub stiffness: f64,
    /// One-way behavior
    pub sense: SpringSense,
}

impl SupportSpring {
    /// Create a two-way spring support
    pub fn new(stiffness: f64) -> Self {
        Self {
            stiffness,
            sense: SpringSense::TwoWay,
        }
    }

    /// Create a one-way spring support
    pub fn one_way(stiffness: f64, sense: SpringSense) -> Self {
        Self { stiffness, sense }
    }
}

/// Support conditions at a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Support {
    /// Restrained in X translation
    pub dx: bool,
    /// Restrained in Y translation
    pub dy: bool,
    /// Restrained in Z translation
    pub dz: bool,
    /// Restrained in X rotation
    pub rx: bool,
    /// Restrained in Y rotation
    pub ry: bool,
    /// Restrained in Z rotation
    pub rz: bool,

    /// Prescribed displacements [DX, DY, DZ, RX, RY, RZ]; only read for
    /// restrained DOFs (support settlement)
    pub enforced: [Option<f64>; 6],

    /// Spring supports per DOF [DX, DY, DZ, RX, RY, RZ]
    pub springs: [Option<SupportSpring>; 6],
}

impl Support {
    /// Create a new support with no restraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fully fixed support (all DOFs restrained)
    pub fn fixed() -> Self {
        Self {
            dx: true,
            dy: true,
            dz: true,
            rx: true,
            ry: true,
            rz: true,
            ..Default::default()
        }
    }

    /// Create a pinned support (translations restrained, rotations free)
    pub fn pinned() -> Self {
        Self {
            dx: true,
            dy: true,
            dz: true,
            ..Default::default()
        }
    }

    /// Create a roller support (Y translation restrained only)
    pub fn roller_y() -> Self {
        Self {
            dy: true,
            ..Default::default()
        }
    }

    /// Create a roller support (X translation restrained only)
    pub fn roller_x() -> Self {
        Self {
            dx: true,
            ..Default::default()
        }
    }

    /// Create a support with specific restraints
    pub fn with_restraints(dx: bool, dy: bool, dz: bool, rx: bool, ry: bool, rz: bool) -> Self {
        Self {
            dx,
            dy,
            dz,
            rx,
            ry,
            rz,
            ..Default::default()
        }
    }

    /// Prescribe a displacement on a DOF (restrains it as a side effect)
    pub fn with_enforced(mut self, dof: usize, value: f64) -> Self {
        self.enforced[dof] = Some(value);
        match dof {
            0 => self.dx = true,
            1 => self.dy = true,
            2 => self.dz = true,
            3 => self.rx = true,
            4 => self.ry = true,
            5 => self.rz = true,
            _ => {}
        }
        self
    }

    /// Set a prescribed settlement in Y
    pub fn with_enforced_dy(self, value: f64) -> Self {
        self.with_enforced(1, value)
    }

    /// Attach a spring support to a DOF (0..6: DX, DY, DZ, RX, RY, RZ)
    pub fn with_spring(mut self, dof: usize, spring: SupportSpring) -> Self {
        self.springs[dof] = Some(spring);
        self
    }

    /// Get restraint flags as an array [DX, DY, DZ, RX, RY, RZ]
    pub fn restraints(&self) -> [bool; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Get list of restrained DOF indices (0-5)
    pub fn restrained_dofs(&self) -> Vec<usize> {
        self.restraints()
            .iter()
            .enumerate()
            .filter_map(|(i, &r)| r.then_some(i))
            .collect()
    }

    /// Check if any DOF is restrained or spring-supported
    pub fn is_supported(&self) -> bool {
        self.restraints().iter().any(|&r| r) || self.springs.iter().any(|s| s.is_some())
    }

    /// Count number of restrained DOFs
    pub fn num_restrained(&self) -> usize {
        self.restraints().iter().filter(|&&r| r).count()
    }
}

impl Default for Support {
    fn default() -> Self {
        Self {
            dx: false,
            dy: false,
            dz: false,
            rx: false,
            ry: false,
            rz: false,
            enforced: [None; 6],
            springs: [None; 6],
        }
    }
}
