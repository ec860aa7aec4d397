//! Result types and the per-combination results store

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::FrameError;

/// Activation state of a direction-dependent element, owned by the solver
/// and re-derived from the latest trial solution on every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Element participates in the stiffness system
    Active,
    /// Element is removed from the stiffness system for the current state
    Inactive,
}

impl Activation {
    /// True when the element participates in the solve
    pub fn is_active(self) -> bool {
        matches!(self, Activation::Active)
    }
}

/// Displacement results at a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeDisplacement {
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
    /// Displacement in Z direction
    pub dz: f64,
    /// Rotation about X axis
    pub rx: f64,
    /// Rotation about Y axis
    pub ry: f64,
    /// Rotation about Z axis
    pub rz: f64,
}

impl NodeDisplacement {
    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }

    /// Get translation magnitude
    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    /// Get rotation magnitude
    pub fn rotation_magnitude(&self) -> f64 {
        (self.rx.powi(2) + self.ry.powi(2) + self.rz.powi(2)).sqrt()
    }
}

/// Reaction forces at a supported node
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Reactions {
    /// Reaction force in X direction
    pub fx: f64,
    /// Reaction force in Y direction
    pub fy: f64,
    /// Reaction force in Z direction
    pub fz: f64,
    /// Reaction moment about X axis
    pub mx: f64,
    /// Reaction moment about Y axis
    pub my: f64,
    /// Reaction moment about Z axis
    pub mz: f64,
}

impl Reactions {
    /// Create from array [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            fx: arr[0],
            fy: arr[1],
            fz: arr[2],
            mx: arr[3],
            my: arr[4],
            mz: arr[5],
        }
    }

    /// Get total force magnitude
    pub fn force_magnitude(&self) -> f64 {
        (self.fx.powi(2) + self.fy.powi(2) + self.fz.powi(2)).sqrt()
    }

    /// Get total moment magnitude
    pub fn moment_magnitude(&self) -> f64 {
        (self.mx.powi(2) + self.my.powi(2) + self.mz.powi(2)).sqrt()
    }
}

/// Internal forces at one end of a member
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemberForces {
    /// Axial force (positive = tension)
    pub axial: f64,
    /// Shear force in local y direction
    pub shear_y: f64,
    /// Shear force in local z direction
    pub shear_z: f64,
    /// Torsion
    pub torsion: f64,
    /// Bending moment about local y axis
    pub moment_y: f64,
    /// Bending moment about local z axis
    pub moment_z: f64,
}

impl MemberForces {
    /// Create from local force array at i-node
    pub fn from_i_node_forces(forces: &[f64; 12]) -> Self {
        Self {
            axial: -forces[0],
            shear_y: forces[1],
            shear_z: forces[2],
            torsion: -forces[3],
            moment_y: forces[4],
            moment_z: forces[5],
        }
    }

    /// Create from local force array at j-node
    pub fn from_j_node_forces(forces: &[f64; 12]) -> Self {
        Self {
            axial: forces[6],
            shear_y: -forces[7],
            shear_z: -forces[8],
            torsion: forces[9],
            moment_y: forces[10],
            moment_z: forces[11],
        }
    }
}

/// Internal stresses in a plate element
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlateStresses {
    /// Membrane stress Sx (in-plane, x direction)
    pub sx: f64,
    /// Membrane stress Sy (in-plane, y direction)
    pub sy: f64,
    /// Membrane shear stress Txy (in-plane)
    pub txy: f64,
    /// Bending moment Mx per unit width
    pub mx: f64,
    /// Bending moment My per unit width
    pub my: f64,
    /// Twisting moment Mxy per unit width
    pub mxy: f64,
}

impl PlateStresses {
    /// Von Mises equivalent stress for the membrane (plane stress) state
    pub fn von_mises(&self) -> f64 {
        (self.sx.powi(2) - self.sx * self.sy + self.sy.powi(2) + 3.0 * self.txy.powi(2)).sqrt()
    }
}

/// Per-segment solved state of a member chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentResult {
    /// Segment start node
    pub i_node: String,
    /// Segment end node
    pub j_node: String,
    /// Distance from the physical member's i-node to this segment's start
    pub x_start: f64,
    /// Segment length
    pub length: f64,
    /// Local end forces [Fx_i..Mz_i, Fx_j..Mz_j]
    pub local_forces: [f64; 12],
    /// Local end displacements
    pub local_displacements: [f64; 12],
}

/// Solved state of a member (all analysis segments of the physical chain)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResult {
    /// Activation state at convergence
    pub activation: Activation,
    /// Per-segment records, ordered from the i-node
    pub segments: Vec<SegmentResult>,
}

impl MemberResult {
    /// Forces at the physical member's i-end
    pub fn forces_i(&self) -> Option<MemberForces> {
        self.segments
            .first()
            .map(|s| MemberForces::from_i_node_forces(&s.local_forces))
    }

    /// Forces at the physical member's j-end
    pub fn forces_j(&self) -> Option<MemberForces> {
        self.segments
            .last()
            .map(|s| MemberForces::from_j_node_forces(&s.local_forces))
    }

    /// Axial force with the largest magnitude across segments
    /// (positive = tension)
    pub fn governing_axial(&self) -> f64 {
        let mut governing = 0.0_f64;
        for segment in &self.segments {
            let axial = -segment.local_forces[0];
            if axial.abs() > governing.abs() {
                governing = axial;
            }
        }
        governing
    }
}

/// Solved state of a two-node spring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringResult {
    /// Activation state at convergence
    pub activation: Activation,
    /// Axial force (positive = tension); zero for an inactive spring
    pub axial_force: f64,
}

/// Solved state of a plate or quad element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateResult {
    /// Local corner forces (24 DOFs)
    pub local_forces: [f64; 24],
    /// Local corner displacements (24 DOFs)
    pub local_displacements: [f64; 24],
    /// Stresses at the element centre
    pub stresses: PlateStresses,
}

/// Complete converged results for one load combination.
///
/// Produced only by a converged solve and published atomically into the
/// model's results store; readers never observe a mid-iteration state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboResults {
    /// Iterations the nonlinear controller spent reaching the fixed point
    pub iterations: usize,
    /// Nodal displacements [DX, DY, DZ, RX, RY, RZ] by node name
    pub displacements: HashMap<String, [f64; 6]>,
    /// Support reactions [FX, FY, FZ, MX, MY, MZ] by node name
    pub reactions: HashMap<String, [f64; 6]>,
    /// Member results by member name
    pub members: HashMap<String, MemberResult>,
    /// Spring results by spring name
    pub springs: HashMap<String, SpringResult>,
    /// Plate and quad results by element name
    pub plates: HashMap<String, PlateResult>,
}

/// Per-combination outcome of an analysis run.
///
/// A failed combination never aborts its siblings; its error is recorded
/// here instead.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    /// Combinations that converged and were published
    pub converged: Vec<String>,
    /// Combinations that failed, with the error that stopped them
    pub failures: Vec<(String, FrameError)>,
}

impl AnalysisReport {
    /// True when every requested combination converged
    pub fn all_converged(&self) -> bool {
        self.failures.is_empty()
    }

    /// Consume the report, failing on the first recorded combination error
    pub fn into_result(mut self) -> Result<(), FrameError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(self.failures.remove(0).1)
        }
    }
}

/// Summary of analysis results for one combination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Maximum displacement
    pub max_displacement: f64,
    /// Node with maximum displacement
    pub max_disp_node: String,
    /// Maximum reaction force
    pub max_reaction: f64,
    /// Node with maximum reaction
    pub max_reaction_node: String,
    /// Maximum member axial force
    pub max_axial: f64,
    /// Member with maximum axial
    pub max_axial_member: String,
    /// Maximum member moment
    pub max_moment: f64,
    /// Member with maximum moment
    pub max_moment_member: String,
    /// Total number of nodes
    pub num_nodes: usize,
    /// Total number of members
    pub num_members: usize,
    /// Total number of plates/quads
    pub num_plates: usize,
    /// Total DOFs
    pub total_dofs: usize,
    /// Free DOFs (unknown)
    pub free_dofs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_forces_sign_convention() {
        // Pure tension: i-end pulls back (-P), j-end pushes forward (+P)
        let mut forces = [0.0; 12];
        forces[0] = -500.0;
        forces[6] = 500.0;

        let i = MemberForces::from_i_node_forces(&forces);
        let j = MemberForces::from_j_node_forces(&forces);
        assert_eq!(i.axial, 500.0);
        assert_eq!(j.axial, 500.0);
    }

    #[test]
    fn test_governing_axial_picks_largest() {
        let make_segment = |axial: f64| SegmentResult {
            i_node: "A".into(),
            j_node: "B".into(),
            x_start: 0.0,
            length: 1.0,
            local_forces: {
                let mut f = [0.0; 12];
                f[0] = -axial;
                f
            },
            local_displacements: [0.0; 12],
        };

        let result = MemberResult {
            activation: Activation::Active,
            segments: vec![make_segment(100.0), make_segment(-250.0)],
        };
        assert_eq!(result.governing_axial(), -250.0);
    }

    #[test]
    fn test_von_mises_uniaxial() {
        let stresses = PlateStresses {
            sx: 100.0,
            ..Default::default()
        };
        assert!((stresses.von_mises() - 100.0).abs() < 1e-12);
    }
}
