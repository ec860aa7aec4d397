//! Plate - rectangular shell element (membrane + Kirchhoff bending)

use serde::{Deserialize, Serialize};

/// A rectangular plate element for shell analysis.
///
/// 4 nodes with 6 DOFs per node. Corners must be given counter-clockwise
/// when viewed from the positive local z side: i, j, m, n with i-j along the
/// local x axis. Bending uses the exact Kirchhoff thin-plate matrix, so the
/// element must be geometrically rectangular; use [`Quad`](super::Quad) for
/// general quadrilaterals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plate {
    /// i-node name (corner 1)
    pub i_node: String,
    /// j-node name (corner 2)
    pub j_node: String,
    /// m-node name (corner 3)
    pub m_node: String,
    /// n-node name (corner 4)
    pub n_node: String,
    /// Thickness
    pub thickness: f64,
    /// Material name
    pub material: String,
    /// Local x stiffness modifier
    pub kx_mod: f64,
    /// Local y stiffness modifier
    pub ky_mod: f64,
}

impl Plate {
    /// Create a new plate element
    pub fn new(
        i_node: &str,
        j_node: &str,
        m_node: &str,
        n_node: &str,
        thickness: f64,
        material: &str,
    ) -> Self {
        Self {
            i_node: i_node.to_string(),
            j_node: j_node.to_string(),
            m_node: m_node.to_string(),
            n_node: n_node.to_string(),
            thickness,
            material: material.to_string(),
            kx_mod: 1.0,
            ky_mod: 1.0,
        }
    }

    /// Set stiffness modifiers
    pub fn with_modifiers(mut self, kx_mod: f64, ky_mod: f64) -> Self {
        self.kx_mod = kx_mod;
        self.ky_mod = ky_mod;
        self
    }

    /// Corner node names in order i, j, m, n
    pub fn corner_nodes(&self) -> [&str; 4] {
        [&self.i_node, &self.j_node, &self.m_node, &self.n_node]
    }
}
