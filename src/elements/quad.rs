//! Quad - general quadrilateral shell element (MITC4 bending)

use serde::{Deserialize, Serialize};

/// A general quadrilateral shell element.
///
/// 4 nodes with 6 DOFs per node. The bending formulation is MITC4 (assumed
/// transverse shear strains), which handles distorted geometry without shear
/// locking. Corner ordering i, j, m, n must be counter-clockwise in the
/// element plane; a clockwise or re-entrant quad has a non-positive Jacobian
/// determinant and is rejected as invalid geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quad {
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

impl Quad {
    /// Create a new quad element
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
