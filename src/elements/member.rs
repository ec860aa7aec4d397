//! Member - 3D frame element (beam/column), optionally subdivided into a
//! chain of analysis segments by intermediate nodes ("physical member")

use serde::{Deserialize, Serialize};

/// End releases for a member (allowing specific DOFs to rotate/translate freely)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemberReleases {
    /// i-node releases [DX, DY, DZ, RX, RY, RZ]
    pub i_node: [bool; 6],
    /// j-node releases [DX, DY, DZ, RX, RY, RZ]
    pub j_node: [bool; 6],
}

impl MemberReleases {
    /// Create releases with no end releases
    pub fn none() -> Self {
        Self::default()
    }

    /// Create releases for a pin at the i-node (moment releases)
    pub fn pin_i() -> Self {
        Self {
            i_node: [false, false, false, false, true, true],
            j_node: [false; 6],
        }
    }

    /// Create releases for a pin at the j-node (moment releases)
    pub fn pin_j() -> Self {
        Self {
            i_node: [false; 6],
            j_node: [false, false, false, false, true, true],
        }
    }

    /// Create releases for pins at both ends
    pub fn pin_both() -> Self {
        Self {
            i_node: [false, false, false, false, true, true],
            j_node: [false, false, false, false, true, true],
        }
    }

    /// Get combined releases as 12-element array
    pub fn as_array(&self) -> [bool; 12] {
        let mut arr = [false; 12];
        arr[0..6].copy_from_slice(&self.i_node);
        arr[6..12].copy_from_slice(&self.j_node);
        arr
    }

    /// True if any DOF is released
    pub fn any(&self) -> bool {
        self.as_array().iter().any(|&r| r)
    }
}

/// A 3D frame member (beam or column)
///
/// A member with `intermediate_nodes` is analyzed as an ordered chain of
/// 2-node segments sharing its section and material, and reported on as one
/// continuous span. Tension/compression-only activation applies to the whole
/// chain and is owned by the solver, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Name of the i-node (start)
    pub i_node: String,
    /// Name of the j-node (end)
    pub j_node: String,
    /// Name of the material
    pub material: String,
    /// Name of the section
    pub section: String,
    /// Rotation about longitudinal axis (radians)
    pub rotation: f64,
    /// End releases
    pub releases: MemberReleases,
    /// Tension-only flag (for braces)
    pub tension_only: bool,
    /// Compression-only flag
    pub compression_only: bool,
    /// Ordered interior nodes subdividing the member into analysis segments
    pub intermediate_nodes: Vec<String>,
}

impl Member {
    /// Create a new member
    pub fn new(i_node: &str, j_node: &str, material: &str, section: &str) -> Self {
        Self {
            i_node: i_node.to_string(),
            j_node: j_node.to_string(),
            material: material.to_string(),
            section: section.to_string(),
            rotation: 0.0,
            releases: MemberReleases::none(),
            tension_only: false,
            compression_only: false,
            intermediate_nodes: Vec::new(),
        }
    }

    /// Set member rotation about its longitudinal axis
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set member end releases
    pub fn with_releases(mut self, releases: MemberReleases) -> Self {
        self.releases = releases;
        self
    }

    /// Set as tension-only member
    pub fn tension_only(mut self) -> Self {
        self.tension_only = true;
        self.compression_only = false;
        self
    }

    /// Set as compression-only member
    pub fn compression_only(mut self) -> Self {
        self.compression_only = true;
        self.tension_only = false;
        self
    }

    /// Subdivide at the given interior nodes, ordered from i-node to j-node
    pub fn with_intermediate_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intermediate_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    /// True for tension-only or compression-only members
    pub fn is_one_way(&self) -> bool {
        self.tension_only || self.compression_only
    }

    /// The full node chain from i-node to j-node
    pub fn node_chain(&self) -> Vec<&str> {
        let mut chain = Vec::with_capacity(self.intermediate_nodes.len() + 2);
        chain.push(self.i_node.as_str());
        chain.extend(self.intermediate_nodes.iter().map(String::as_str));
        chain.push(self.j_node.as_str());
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_creation() {
        let member = Member::new("N1", "N2", "Steel", "W12x26");
        assert_eq!(member.i_node, "N1");
        assert_eq!(member.j_node, "N2");
        assert_eq!(member.rotation, 0.0);
        assert!(!member.is_one_way());
    }

    #[test]
    fn test_releases() {
        let releases = MemberReleases::pin_i();
        let arr = releases.as_array();
        assert!(!arr[0]); // DX not released
        assert!(arr[4]); // RY released
        assert!(arr[5]); // RZ released
    }

    #[test]
    fn test_node_chain() {
        let member =
            Member::new("N1", "N4", "Steel", "S").with_intermediate_nodes(["N2", "N3"]);
        assert_eq!(member.node_chain(), ["N1", "N2", "N3", "N4"]);
    }
}
