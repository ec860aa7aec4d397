//! Spring - two-node axial spring element

use serde::{Deserialize, Serialize};

/// A two-node axial spring.
///
/// The spring resists relative displacement along the line between its nodes
/// with the given stiffness. Tension-only and compression-only springs are
/// toggled active/inactive by the iteration controller from the sign of the
/// computed axial force; that state is solver-owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spring {
    /// Name of the i-node (start)
    pub i_node: String,
    /// Name of the j-node (end)
    pub j_node: String,
    /// Axial stiffness (force per unit relative displacement)
    pub stiffness: f64,
    /// Tension-only flag
    pub tension_only: bool,
    /// Compression-only flag
    pub compression_only: bool,
}

impl Spring {
    /// Create a new two-way spring
    pub fn new(i_node: &str, j_node: &str, stiffness: f64) -> Self {
        Self {
            i_node: i_node.to_string(),
            j_node: j_node.to_string(),
            stiffness,
            tension_only: false,
            compression_only: false,
        }
    }

    /// Set as tension-only spring
    pub fn tension_only(mut self) -> Self {
        self.tension_only = true;
        self.compression_only = false;
        self
    }

    /// Set as compression-only spring
    pub fn compression_only(mut self) -> Self {
        self.compression_only = true;
        self.tension_only = false;
        self
    }

    /// True for tension-only or compression-only springs
    pub fn is_one_way(&self) -> bool {
        self.tension_only || self.compression_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_flags() {
        let spring = Spring::new("N1", "N2", 1e6).tension_only();
        assert!(spring.tension_only);
        assert!(!spring.compression_only);
        assert!(spring.is_one_way());

        let spring = spring.compression_only();
        assert!(spring.compression_only);
        assert!(!spring.tension_only);
    }
}
