//! Distributed loads on members

use super::point_load::LoadDirection;
use serde::{Deserialize, Serialize};

/// A distributed (line) load on a member.
///
/// Magnitude varies linearly from `w1` at `x1` to `w2` at `x2`, positions
/// measured from the member's i-node along its full physical length.
/// `x2 = f64::INFINITY` means "to the member end".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Start magnitude (at start position)
    pub w1: f64,
    /// End magnitude (at end position)
    pub w2: f64,
    /// Start position (distance from i-node)
    pub x1: f64,
    /// End position (distance from i-node)
    pub x2: f64,
    /// Load direction
    pub direction: LoadDirection,
    /// Load case
    pub case: String,
}

impl DistributedLoad {
    /// Create a new distributed load
    pub fn new(w1: f64, w2: f64, x1: f64, x2: f64, direction: LoadDirection, case: &str) -> Self {
        Self {
            w1,
            w2,
            x1,
            x2,
            direction,
            case: case.to_string(),
        }
    }

    /// Create a uniform distributed load over the full member length
    pub fn uniform(w: f64, direction: LoadDirection, case: &str) -> Self {
        Self::new(w, w, 0.0, f64::INFINITY, direction, case)
    }

    /// Create a uniform downward load (negative global Y)
    pub fn uniform_downward(w: f64, case: &str) -> Self {
        Self::uniform(-w.abs(), LoadDirection::FY, case)
    }

    /// Create a triangular load (zero at start, max at end)
    pub fn triangular(w_max: f64, x1: f64, x2: f64, direction: LoadDirection, case: &str) -> Self {
        Self::new(0.0, w_max, x1, x2, direction, case)
    }

    /// Check if the load is uniform (constant magnitude)
    pub fn is_uniform(&self) -> bool {
        (self.w1 - self.w2).abs() < 1e-10
    }

    /// Magnitude at a position along the loaded span (linear interpolation)
    pub fn magnitude_at(&self, x: f64, member_length: f64) -> f64 {
        let x2 = if self.x2.is_finite() {
            self.x2
        } else {
            member_length
        };
        if x2 - self.x1 < 1e-12 {
            return self.w1;
        }
        let t = ((x - self.x1) / (x2 - self.x1)).clamp(0.0, 1.0);
        self.w1 + t * (self.w2 - self.w1)
    }

    /// Check if this is a local coordinate load
    pub fn is_local(&self) -> bool {
        self.direction.is_local()
    }
}
