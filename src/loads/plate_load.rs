//! Plate/shell loads

use serde::{Deserialize, Serialize};

/// A uniform surface pressure load on a plate or quad element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateLoad {
    /// Pressure magnitude (positive = along the +local z face normal)
    pub pressure: f64,
    /// Load case
    pub case: String,
}

impl PlateLoad {
    /// Create a new pressure load
    pub fn new(pressure: f64, case: &str) -> Self {
        Self {
            pressure,
            case: case.to_string(),
        }
    }

    /// Create a downward pressure (for horizontal plates)
    pub fn downward(pressure: f64, case: &str) -> Self {
        Self::new(-pressure.abs(), case)
    }

    /// Create an upward pressure (for horizontal plates)
    pub fn upward(pressure: f64, case: &str) -> Self {
        Self::new(pressure.abs(), case)
    }
}
