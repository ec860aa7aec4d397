//! Section properties for frame elements

use serde::{Deserialize, Serialize};

/// Cross-section properties for frame elements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Cross-sectional area in m²
    pub a: f64,
    /// Moment of inertia about local y-axis in m⁴
    pub iy: f64,
    /// Moment of inertia about local z-axis in m⁴
    pub iz: f64,
    /// Torsional constant in m⁴
    pub j: f64,
    /// Effective shear area for bending about local z (optional) in m².
    /// When present, shear deformation enters the member stiffness.
    pub ay: Option<f64>,
    /// Effective shear area for bending about local y (optional) in m²
    pub az: Option<f64>,
    /// Depth of section (optional) in m
    pub depth: Option<f64>,
    /// Width of section (optional) in m
    pub width: Option<f64>,
}

impl Section {
    /// Create a new section with basic properties
    pub fn new(a: f64, iy: f64, iz: f64, j: f64) -> Self {
        Self {
            a,
            iy,
            iz,
            j,
            ay: None,
            az: None,
            depth: None,
            width: None,
        }
    }

    /// Set effective shear areas, enabling shear deformation terms
    pub fn with_shear_areas(mut self, ay: f64, az: f64) -> Self {
        self.ay = Some(ay);
        self.az = Some(az);
        self
    }

    /// Create a rectangular section
    pub fn rectangular(width: f64, depth: f64) -> Self {
        let a = width * depth;
        let iy = width * depth.powi(3) / 12.0;
        let iz = depth * width.powi(3) / 12.0;

        // Torsional constant for rectangle (approximate)
        let (a_dim, b_dim) = if width > depth {
            (width, depth)
        } else {
            (depth, width)
        };
        let j = a_dim * b_dim.powi(3) / 3.0 * (1.0 - 0.63 * b_dim / a_dim);

        Self {
            a,
            iy,
            iz,
            j,
            ay: None,
            az: None,
            depth: Some(depth),
            width: Some(width),
        }
    }

    /// Create a circular section
    pub fn circular(diameter: f64) -> Self {
        let r = diameter / 2.0;
        let a = std::f64::consts::PI * r.powi(2);
        let i = std::f64::consts::PI * r.powi(4) / 4.0;
        let j = std::f64::consts::PI * r.powi(4) / 2.0;

        Self {
            a,
            iy: i,
            iz: i,
            j,
            ay: None,
            az: None,
            depth: Some(diameter),
            width: Some(diameter),
        }
    }

    /// Create a hollow circular (pipe) section
    pub fn pipe(outer_diameter: f64, wall_thickness: f64) -> Self {
        let r_o = outer_diameter / 2.0;
        let r_i = r_o - wall_thickness;

        let a = std::f64::consts::PI * (r_o.powi(2) - r_i.powi(2));
        let i = std::f64::consts::PI * (r_o.powi(4) - r_i.powi(4)) / 4.0;
        let j = std::f64::consts::PI * (r_o.powi(4) - r_i.powi(4)) / 2.0;

        Self {
            a,
            iy: i,
            iz: i,
            j,
            ay: None,
            az: None,
            depth: Some(outer_diameter),
            width: Some(outer_diameter),
        }
    }

    /// Create a wide flange (I-beam) section
    ///
    /// # Arguments
    /// * `depth` - Total depth of section
    /// * `flange_width` - Width of flange
    /// * `flange_thickness` - Thickness of flange
    /// * `web_thickness` - Thickness of web
    pub fn wide_flange(
        depth: f64,
        flange_width: f64,
        flange_thickness: f64,
        web_thickness: f64,
    ) -> Self {
        let bf = flange_width;
        let tf = flange_thickness;
        let tw = web_thickness;
        let d = depth;
        let hw = d - 2.0 * tf;

        let a = 2.0 * bf * tf + hw * tw;

        // Strong axis (y), weak axis (z)
        let iy = (bf * d.powi(3) - (bf - tw) * hw.powi(3)) / 12.0;
        let iz = (2.0 * tf * bf.powi(3) + hw * tw.powi(3)) / 12.0;

        // Torsional constant (approximate)
        let j = (2.0 * bf * tf.powi(3) + hw * tw.powi(3)) / 3.0;

        Self {
            a,
            iy,
            iz,
            j,
            // Web carries strong-axis shear, flanges weak-axis
            ay: Some(d * tw),
            az: Some(2.0 * bf * tf * 5.0 / 6.0),
            depth: Some(d),
            width: Some(bf),
        }
    }

    /// Create a box/tube section
    pub fn box_section(width: f64, depth: f64, wall_thickness: f64) -> Self {
        let t = wall_thickness;
        let b = width;
        let d = depth;
        let bi = b - 2.0 * t;
        let di = d - 2.0 * t;

        let a = b * d - bi * di;
        let iy = (b * d.powi(3) - bi * di.powi(3)) / 12.0;
        let iz = (d * b.powi(3) - di * bi.powi(3)) / 12.0;

        // Torsional constant for closed thin-walled section
        let am = (b - t) * (d - t);
        let s = 2.0 * (b + d) - 4.0 * t;
        let j = 4.0 * am.powi(2) * t / s;

        Self {
            a,
            iy,
            iz,
            j,
            ay: Some(2.0 * d * t),
            az: Some(2.0 * b * t),
            depth: Some(d),
            width: Some(b),
        }
    }

    /// Get the radius of gyration about y-axis
    pub fn ry(&self) -> f64 {
        (self.iy / self.a).sqrt()
    }

    /// Get the radius of gyration about z-axis
    pub fn rz(&self) -> f64 {
        (self.iz / self.a).sqrt()
    }

    /// Get the polar moment of inertia
    pub fn ip(&self) -> f64 {
        self.iy + self.iz
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::rectangular(0.2, 0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_section() {
        let section = Section::rectangular(0.3, 0.5);
        let expected_a = 0.3 * 0.5;
        let expected_iy = 0.3 * 0.5_f64.powi(3) / 12.0;

        assert!((section.a - expected_a).abs() < 1e-10);
        assert!((section.iy - expected_iy).abs() < 1e-10);
    }

    #[test]
    fn test_circular_section() {
        let section = Section::circular(0.5);
        let r: f64 = 0.25;
        let expected_a = std::f64::consts::PI * r.powi(2);

        assert!((section.a - expected_a).abs() < 1e-10);
        assert!((section.iy - section.iz).abs() < 1e-10);
    }
}
