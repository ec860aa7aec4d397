//! frame3d - 3D elastic structural analysis
//!
//! A direct-stiffness analysis engine for space frames, springs and shells:
//! - frame members (beams, columns, braces) with end releases, optional
//!   shear deformation and physical-member subdivision
//! - two-node springs and per-DOF support springs, including one-way behavior
//! - rectangular plates (Kirchhoff) and general quadrilaterals (MITC4)
//! - load cases and factored load combinations
//! - tension/compression-only iteration and P-Delta (second order) analysis
//!
//! ## Example
//! ```rust
//! use frame3d::prelude::*;
//!
//! let mut model = Model::new();
//!
//! // Properties
//! model.add_material("Steel", Material::steel()).unwrap();
//! model.add_section("W12x26", Section::new(4.94e-3, 8.49e-5, 7.2e-6, 1.25e-7)).unwrap();
//!
//! // Geometry
//! model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
//! model.add_node("N2", Node::new(10.0, 0.0, 0.0)).unwrap();
//! model.add_member("M1", Member::new("N1", "N2", "Steel", "W12x26")).unwrap();
//! model.add_support("N1", Support::fixed()).unwrap();
//!
//! // Loads
//! model.add_node_load("N2", NodeLoad::fy(-10_000.0, "Case 1")).unwrap();
//!
//! // Analyze and read results
//! let report = model.analyze_linear().unwrap();
//! assert!(report.all_converged());
//! let displacement = model.node_displacement("N2", "Combo 1").unwrap();
//! assert!(displacement.dy < 0.0);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisOptions, AnalysisType};
    pub use crate::elements::{
        Material, Member, MemberReleases, Node, Plate, Quad, Section, Spring, SpringSense,
        Support, SupportSpring,
    };
    pub use crate::error::{FrameError, FrameResult};
    pub use crate::loads::{
        DistributedLoad, LoadCase, LoadCombination, LoadDirection, NodeLoad, PlateLoad,
        PointLoad,
    };
    pub use crate::model::Model;
    pub use crate::results::{
        Activation, AnalysisReport, MemberForces, NodeDisplacement, PlateStresses, Reactions,
    };
}
