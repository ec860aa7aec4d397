//! Structural elements module

mod material;
mod member;
mod node;
mod plate;
mod quad;
mod section;
mod spring;
mod support;

pub use material::Material;
pub use member::{Member, MemberReleases};
pub use node::{Node, DOF_LABELS};
pub use plate::Plate;
pub use quad::Quad;
pub use section::Section;
pub use spring::Spring;
pub use support::{SpringSense, Support, SupportSpring};
