//! Immutable per-solve context: DOF numbering and prepared element data
//!
//! The context is built once per `analyze()` call from a model snapshot and
//! shared read-only by every load combination's solve, so combinations can
//! run concurrently without touching the model.

use std::collections::HashMap;

use super::AnalysisOptions;
use crate::elements::{SpringSense, DOF_LABELS};
use crate::error::{FrameError, FrameResult};
use crate::math::quad::QuadGeometry;
use crate::math::{self, Mat12, Mat24, Mat3, Vec3};
use crate::model::Model;

/// Bijective mapping between (node, local DOF index) and global DOF index.
/// Node order is sorted by name so the numbering is deterministic.
pub(crate) struct DofMap {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl DofMap {
    fn new(model: &Model) -> Self {
        let mut names: Vec<String> = model.nodes.keys().cloned().collect();
        names.sort();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    /// Global DOF index of the first DOF of a node
    pub fn base(&self, node: &str) -> usize {
        self.index[node] * 6
    }

    /// Total number of global DOFs
    pub fn n_dofs(&self) -> usize {
        self.names.len() * 6
    }

    /// Node names in DOF order
    pub fn node_names(&self) -> &[String] {
        &self.names
    }

    /// Human-readable label for a global DOF, e.g. `N3.DY`
    pub fn label(&self, dof: usize) -> String {
        format!("{}.{}", self.names[dof / 6], DOF_LABELS[dof % 6])
    }
}

/// One 2-node analysis segment of a (possibly subdivided) member
pub(crate) struct Segment {
    pub i_node: String,
    pub j_node: String,
    pub i_base: usize,
    pub j_base: usize,
    /// Distance from the physical member's i-node to this segment's start
    pub x_start: f64,
    pub length: f64,
    /// Uncondensed local elastic stiffness
    pub k_raw: Mat12,
    /// Local elastic stiffness with end releases condensed out
    pub k_local: Mat12,
    /// End releases applying to this segment (physical ends only)
    pub releases: [bool; 12],
    pub has_releases: bool,
}

/// A member with its resolved properties and segment chain
pub(crate) struct PreparedMember {
    pub name: String,
    /// 12x12 local-to-global transformation (segments are collinear and
    /// share it)
    pub t: Mat12,
    /// Direction cosine matrix for resolving global loads into local axes
    pub rot: Mat3,
    pub tension_only: bool,
    pub compression_only: bool,
    pub area: f64,
    pub iy: f64,
    pub iz: f64,
    /// Full physical length
    pub length: f64,
    pub segments: Vec<Segment>,
}

impl PreparedMember {
    pub fn is_one_way(&self) -> bool {
        self.tension_only || self.compression_only
    }
}

/// A two-node spring with resolved geometry
pub(crate) struct PreparedSpring {
    pub name: String,
    pub i_base: usize,
    pub j_base: usize,
    pub tension_only: bool,
    pub compression_only: bool,
    pub t: Mat12,
    pub k_local: Mat12,
}

impl PreparedSpring {
    pub fn is_one_way(&self) -> bool {
        self.tension_only || self.compression_only
    }
}

/// Geometry variant of a prepared shell element
pub(crate) enum ShellKind {
    /// Rectangular plate (Kirchhoff bending)
    Rect { width: f64, height: f64 },
    /// General quadrilateral (MITC4 bending)
    Quad { geom: QuadGeometry },
}

/// A plate or quad with its stiffness and transformation precomputed
pub(crate) struct PreparedShell {
    pub name: String,
    pub bases: [usize; 4],
    pub t: Mat24,
    pub k_local: Mat24,
    pub kind: ShellKind,
    pub e: f64,
    pub nu: f64,
    pub thickness: f64,
    pub kx_mod: f64,
    pub ky_mod: f64,
}

/// A spring support attached to a single nodal DOF
pub(crate) struct PreparedSupportSpring {
    pub node: String,
    /// Global DOF the spring acts on
    pub dof: usize,
    pub stiffness: f64,
    pub sense: SpringSense,
}

/// Read-only context threaded through assembly, solve and iteration
pub(crate) struct SolveContext<'a> {
    pub model: &'a Model,
    pub dof: DofMap,
    pub members: Vec<PreparedMember>,
    pub springs: Vec<PreparedSpring>,
    pub shells: Vec<PreparedShell>,
    pub support_springs: Vec<PreparedSupportSpring>,
    pub options: AnalysisOptions,
}

impl<'a> SolveContext<'a> {
    pub fn new(model: &'a Model, options: AnalysisOptions) -> FrameResult<Self> {
        validate_combinations(model)?;

        let dof = DofMap::new(model);
        let members = prepare_members(model, &dof)?;
        let springs = prepare_springs(model, &dof)?;
        let shells = prepare_shells(model, &dof)?;
        let support_springs = prepare_support_springs(model, &dof)?;

        Ok(Self {
            model,
            dof,
            members,
            springs,
            shells,
            support_springs,
            options,
        })
    }

    /// True when the model contains any direction-dependent element
    pub fn has_one_way_elements(&self) -> bool {
        self.members.iter().any(PreparedMember::is_one_way)
            || self.springs.iter().any(PreparedSpring::is_one_way)
            || self
                .support_springs
                .iter()
                .any(|s| s.sense != SpringSense::TwoWay)
    }
}

/// Every case referenced by a combination must belong to a case present in
/// the model (registered, or used by at least one load)
fn validate_combinations(model: &Model) -> FrameResult<()> {
    let mut known = model.known_case_names();
    known.insert("Case 1".to_string());

    let mut combo_names: Vec<&String> = model.load_combos.keys().collect();
    combo_names.sort();
    for name in combo_names {
        let combo = &model.load_combos[name];
        for case in combo.factors.keys() {
            if !known.contains(case) {
                return Err(FrameError::LoadCaseNotFound(format!(
                    "{case} (referenced by combination '{name}')"
                )));
            }
        }
    }
    Ok(())
}

fn node_coords(model: &Model, name: &str) -> FrameResult<[f64; 3]> {
    model
        .nodes
        .get(name)
        .map(|n| n.coords())
        .ok_or_else(|| FrameError::NodeNotFound(name.to_string()))
}

fn prepare_members(model: &Model, dof: &DofMap) -> FrameResult<Vec<PreparedMember>> {
    let mut names: Vec<&String> = model.members.keys().collect();
    names.sort();

    let mut prepared = Vec::with_capacity(names.len());
    for name in names {
        let member = &model.members[name];
        let material = model
            .materials
            .get(&member.material)
            .ok_or_else(|| FrameError::MaterialNotFound(member.material.clone()))?;
        let section = model
            .sections
            .get(&member.section)
            .ok_or_else(|| FrameError::SectionNotFound(member.section.clone()))?;

        let i_coords = node_coords(model, &member.i_node)?;
        let j_coords = node_coords(model, &member.j_node)?;

        let i_vec = Vec3::from_row_slice(&i_coords);
        let j_vec = Vec3::from_row_slice(&j_coords);
        let axis = j_vec - i_vec;
        let length = axis.norm();
        if length < 1e-10 {
            return Err(FrameError::InvalidGeometry(format!(
                "member '{name}' has zero length (nodes '{}' and '{}' coincide)",
                member.i_node, member.j_node
            )));
        }
        let axis_unit = axis / length;

        // Expand the node chain into segments, checking that interior nodes
        // actually lie on the member axis in order
        let chain = member.node_chain();
        let mut positions = Vec::with_capacity(chain.len());
        for node_name in &chain {
            let coords = node_coords(model, node_name)?;
            let rel = Vec3::from_row_slice(&coords) - i_vec;
            let along = rel.dot(&axis_unit);
            let offset = (rel - axis_unit * along).norm();
            if offset > 1e-6 * length.max(1.0) {
                return Err(FrameError::InvalidGeometry(format!(
                    "node '{node_name}' is not on the axis of member '{name}' \
                     (offset {offset:.3e})"
                )));
            }
            positions.push(along);
        }
        for pair in positions.windows(2) {
            if pair[1] - pair[0] < 1e-10 {
                return Err(FrameError::InvalidGeometry(format!(
                    "intermediate nodes of member '{name}' are not ordered \
                     from i-node to j-node"
                )));
            }
        }

        let releases = member.releases.as_array();
        let n_segments = chain.len() - 1;

        let mut segments = Vec::with_capacity(n_segments);
        for (idx, pair) in chain.windows(2).enumerate() {
            let seg_length = positions[idx + 1] - positions[idx];

            // Shear deformation parameters for this segment's length
            let phi_y = section
                .ay
                .map(|ay| 12.0 * material.e * section.iz / (material.g * ay * seg_length.powi(2)))
                .unwrap_or(0.0);
            let phi_z = section
                .az
                .map(|az| 12.0 * material.e * section.iy / (material.g * az * seg_length.powi(2)))
                .unwrap_or(0.0);

            let k_raw = math::member_local_stiffness(
                material.e,
                material.g,
                section.a,
                section.iy,
                section.iz,
                section.j,
                seg_length,
                phi_y,
                phi_z,
            );

            // End releases act at the physical member's ends only
            let mut seg_releases = [false; 12];
            if idx == 0 {
                seg_releases[0..6].copy_from_slice(&releases[0..6]);
            }
            if idx == n_segments - 1 {
                seg_releases[6..12].copy_from_slice(&releases[6..12]);
            }
            let has_releases = seg_releases.iter().any(|&r| r);
            let k_local = if has_releases {
                math::apply_releases(&k_raw, &seg_releases)
            } else {
                k_raw
            };

            segments.push(Segment {
                i_node: pair[0].to_string(),
                j_node: pair[1].to_string(),
                i_base: dof.base(pair[0]),
                j_base: dof.base(pair[1]),
                x_start: positions[idx],
                length: seg_length,
                k_raw,
                k_local,
                releases: seg_releases,
                has_releases,
            });
        }

        let rot = math::member_rotation_matrix(&i_coords, &j_coords, member.rotation);
        let t = math::member_transformation_matrix(&i_coords, &j_coords, member.rotation);

        prepared.push(PreparedMember {
            name: name.clone(),
            t,
            rot,
            tension_only: member.tension_only,
            compression_only: member.compression_only,
            area: section.a,
            iy: section.iy,
            iz: section.iz,
            length,
            segments,
        });
    }
    Ok(prepared)
}

fn prepare_springs(model: &Model, dof: &DofMap) -> FrameResult<Vec<PreparedSpring>> {
    let mut names: Vec<&String> = model.springs.keys().collect();
    names.sort();

    let mut prepared = Vec::with_capacity(names.len());
    for name in names {
        let spring = &model.springs[name];
        let i_coords = node_coords(model, &spring.i_node)?;
        let j_coords = node_coords(model, &spring.j_node)?;

        let length = {
            let d = Vec3::from_row_slice(&j_coords) - Vec3::from_row_slice(&i_coords);
            d.norm()
        };
        if length < 1e-10 {
            return Err(FrameError::InvalidGeometry(format!(
                "spring '{name}' has zero length (nodes '{}' and '{}' coincide)",
                spring.i_node, spring.j_node
            )));
        }

        prepared.push(PreparedSpring {
            name: name.clone(),
            i_base: dof.base(&spring.i_node),
            j_base: dof.base(&spring.j_node),
            tension_only: spring.tension_only,
            compression_only: spring.compression_only,
            t: math::member_transformation_matrix(&i_coords, &j_coords, 0.0),
            k_local: math::spring_local_stiffness(spring.stiffness),
        });
    }
    Ok(prepared)
}

fn prepare_shells(model: &Model, dof: &DofMap) -> FrameResult<Vec<PreparedShell>> {
    let mut prepared = Vec::new();

    let mut plate_names: Vec<&String> = model.plates.keys().collect();
    plate_names.sort();
    for name in plate_names {
        let plate = &model.plates[name];
        let material = model
            .materials
            .get(&plate.material)
            .ok_or_else(|| FrameError::MaterialNotFound(plate.material.clone()))?;

        let corners = plate.corner_nodes();
        let mut coords = [[0.0; 3]; 4];
        for (k, corner) in corners.iter().enumerate() {
            coords[k] = node_coords(model, corner)?;
        }

        let i = Vec3::from_row_slice(&coords[0]);
        let j = Vec3::from_row_slice(&coords[1]);
        let m = Vec3::from_row_slice(&coords[2]);
        let n = Vec3::from_row_slice(&coords[3]);

        let width = (j - i).norm();
        let height = (n - i).norm();
        if width < 1e-10 || height < 1e-10 {
            return Err(FrameError::InvalidGeometry(format!(
                "plate '{name}' has coincident corner nodes"
            )));
        }
        // The Kirchhoff bending matrix is exact for rectangles only
        let scale = width.max(height);
        let skew = (j - i).dot(&(n - i)).abs() / (width * height);
        let closure = (m - j - (n - i)).norm() / scale;
        if skew > 1e-6 || closure > 1e-6 {
            return Err(FrameError::InvalidGeometry(format!(
                "plate '{name}' is not rectangular; use a Quad element for \
                 general quadrilaterals"
            )));
        }

        prepared.push(PreparedShell {
            name: name.clone(),
            bases: [
                dof.base(corners[0]),
                dof.base(corners[1]),
                dof.base(corners[2]),
                dof.base(corners[3]),
            ],
            t: math::plate::plate_transformation_matrix(&coords[0], &coords[1], &coords[3]),
            k_local: math::plate::plate_local_stiffness(
                material.e,
                material.nu,
                plate.thickness,
                width,
                height,
                plate.kx_mod,
                plate.ky_mod,
            ),
            kind: ShellKind::Rect { width, height },
            e: material.e,
            nu: material.nu,
            thickness: plate.thickness,
            kx_mod: plate.kx_mod,
            ky_mod: plate.ky_mod,
        });
    }

    let mut quad_names: Vec<&String> = model.quads.keys().collect();
    quad_names.sort();
    for name in quad_names {
        let quad = &model.quads[name];
        let material = model
            .materials
            .get(&quad.material)
            .ok_or_else(|| FrameError::MaterialNotFound(quad.material.clone()))?;

        let corners = quad.corner_nodes();
        let mut coords = [[0.0; 3]; 4];
        for (k, corner) in corners.iter().enumerate() {
            coords[k] = node_coords(model, corner)?;
        }

        let geom = QuadGeometry::from_corners(&coords).map_err(|err| match err {
            FrameError::InvalidGeometry(msg) => {
                FrameError::InvalidGeometry(format!("quad '{name}': {msg}"))
            }
            other => other,
        })?;

        let k_local = math::quad::quad_local_stiffness(
            material.e,
            material.nu,
            quad.thickness,
            &geom,
            quad.kx_mod,
            quad.ky_mod,
        )
        .map_err(|err| match err {
            FrameError::InvalidGeometry(msg) => {
                FrameError::InvalidGeometry(format!("quad '{name}': {msg}"))
            }
            other => other,
        })?;

        prepared.push(PreparedShell {
            name: name.clone(),
            bases: [
                dof.base(corners[0]),
                dof.base(corners[1]),
                dof.base(corners[2]),
                dof.base(corners[3]),
            ],
            t: math::quad::quad_transformation_matrix(&geom),
            k_local,
            kind: ShellKind::Quad { geom },
            e: material.e,
            nu: material.nu,
            thickness: quad.thickness,
            kx_mod: quad.kx_mod,
            ky_mod: quad.ky_mod,
        });
    }

    Ok(prepared)
}

fn prepare_support_springs(
    model: &Model,
    dof: &DofMap,
) -> FrameResult<Vec<PreparedSupportSpring>> {
    let mut names: Vec<&String> = model.supports.keys().collect();
    names.sort();

    let mut prepared = Vec::new();
    for name in names {
        let support = &model.supports[name];
        if !model.nodes.contains_key(name.as_str()) {
            return Err(FrameError::NodeNotFound(name.to_string()));
        }
        let restraints = support.restraints();
        for (local_dof, spring) in support.springs.iter().enumerate() {
            let Some(spring) = spring else { continue };
            if restraints[local_dof] {
                return Err(FrameError::InvalidInput(format!(
                    "node '{name}' has both a rigid restraint and a spring \
                     support on {}",
                    DOF_LABELS[local_dof]
                )));
            }
            if spring.stiffness <= 0.0 {
                return Err(FrameError::InvalidInput(format!(
                    "support spring at '{name}' {} must have positive stiffness",
                    DOF_LABELS[local_dof]
                )));
            }
            prepared.push(PreparedSupportSpring {
                node: name.to_string(),
                dof: dof.base(name) + local_dof,
                stiffness: spring.stiffness,
                sense: spring.sense,
            });
        }
    }
    Ok(prepared)
}
