//! Load aggregation: nodal loads and element fixed-end forces combined into
//! a global load vector per combination
//!
//! Member loads are positioned along the full physical member but converted
//! to fixed-end forces segment by segment, on each segment's own length.

use super::context::{SolveContext, PreparedMember};
use crate::error::{FrameError, FrameResult};
use crate::loads::{DistributedLoad, LoadCombination, LoadDirection, PointLoad};
use crate::math::{self, DVec, Vec12, Vec24, Vec3};

/// Per-combination load data, precomputed once and reused across iterations.
/// Fixed-end forces are stored in element-local coordinates; inactive
/// elements' contributions are skipped at assembly time.
pub(crate) struct ComboLoads {
    /// Directly applied nodal loads (full DOF vector)
    pub p_nodal: DVec,
    /// Per member, per segment: local fixed-end forces (releases condensed)
    pub segment_fer: Vec<Vec<Vec12>>,
    /// Per shell: local pressure fixed-end forces
    pub shell_fer: Vec<Vec24>,
}

/// Decomposition of a member load into local axis components
enum ResolvedDirection {
    /// (axis, is_moment) with the load magnitude unchanged
    Local(usize, bool),
    /// Global force components resolved through the member rotation matrix
    GlobalForce(Vec3),
}

fn resolve_direction(
    member: &PreparedMember,
    direction: LoadDirection,
) -> ResolvedDirection {
    match direction {
        LoadDirection::Fx => ResolvedDirection::Local(0, false),
        LoadDirection::Fy => ResolvedDirection::Local(1, false),
        LoadDirection::Fz => ResolvedDirection::Local(2, false),
        LoadDirection::Mx => ResolvedDirection::Local(0, true),
        LoadDirection::My => ResolvedDirection::Local(1, true),
        LoadDirection::Mz => ResolvedDirection::Local(2, true),
        LoadDirection::FX => ResolvedDirection::GlobalForce(member.rot * Vec3::x()),
        LoadDirection::FY => ResolvedDirection::GlobalForce(member.rot * Vec3::y()),
        LoadDirection::FZ => ResolvedDirection::GlobalForce(member.rot * Vec3::z()),
    }
}

/// Build the load data for one combination.
///
/// A case absent from the combination contributes factor zero; a combination
/// with no net load still produces a deterministic zero vector.
pub(crate) fn build_combo_loads(
    ctx: &SolveContext,
    combo: &LoadCombination,
) -> FrameResult<ComboLoads> {
    let mut p_nodal = DVec::zeros(ctx.dof.n_dofs());

    for (node_name, loads) in &ctx.model.node_loads {
        let base = ctx.dof.base(node_name);
        for load in loads {
            let factor = combo.factor(&load.case);
            if factor == 0.0 {
                continue;
            }
            let arr = load.as_array();
            for i in 0..6 {
                p_nodal[base + i] += factor * arr[i];
            }
        }
    }

    let mut segment_fer = Vec::with_capacity(ctx.members.len());
    for member in &ctx.members {
        let mut fers = vec![Vec12::zeros(); member.segments.len()];

        if let Some(loads) = ctx.model.member_point_loads.get(&member.name) {
            for load in loads {
                let factor = combo.factor(&load.case);
                if factor == 0.0 {
                    continue;
                }
                apply_point_load(member, load, factor, &mut fers)?;
            }
        }
        if let Some(loads) = ctx.model.member_dist_loads.get(&member.name) {
            for load in loads {
                let factor = combo.factor(&load.case);
                if factor == 0.0 {
                    continue;
                }
                apply_dist_load(member, load, factor, &mut fers)?;
            }
        }

        // Condense releases after all loads on the segment are summed
        for (segment, fer) in member.segments.iter().zip(fers.iter_mut()) {
            if segment.has_releases {
                *fer = math::apply_fer_releases(fer, &segment.k_raw, &segment.releases);
            }
        }

        segment_fer.push(fers);
    }

    let mut shell_fer = Vec::with_capacity(ctx.shells.len());
    for shell in &ctx.shells {
        let mut fer = Vec24::zeros();
        if let Some(loads) = ctx.model.plate_loads.get(&shell.name) {
            for load in loads {
                let factor = combo.factor(&load.case);
                if factor == 0.0 {
                    continue;
                }
                let pressure = factor * load.pressure;
                fer += match &shell.kind {
                    super::context::ShellKind::Rect { width, height } => {
                        math::plate::plate_fer_pressure(pressure, *width, *height)
                    }
                    super::context::ShellKind::Quad { geom } => {
                        math::quad::quad_fer_pressure(pressure, geom)?
                    }
                };
            }
        }
        shell_fer.push(fer);
    }

    Ok(ComboLoads {
        p_nodal,
        segment_fer,
        shell_fer,
    })
}

fn apply_point_load(
    member: &PreparedMember,
    load: &PointLoad,
    factor: f64,
    fers: &mut [Vec12],
) -> FrameResult<()> {
    let position = load.position;
    if position < -1e-9 || position > member.length * (1.0 + 1e-9) {
        return Err(FrameError::InvalidInput(format!(
            "point load position {position} is outside member '{}' (length {})",
            member.name, member.length
        )));
    }
    let position = position.clamp(0.0, member.length);

    // Find the segment the load lands on (the last one whose span covers it)
    let seg_idx = member
        .segments
        .iter()
        .rposition(|s| position >= s.x_start - 1e-9)
        .unwrap_or(0);
    let segment = &member.segments[seg_idx];
    let a = (position - segment.x_start).clamp(0.0, segment.length);

    let magnitude = factor * load.magnitude;
    let fer = match resolve_direction(member, load.direction) {
        ResolvedDirection::Local(axis, true) => {
            math::fer_point_moment(magnitude, a, segment.length, axis)
        }
        ResolvedDirection::Local(axis, false) => {
            math::fer_point_load(magnitude, a, segment.length, axis)
        }
        ResolvedDirection::GlobalForce(components) => {
            let mut fer = Vec12::zeros();
            for axis in 0..3 {
                if components[axis].abs() > 0.0 {
                    fer += math::fer_point_load(
                        magnitude * components[axis],
                        a,
                        segment.length,
                        axis,
                    );
                }
            }
            fer
        }
    };

    fers[seg_idx] += fer;
    Ok(())
}

fn apply_dist_load(
    member: &PreparedMember,
    load: &DistributedLoad,
    factor: f64,
    fers: &mut [Vec12],
) -> FrameResult<()> {
    let x1 = load.x1;
    let x2 = if load.x2.is_finite() {
        load.x2
    } else {
        member.length
    };
    if x1 < -1e-9 || x2 > member.length * (1.0 + 1e-9) || x2 < x1 {
        return Err(FrameError::InvalidInput(format!(
            "distributed load span [{x1}, {x2}] is invalid for member '{}' \
             (length {})",
            member.name, member.length
        )));
    }
    if load.direction.is_moment() {
        return Err(FrameError::InvalidInput(format!(
            "distributed moment loads are not supported (member '{}')",
            member.name
        )));
    }

    for (seg_idx, segment) in member.segments.iter().enumerate() {
        // Overlap of the loaded span with this segment
        let start = x1.max(segment.x_start);
        let end = x2.min(segment.x_start + segment.length);
        if end - start < 1e-12 {
            continue;
        }

        let w_start = factor * load.magnitude_at(start, member.length);
        let w_end = factor * load.magnitude_at(end, member.length);
        let a = start - segment.x_start;
        let b = end - segment.x_start;

        let fer = match resolve_direction(member, load.direction) {
            ResolvedDirection::Local(axis, _) => {
                math::fer_dist_load(w_start, w_end, a, b, segment.length, axis)
            }
            ResolvedDirection::GlobalForce(components) => {
                let mut fer = Vec12::zeros();
                for axis in 0..3 {
                    if components[axis].abs() > 0.0 {
                        fer += math::fer_dist_load(
                            w_start * components[axis],
                            w_end * components[axis],
                            a,
                            b,
                            segment.length,
                            axis,
                        );
                    }
                }
                fer
            }
        };

        fers[seg_idx] += fer;
    }
    Ok(())
}

/// Combine nodal loads with the fixed-end forces of currently active
/// elements into the applied global load vector.
///
/// Fixed-end forces are restraining forces, so their global transform is
/// subtracted (equivalent nodal load convention).
pub(crate) fn assemble_load_vector(
    ctx: &SolveContext,
    loads: &ComboLoads,
    member_active: &[bool],
) -> DVec {
    let mut p = loads.p_nodal.clone();

    for (m_idx, member) in ctx.members.iter().enumerate() {
        if !member_active[m_idx] {
            continue;
        }
        for (segment, fer) in member.segments.iter().zip(&loads.segment_fer[m_idx]) {
            if fer.amax() == 0.0 {
                continue;
            }
            let fer_global = member.t.transpose() * fer;
            for k in 0..6 {
                p[segment.i_base + k] -= fer_global[k];
                p[segment.j_base + k] -= fer_global[k + 6];
            }
        }
    }

    for (shell, fer) in ctx.shells.iter().zip(&loads.shell_fer) {
        if fer.amax() == 0.0 {
            continue;
        }
        let fer_global = shell.t.transpose() * fer;
        for (corner, &base) in shell.bases.iter().enumerate() {
            for k in 0..6 {
                p[base + k] -= fer_global[6 * corner + k];
            }
        }
    }

    p
}
