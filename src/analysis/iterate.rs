//! Nonlinear iteration controller
//!
//! Runs repeated assemble -> solve cycles per load combination. The
//! controller owns the activation state of every direction-dependent
//! element and re-derives it from the latest trial solution on each pass;
//! activation is never model-authored. The phase machine is
//! Linear -> Converged for models with no direction dependence, and
//! ToggleIterating -> {Converged, Diverged} otherwise. P-Delta wraps the
//! toggle loop in an outer cycle that rebuilds geometric stiffness from the
//! newly solved axial forces until the maximum nodal displacement settles.

use log::{debug, warn};

use super::assemble::{self, AxialForces};
use super::context::{PreparedMember, SolveContext};
use super::loads::{self, ComboLoads};
use super::solve::{self, Partition};
use super::AnalysisType;
use crate::elements::SpringSense;
use crate::error::{FrameError, FrameResult};
use crate::math::sparse::TripletMatrix;
use crate::math::{DVec, Vec12, Vec24};
use crate::results::{
    Activation, ComboResults, MemberResult, PlateResult, PlateStresses, SegmentResult,
    SpringResult,
};

/// Controller phase for one combination's solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Linear,
    ToggleIterating,
    Converged,
    Diverged,
}

/// Solver-owned activation state, re-derived every iteration
struct ActivationState {
    members: Vec<Activation>,
    springs: Vec<Activation>,
    /// Engagement of one-way support springs
    support_springs: Vec<bool>,
}

impl ActivationState {
    fn all_active(ctx: &SolveContext) -> Self {
        Self {
            members: vec![Activation::Active; ctx.members.len()],
            springs: vec![Activation::Active; ctx.springs.len()],
            support_springs: vec![true; ctx.support_springs.len()],
        }
    }

    fn member_flags(&self) -> Vec<bool> {
        self.members.iter().map(|a| a.is_active()).collect()
    }

    fn spring_flags(&self) -> Vec<bool> {
        self.springs.iter().map(|a| a.is_active()).collect()
    }
}

/// Output of one converged (inner) solve
struct TrialSolution {
    k: TripletMatrix,
    p: DVec,
    d: DVec,
}

/// Solve a single load combination to convergence.
///
/// Reads only the shared context; produces the combination's results without
/// touching the model, so independent combinations can run concurrently.
pub(crate) fn solve_combination(
    ctx: &SolveContext,
    combo_name: &str,
) -> FrameResult<ComboResults> {
    let combo = ctx
        .model
        .load_combos
        .get(combo_name)
        .ok_or_else(|| FrameError::LoadCombinationNotFound(combo_name.to_string()))?;

    let combo_loads = loads::build_combo_loads(ctx, combo)?;
    let partition = solve::partition_dofs(ctx);

    let mut activation = ActivationState::all_active(ctx);
    let mut iterations = 0usize;

    // First-order pass (with toggle iteration when needed)
    let mut trial = run_toggle_phase(
        ctx,
        combo_name,
        &combo_loads,
        &partition,
        &mut activation,
        None,
        &mut iterations,
    )?;

    // P-Delta outer loop: rebuild geometric stiffness from the latest axial
    // forces and re-run until the maximum nodal displacement settles
    if ctx.options.analysis_type == AnalysisType::PDelta {
        let mut prev_max = trial.d.amax();
        let mut outer = 0usize;
        loop {
            let axial = recover_axial_forces(ctx, &combo_loads, &activation, &trial.d);
            trial = run_toggle_phase(
                ctx,
                combo_name,
                &combo_loads,
                &partition,
                &mut activation,
                Some(&axial),
                &mut iterations,
            )?;

            let max_disp = trial.d.amax();
            let delta = (max_disp - prev_max).abs();
            debug!(
                "combo '{combo_name}': P-Delta iteration {outer}, \
                 max displacement {max_disp:.6e} (delta {delta:.3e})"
            );
            if delta <= ctx.options.tolerance * max_disp.max(1e-12) {
                break;
            }
            prev_max = max_disp;

            outer += 1;
            if outer >= ctx.options.max_iterations {
                return Err(FrameError::Nonconvergence {
                    combo: combo_name.to_string(),
                    iterations,
                    toggling: Vec::new(),
                });
            }
        }
    }

    let axial_final = match ctx.options.analysis_type {
        AnalysisType::PDelta => Some(recover_axial_forces(
            ctx,
            &combo_loads,
            &activation,
            &trial.d,
        )),
        AnalysisType::Linear => None,
    };

    let results = publish_results(
        ctx,
        &combo_loads,
        &activation,
        &partition,
        &trial,
        axial_final.as_ref(),
        iterations,
    )?;

    if ctx.options.check_statics {
        check_statics(ctx, combo_name, &trial.p, &results);
    }

    Ok(results)
}

/// Run assemble -> solve -> retoggle until no element changes activation
/// state, or fail with the set of elements still flipping.
fn run_toggle_phase(
    ctx: &SolveContext,
    combo_name: &str,
    combo_loads: &ComboLoads,
    partition: &Partition,
    activation: &mut ActivationState,
    axial: Option<&AxialForces>,
    iterations: &mut usize,
) -> FrameResult<TrialSolution> {
    let mut phase = if ctx.has_one_way_elements() {
        Phase::ToggleIterating
    } else {
        Phase::Linear
    };
    let mut toggle_iterations = 0usize;

    loop {
        let member_active = activation.member_flags();
        let spring_active = activation.spring_flags();

        let p = loads::assemble_load_vector(ctx, combo_loads, &member_active);
        let k = assemble::assemble_stiffness(
            ctx,
            &member_active,
            &spring_active,
            &activation.support_springs,
            axial,
        );
        let d = solve::solve_displacements(ctx, combo_name, &k, &p, partition)?;
        *iterations += 1;
        toggle_iterations += 1;

        match phase {
            Phase::Linear => {
                phase = Phase::Converged;
                debug!("combo '{combo_name}': single pass, state {phase:?}");
                return Ok(TrialSolution { k, p, d });
            }
            Phase::ToggleIterating => {
                let changed = retoggle(ctx, combo_loads, activation, &d);
                if changed.is_empty() {
                    phase = Phase::Converged;
                    debug!(
                        "combo '{combo_name}': activation fixed point after \
                         {iterations} iterations, state {phase:?}"
                    );
                    return Ok(TrialSolution { k, p, d });
                }
                debug!(
                    "combo '{combo_name}': iteration {iterations} toggled \
                     {changed:?}"
                );
                if toggle_iterations >= ctx.options.max_iterations {
                    phase = Phase::Diverged;
                    warn!(
                        "combo '{combo_name}': state {phase:?}, activation \
                         still oscillating after {iterations} iterations: \
                         {changed:?}"
                    );
                    return Err(FrameError::Nonconvergence {
                        combo: combo_name.to_string(),
                        iterations: *iterations,
                        toggling: changed,
                    });
                }
            }
            Phase::Converged | Phase::Diverged => unreachable!("terminal phase re-entered"),
        }
    }
}

/// Local displacement vector of a member segment
fn segment_local_displacements(
    member: &PreparedMember,
    seg_idx: usize,
    d: &DVec,
) -> Vec12 {
    let segment = &member.segments[seg_idx];
    let mut d_global = Vec12::zeros();
    for k in 0..6 {
        d_global[k] = d[segment.i_base + k];
        d_global[k + 6] = d[segment.j_base + k];
    }
    member.t * d_global
}

/// Governing axial force of a member chain (largest magnitude over segments,
/// positive = tension), from the current trial displacements.
///
/// Active members include their span-load fixed-end forces; an inactive
/// member is tested on its elastic stiffness alone since its loads are not
/// applied to the structure.
fn governing_axial(
    ctx: &SolveContext,
    combo_loads: &ComboLoads,
    m_idx: usize,
    active: bool,
    d: &DVec,
) -> f64 {
    let member = &ctx.members[m_idx];
    let mut governing = 0.0_f64;
    for seg_idx in 0..member.segments.len() {
        let d_local = segment_local_displacements(member, seg_idx, d);
        let mut f = member.segments[seg_idx].k_local * d_local;
        if active {
            f += combo_loads.segment_fer[m_idx][seg_idx];
        }
        let axial = -f[0];
        if axial.abs() > governing.abs() {
            governing = axial;
        }
    }
    governing
}

/// Axial force in a two-node spring (positive = tension)
fn spring_axial(ctx: &SolveContext, s_idx: usize, d: &DVec) -> f64 {
    let spring = &ctx.springs[s_idx];
    let mut d_global = Vec12::zeros();
    for k in 0..6 {
        d_global[k] = d[spring.i_base + k];
        d_global[k + 6] = d[spring.j_base + k];
    }
    let d_local = spring.t * d_global;
    let f = spring.k_local * d_local;
    -f[0]
}

/// Re-derive every direction-dependent element's activation state from the
/// trial solution. Returns the names of elements whose state changed.
fn retoggle(
    ctx: &SolveContext,
    combo_loads: &ComboLoads,
    activation: &mut ActivationState,
    d: &DVec,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (m_idx, member) in ctx.members.iter().enumerate() {
        if !member.is_one_way() {
            continue;
        }
        let was_active = activation.members[m_idx].is_active();
        let axial = governing_axial(ctx, combo_loads, m_idx, was_active, d);
        let tol = 1e-10 * (1.0 + axial.abs());
        let now_active = if member.tension_only {
            axial >= -tol
        } else {
            axial <= tol
        };
        if now_active != was_active {
            activation.members[m_idx] = if now_active {
                Activation::Active
            } else {
                Activation::Inactive
            };
            changed.push(member.name.clone());
        }
    }

    for (s_idx, spring) in ctx.springs.iter().enumerate() {
        if !spring.is_one_way() {
            continue;
        }
        let was_active = activation.springs[s_idx].is_active();
        let axial = spring_axial(ctx, s_idx, d);
        let tol = 1e-10 * (1.0 + axial.abs());
        let now_active = if spring.tension_only {
            axial >= -tol
        } else {
            axial <= tol
        };
        if now_active != was_active {
            activation.springs[s_idx] = if now_active {
                Activation::Active
            } else {
                Activation::Inactive
            };
            changed.push(spring.name.clone());
        }
    }

    for (idx, support_spring) in ctx.support_springs.iter().enumerate() {
        let was_engaged = activation.support_springs[idx];
        let displacement = d[support_spring.dof];
        let now_engaged = match support_spring.sense {
            SpringSense::TwoWay => true,
            SpringSense::Positive => displacement >= 0.0,
            SpringSense::Negative => displacement <= 0.0,
        };
        if now_engaged != was_engaged {
            activation.support_springs[idx] = now_engaged;
            changed.push(format!(
                "{}.{}",
                support_spring.node,
                crate::elements::DOF_LABELS[support_spring.dof % 6]
            ));
        }
    }

    changed
}

/// Solved axial force per member segment (elastic stiffness), for geometric
/// stiffness updates
fn recover_axial_forces(
    ctx: &SolveContext,
    combo_loads: &ComboLoads,
    activation: &ActivationState,
    d: &DVec,
) -> AxialForces {
    let mut axial = AxialForces::zeros(ctx);
    for (m_idx, member) in ctx.members.iter().enumerate() {
        if !activation.members[m_idx].is_active() {
            continue;
        }
        for (seg_idx, segment) in member.segments.iter().enumerate() {
            let d_local = segment_local_displacements(member, seg_idx, d);
            let f = segment.k_local * d_local + combo_loads.segment_fer[m_idx][seg_idx];
            axial.segments[m_idx][seg_idx] = -f[0];
        }
    }
    axial
}

/// Build the published results from the converged trial solution
fn publish_results(
    ctx: &SolveContext,
    combo_loads: &ComboLoads,
    activation: &ActivationState,
    partition: &Partition,
    trial: &TrialSolution,
    axial: Option<&AxialForces>,
    iterations: usize,
) -> FrameResult<ComboResults> {
    let d = &trial.d;
    let mut results = ComboResults {
        iterations,
        ..Default::default()
    };

    for node in ctx.dof.node_names() {
        let base = ctx.dof.base(node);
        let mut values = [0.0; 6];
        for k in 0..6 {
            values[k] = d[base + k];
        }
        results.displacements.insert(node.clone(), values);
    }

    results.reactions = solve::compute_reactions(
        ctx,
        &trial.k,
        d,
        &trial.p,
        partition,
        &activation.support_springs,
    );

    for (m_idx, member) in ctx.members.iter().enumerate() {
        let active = activation.members[m_idx].is_active();
        let mut segments = Vec::with_capacity(member.segments.len());
        for (seg_idx, segment) in member.segments.iter().enumerate() {
            let d_local = segment_local_displacements(member, seg_idx, d);
            let forces = if active {
                let p_seg = axial.map(|a| a.segments[m_idx][seg_idx]);
                let k_seg = assemble::segment_stiffness(member, seg_idx, p_seg);
                k_seg * d_local + combo_loads.segment_fer[m_idx][seg_idx]
            } else {
                Vec12::zeros()
            };

            let mut local_forces = [0.0; 12];
            let mut local_displacements = [0.0; 12];
            for k in 0..12 {
                local_forces[k] = forces[k];
                local_displacements[k] = d_local[k];
            }
            segments.push(SegmentResult {
                i_node: segment.i_node.clone(),
                j_node: segment.j_node.clone(),
                x_start: segment.x_start,
                length: segment.length,
                local_forces,
                local_displacements,
            });
        }

        results.members.insert(
            member.name.clone(),
            MemberResult {
                activation: activation.members[m_idx],
                segments,
            },
        );
    }

    for (s_idx, spring) in ctx.springs.iter().enumerate() {
        let active = activation.springs[s_idx].is_active();
        let axial_force = if active {
            spring_axial(ctx, s_idx, d)
        } else {
            0.0
        };
        results.springs.insert(
            spring.name.clone(),
            SpringResult {
                activation: activation.springs[s_idx],
                axial_force,
            },
        );
    }

    for (shell_idx, shell) in ctx.shells.iter().enumerate() {
        let mut d_global = Vec24::zeros();
        for (corner, &base) in shell.bases.iter().enumerate() {
            for k in 0..6 {
                d_global[6 * corner + k] = d[base + k];
            }
        }
        let d_local = shell.t * d_global;
        let forces = shell.k_local * d_local + combo_loads.shell_fer[shell_idx];

        let (membrane, moments) = match &shell.kind {
            super::context::ShellKind::Rect { width, height } => (
                crate::math::plate::plate_membrane_stress(
                    width / 2.0,
                    height / 2.0,
                    &d_local,
                    shell.e,
                    shell.nu,
                    *width,
                    *height,
                    shell.kx_mod,
                    shell.ky_mod,
                ),
                crate::math::plate::plate_moments(
                    width / 2.0,
                    height / 2.0,
                    &d_local,
                    shell.e,
                    shell.nu,
                    shell.thickness,
                    *width,
                    *height,
                    shell.kx_mod,
                    shell.ky_mod,
                ),
            ),
            super::context::ShellKind::Quad { geom } => (
                crate::math::quad::quad_membrane_stress(
                    &d_local,
                    shell.e,
                    shell.nu,
                    geom,
                    shell.kx_mod,
                    shell.ky_mod,
                )?,
                crate::math::quad::quad_moments(
                    &d_local,
                    shell.e,
                    shell.nu,
                    shell.thickness,
                    geom,
                    shell.kx_mod,
                    shell.ky_mod,
                )?,
            ),
        };

        let mut local_forces = [0.0; 24];
        let mut local_displacements = [0.0; 24];
        for k in 0..24 {
            local_forces[k] = forces[k];
            local_displacements[k] = d_local[k];
        }

        results.plates.insert(
            shell.name.clone(),
            PlateResult {
                local_forces,
                local_displacements,
                stresses: PlateStresses {
                    sx: membrane[0],
                    sy: membrane[1],
                    txy: membrane[2],
                    mx: moments[0],
                    my: moments[1],
                    mxy: moments[2],
                },
            },
        );
    }

    Ok(results)
}

/// Log the global equilibrium imbalance of a converged combination:
/// applied loads plus reactions, forces and moments about the origin.
fn check_statics(ctx: &SolveContext, combo_name: &str, p: &DVec, results: &ComboResults) {
    let mut sum_force = [0.0; 3];
    let mut sum_moment = [0.0; 3];
    let mut load_scale = 0.0_f64;

    for node in ctx.dof.node_names() {
        let base = ctx.dof.base(node);
        let coords = ctx.model.nodes[node].coords();

        let mut force = [p[base], p[base + 1], p[base + 2]];
        let mut moment = [p[base + 3], p[base + 4], p[base + 5]];
        if let Some(reaction) = results.reactions.get(node) {
            for k in 0..3 {
                force[k] += reaction[k];
                moment[k] += reaction[k + 3];
            }
        }

        for k in 0..3 {
            sum_force[k] += force[k];
            load_scale = load_scale.max(force[k].abs());
        }
        // Moment transport: M += r x F
        sum_moment[0] += moment[0] + coords[1] * force[2] - coords[2] * force[1];
        sum_moment[1] += moment[1] + coords[2] * force[0] - coords[0] * force[2];
        sum_moment[2] += moment[2] + coords[0] * force[1] - coords[1] * force[0];
    }

    let force_imbalance = sum_force.iter().map(|f| f.abs()).fold(0.0, f64::max);
    let moment_imbalance = sum_moment.iter().map(|m| m.abs()).fold(0.0, f64::max);
    let tol = 1e-6 * load_scale.max(1.0);

    if force_imbalance > tol || moment_imbalance > tol {
        warn!(
            "combo '{combo_name}': statics check imbalance \
             (forces {sum_force:?}, moments {sum_moment:?})"
        );
    } else {
        debug!(
            "combo '{combo_name}': statics check passed \
             (max force imbalance {force_imbalance:.3e})"
        );
    }
}
