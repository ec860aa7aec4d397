//! Free/restrained partitioning, the linear solve, reaction recovery and
//! instability detection

use std::collections::HashMap;

use nalgebra::DMatrix;

use super::context::SolveContext;
use crate::error::{FrameError, FrameResult};
use crate::math::sparse::{self, TripletMatrix};
use crate::math::DVec;

/// Split of the global DOF set into free and restrained indices
pub(crate) struct Partition {
    pub free: Vec<usize>,
    pub restrained: Vec<usize>,
    /// Prescribed displacement values on restrained DOFs (support settlement)
    pub enforced: HashMap<usize, f64>,
}

/// Partition the DOFs from the support table. Restrained DOFs never appear
/// in the free set; unrestrained DOFs of unsupported nodes are all free.
pub(crate) fn partition_dofs(ctx: &SolveContext) -> Partition {
    let mut free = Vec::new();
    let mut restrained = Vec::new();
    let mut enforced = HashMap::new();

    for node in ctx.dof.node_names() {
        let base = ctx.dof.base(node);
        if let Some(support) = ctx.model.supports.get(node) {
            let restraints = support.restraints();
            for i in 0..6 {
                if restraints[i] {
                    restrained.push(base + i);
                    if let Some(value) = support.enforced[i] {
                        enforced.insert(base + i, value);
                    }
                } else {
                    free.push(base + i);
                }
            }
        } else {
            free.extend(base..base + 6);
        }
    }

    Partition {
        free,
        restrained,
        enforced,
    }
}

/// Solve the free-free reduced system for unknown displacements and expand
/// back to the full DOF vector (restrained values taken as prescribed).
pub(crate) fn solve_displacements(
    ctx: &SolveContext,
    combo: &str,
    k: &TripletMatrix,
    p: &DVec,
    partition: &Partition,
) -> FrameResult<DVec> {
    let n_dofs = ctx.dof.n_dofs();
    let n_free = partition.free.len();

    // Fully restrained model: the displacement field is prescribed outright
    if n_free == 0 {
        let mut d_full = DVec::zeros(n_dofs);
        for (&dof, &value) in &partition.enforced {
            d_full[dof] = value;
        }
        return Ok(d_full);
    }

    // Global DOF -> free index
    let mut free_index = vec![usize::MAX; n_dofs];
    for (idx, &dof) in partition.free.iter().enumerate() {
        free_index[dof] = idx;
    }

    // Reduced right-hand side, shifting prescribed displacements across
    let mut p1 = DVec::zeros(n_free);
    for (idx, &dof) in partition.free.iter().enumerate() {
        p1[idx] = p[dof];
    }

    // A free DOF whose reduced row is empty belongs to a node disconnected
    // from every active element; report it rather than failing opaquely
    let mut row_connected = vec![false; n_free];
    for &(row, col, value) in k.entries() {
        if value == 0.0 {
            continue;
        }
        let (ri, ci) = (free_index[row], free_index[col]);
        if ri != usize::MAX && ci != usize::MAX {
            row_connected[ri] = true;
        }
        if ri != usize::MAX {
            if let Some(enforced) = partition.enforced.get(&col) {
                p1[ri] -= value * enforced;
            }
        }
    }

    let dangling: Vec<String> = row_connected
        .iter()
        .enumerate()
        .filter(|(_, &connected)| !connected)
        .map(|(idx, _)| ctx.dof.label(partition.free[idx]))
        .collect();
    if !dangling.is_empty() {
        return Err(FrameError::Unstable {
            combo: combo.to_string(),
            details: format!(
                "free DOFs carry no stiffness (disconnected or fully \
                 deactivated): {}",
                dangling.join(", ")
            ),
        });
    }

    let d1 = if ctx.options.sparse {
        solve_reduced_sparse(combo, k, &free_index, &p1, n_free)?
    } else {
        solve_reduced_dense(combo, k, &free_index, &p1, n_free)?
    };

    let mut d_full = DVec::zeros(n_dofs);
    for (idx, &dof) in partition.free.iter().enumerate() {
        d_full[dof] = d1[idx];
    }
    for (&dof, &value) in &partition.enforced {
        d_full[dof] = value;
    }
    Ok(d_full)
}

fn solve_reduced_dense(
    combo: &str,
    k: &TripletMatrix,
    free_index: &[usize],
    p1: &DVec,
    n_free: usize,
) -> FrameResult<DVec> {
    let mut k11 = DMatrix::zeros(n_free, n_free);
    for &(row, col, value) in k.entries() {
        let (ri, ci) = (free_index[row], free_index[col]);
        if ri != usize::MAX && ci != usize::MAX {
            k11[(ri, ci)] += value;
        }
    }

    let scale: f64 = k11.amax();
    let lu = k11.full_piv_lu();
    let threshold = scale * 1e-12;
    let rank = lu
        .u()
        .diagonal()
        .iter()
        .filter(|d| d.abs() > threshold)
        .count();
    if rank < n_free {
        return Err(FrameError::Unstable {
            combo: combo.to_string(),
            details: format!(
                "free-free stiffness is singular or near-singular \
                 (rank {rank} of {n_free}); the model has an unrestrained \
                 rigid-body mode"
            ),
        });
    }

    lu.solve(p1).ok_or_else(|| FrameError::Unstable {
        combo: combo.to_string(),
        details: "free-free stiffness factorization failed".to_string(),
    })
}

fn solve_reduced_sparse(
    combo: &str,
    k: &TripletMatrix,
    free_index: &[usize],
    p1: &DVec,
    n_free: usize,
) -> FrameResult<DVec> {
    let mut reduced = TripletMatrix::new(n_free);
    for &(row, col, value) in k.entries() {
        let (ri, ci) = (free_index[row], free_index[col]);
        if ri != usize::MAX && ci != usize::MAX {
            reduced.add(ri, ci, value);
        }
    }

    let csr = reduced.to_csr();
    sparse::solve_pcg(&csr, p1, 1e-10, 20 * n_free.max(100)).ok_or_else(|| {
        FrameError::Unstable {
            combo: combo.to_string(),
            details: "iterative solver broke down; the free-free stiffness \
                      is not positive definite"
                .to_string(),
        }
    })
}

/// Compute support reactions.
///
/// Restrained DOFs use the original unreduced stiffness rows:
/// `r = K[support, :] * d - p_applied[support]`, so reactions reflect the
/// full connectivity. Engaged spring-support DOFs report the spring force
/// `-k * d`; all other DOFs report zero.
pub(crate) fn compute_reactions(
    ctx: &SolveContext,
    k: &TripletMatrix,
    d: &DVec,
    p_applied: &DVec,
    partition: &Partition,
    support_spring_engaged: &[bool],
) -> HashMap<String, [f64; 6]> {
    let n_dofs = ctx.dof.n_dofs();
    let mut is_restrained = vec![false; n_dofs];
    for &dof in &partition.restrained {
        is_restrained[dof] = true;
    }

    let mut r = vec![0.0; n_dofs];
    for &(row, col, value) in k.entries() {
        if is_restrained[row] {
            r[row] += value * d[col];
        }
    }
    for &dof in &partition.restrained {
        r[dof] -= p_applied[dof];
    }

    for (s_idx, spring) in ctx.support_springs.iter().enumerate() {
        if support_spring_engaged[s_idx] {
            r[spring.dof] = -spring.stiffness * d[spring.dof];
        }
    }

    let mut reactions = HashMap::new();
    for (node, support) in &ctx.model.supports {
        if !support.is_supported() {
            continue;
        }
        let base = ctx.dof.base(node);
        let mut values = [0.0; 6];
        values.copy_from_slice(&r[base..base + 6]);
        reactions.insert(node.clone(), values);
    }
    reactions
}
