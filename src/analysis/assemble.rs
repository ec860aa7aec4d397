//! Global stiffness assembly from active elements
//!
//! Element formulation fans out in parallel: each element only reads the
//! shared immutable context and produces its own (DOF indices, dense global
//! block) pair. Accumulation into the triplet builder is serial; duplicate
//! DOF positions sum, which is the direct stiffness superposition rule.

use nalgebra::DMatrix;
use rayon::prelude::*;

use super::context::{PreparedMember, SolveContext};
use crate::math::{self, sparse::TripletMatrix, Mat12};

/// Solved axial forces per member segment (positive = tension), used to
/// rebuild geometric stiffness between P-Delta iterations
pub(crate) struct AxialForces {
    pub segments: Vec<Vec<f64>>,
}

impl AxialForces {
    pub fn zeros(ctx: &SolveContext) -> Self {
        Self {
            segments: ctx
                .members
                .iter()
                .map(|m| vec![0.0; m.segments.len()])
                .collect(),
        }
    }
}

/// Local stiffness of one member segment, with the geometric term added when
/// an axial force is supplied and releases re-condensed afterwards
pub(crate) fn segment_stiffness(
    member: &PreparedMember,
    seg_idx: usize,
    axial: Option<f64>,
) -> Mat12 {
    let segment = &member.segments[seg_idx];
    let p = axial.unwrap_or(0.0);
    if p.abs() < 1e-10 {
        return segment.k_local;
    }

    let kg = math::member_geometric_stiffness(p, member.area, member.iy, member.iz, segment.length);
    let combined = segment.k_raw + kg;
    if segment.has_releases {
        math::apply_releases(&combined, &segment.releases)
    } else {
        combined
    }
}

fn block_from<const N: usize>(m: &nalgebra::SMatrix<f64, N, N>) -> DMatrix<f64> {
    DMatrix::from_fn(N, N, |i, j| m[(i, j)])
}

fn segment_dofs(i_base: usize, j_base: usize) -> Vec<usize> {
    (0..6)
        .map(|k| i_base + k)
        .chain((0..6).map(|k| j_base + k))
        .collect()
}

/// Assemble the global stiffness matrix from all currently active elements.
///
/// `axial` carries the latest solved segment axial forces for P-Delta mode;
/// pass `None` for a first-order stiffness.
pub(crate) fn assemble_stiffness(
    ctx: &SolveContext,
    member_active: &[bool],
    spring_active: &[bool],
    support_spring_engaged: &[bool],
    axial: Option<&AxialForces>,
) -> TripletMatrix {
    let member_blocks: Vec<(Vec<usize>, DMatrix<f64>)> = ctx
        .members
        .par_iter()
        .enumerate()
        .filter(|(m_idx, _)| member_active[*m_idx])
        .flat_map_iter(|(m_idx, member)| {
            member.segments.iter().enumerate().map(move |(s_idx, segment)| {
                let p = axial.map(|a| a.segments[m_idx][s_idx]);
                let k_local = segment_stiffness(member, s_idx, p);
                let k_global = member.t.transpose() * k_local * member.t;
                (
                    segment_dofs(segment.i_base, segment.j_base),
                    block_from(&k_global),
                )
            })
        })
        .collect();

    let spring_blocks: Vec<(Vec<usize>, DMatrix<f64>)> = ctx
        .springs
        .par_iter()
        .enumerate()
        .filter(|(s_idx, _)| spring_active[*s_idx])
        .map(|(_, spring)| {
            let k_global = spring.t.transpose() * spring.k_local * spring.t;
            (
                segment_dofs(spring.i_base, spring.j_base),
                block_from(&k_global),
            )
        })
        .collect();

    let shell_blocks: Vec<(Vec<usize>, DMatrix<f64>)> = ctx
        .shells
        .par_iter()
        .map(|shell| {
            let k_global = shell.t.transpose() * shell.k_local * shell.t;
            let dofs: Vec<usize> = shell
                .bases
                .iter()
                .flat_map(|&base| (0..6).map(move |k| base + k))
                .collect();
            (dofs, block_from(&k_global))
        })
        .collect();

    let mut k = TripletMatrix::new(ctx.dof.n_dofs());
    for (dofs, block) in member_blocks
        .iter()
        .chain(spring_blocks.iter())
        .chain(shell_blocks.iter())
    {
        k.add_block(dofs, block);
    }

    for (s_idx, spring) in ctx.support_springs.iter().enumerate() {
        if support_spring_engaged[s_idx] {
            k.add(spring.dof, spring.dof, spring.stiffness);
        }
    }

    k
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::context::SolveContext;
    use crate::analysis::AnalysisOptions;
    use crate::elements::{Material, Member, Node, Plate, Quad, Section, Spring, Support, SupportSpring};
    use crate::model::Model;

    fn mixed_model() -> Model {
        let mut model = Model::new();
        model.add_material("Steel", Material::steel()).unwrap();
        model
            .add_section("S", Section::rectangular(0.3, 0.4))
            .unwrap();

        model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node("N2", Node::new(4.0, 0.0, 0.0)).unwrap();
        model.add_node("N3", Node::new(4.0, 3.0, 0.0)).unwrap();
        model.add_node("P1", Node::new(0.0, 0.0, 2.0)).unwrap();
        model.add_node("P2", Node::new(1.5, 0.0, 2.0)).unwrap();
        model.add_node("P3", Node::new(1.5, 1.0, 2.0)).unwrap();
        model.add_node("P4", Node::new(0.0, 1.0, 2.0)).unwrap();
        model.add_node("Q4", Node::new(-0.2, 1.1, 2.0)).unwrap();

        model
            .add_member("M1", Member::new("N1", "N2", "Steel", "S"))
            .unwrap();
        model
            .add_member("M2", Member::new("N2", "N3", "Steel", "S"))
            .unwrap();
        model
            .add_spring("Sp", Spring::new("N1", "N3", 2e6))
            .unwrap();
        model
            .add_plate("Pl", Plate::new("P1", "P2", "P3", "P4", 0.01, "Steel"))
            .unwrap();
        model
            .add_quad("Qd", Quad::new("P1", "P2", "P3", "Q4", 0.01, "Steel"))
            .unwrap();
        model.add_support("N1", Support::fixed()).unwrap();
        model
            .add_support(
                "N3",
                Support::new().with_spring(1, SupportSpring::new(5e6)),
            )
            .unwrap();
        model
    }

    /// The assembled global stiffness of a model with no direction-dependent
    /// elements is symmetric; asymmetry means a formulator transformation bug
    #[test]
    fn test_assembled_stiffness_symmetry() {
        let model = mixed_model();
        let ctx = SolveContext::new(&model, AnalysisOptions::default()).unwrap();

        let member_active = vec![true; ctx.members.len()];
        let spring_active = vec![true; ctx.springs.len()];
        let engaged = vec![true; ctx.support_springs.len()];

        let k = assemble_stiffness(&ctx, &member_active, &spring_active, &engaged, None);
        let dense = k.to_dense();

        let scale = dense.amax();
        for i in 0..dense.nrows() {
            for j in 0..dense.ncols() {
                let diff = (dense[(i, j)] - dense[(j, i)]).abs();
                assert!(
                    diff <= scale * 1e-12,
                    "asymmetry at ({i}, {j}): {diff}"
                );
            }
        }
    }

    /// Elements sharing a node accumulate additively at the shared DOFs
    #[test]
    fn test_shared_node_contributions_sum() {
        let model = mixed_model();
        let ctx = SolveContext::new(&model, AnalysisOptions::default()).unwrap();

        let member_active = vec![true; ctx.members.len()];
        let spring_active = vec![true; ctx.springs.len()];
        let engaged = vec![true; ctx.support_springs.len()];

        let k_all = assemble_stiffness(&ctx, &member_active, &spring_active, &engaged, None)
            .to_dense();
        let k_no_spring =
            assemble_stiffness(&ctx, &member_active, &[false], &engaged, None).to_dense();

        // Removing the spring subtracts exactly its global block
        let n1_x = ctx.dof.base("N1");
        let spring = &ctx.springs[0];
        let k_spring_global = spring.t.transpose() * spring.k_local * spring.t;
        let diff = k_all[(n1_x, n1_x)] - k_no_spring[(n1_x, n1_x)];
        assert!((diff - k_spring_global[(0, 0)]).abs() <= diff.abs() * 1e-12);
    }
}
