//! Textbook cantilever checks: tip deflection P*L^3/(3*E*I) and fixed-end
//! moment P*L

use approx::assert_relative_eq;
use frame3d::prelude::*;

fn cantilever_model(length: f64) -> Model {
    let mut model = Model::new();
    model.add_material("Steel", Material::steel()).unwrap();
    model
        .add_section("S", Section::new(0.01, 2e-5, 4e-5, 1e-6))
        .unwrap();
    model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
    model.add_node("N2", Node::new(length, 0.0, 0.0)).unwrap();
    model
        .add_member("M1", Member::new("N1", "N2", "Steel", "S"))
        .unwrap();
    model.add_support("N1", Support::fixed()).unwrap();
    model
}

#[test]
fn tip_deflection_and_fixed_end_moment() {
    let length = 10.0;
    let p = 10_000.0;

    let mut model = cantilever_model(length);
    model
        .add_node_load("N2", NodeLoad::fy(-p, "Case 1"))
        .unwrap();
    model.analyze_linear().unwrap().into_result().unwrap();

    // Transverse tip load bends about local z, so the stiffness is E*Iz
    let e = 200e9;
    let iz = 4e-5;
    let expected_tip = -p * length.powi(3) / (3.0 * e * iz);

    let disp = model.node_displacement("N2", "Combo 1").unwrap();
    assert_relative_eq!(disp.dy, expected_tip, max_relative = 1e-6);

    let rxn = model.node_reactions("N1", "Combo 1").unwrap();
    assert_relative_eq!(rxn.fy, p, max_relative = 1e-6);
    assert_relative_eq!(rxn.mz, p * length, max_relative = 1e-6);

    // Member end forces: fixed-end moment P*L at the i-end
    let forces_i = model.member_forces_i("M1", "Combo 1").unwrap();
    assert_relative_eq!(forces_i.moment_z.abs(), p * length, max_relative = 1e-6);
}

#[test]
fn axial_tip_load() {
    let length = 10.0;
    let p = 50_000.0;

    let mut model = cantilever_model(length);
    model
        .add_node_load("N2", NodeLoad::fx(p, "Case 1"))
        .unwrap();
    model.analyze_linear().unwrap().into_result().unwrap();

    let e = 200e9;
    let a = 0.01;
    let expected = p * length / (e * a);

    let disp = model.node_displacement("N2", "Combo 1").unwrap();
    assert_relative_eq!(disp.dx, expected, max_relative = 1e-9);

    let forces = model.member_forces_i("M1", "Combo 1").unwrap();
    assert_relative_eq!(forces.axial, p, max_relative = 1e-9);
}

#[test]
fn cantilever_in_z_uses_weak_axis() {
    let length = 10.0;
    let p = 10_000.0;

    let mut model = cantilever_model(length);
    model
        .add_node_load("N2", NodeLoad::fz(-p, "Case 1"))
        .unwrap();
    model.analyze_linear().unwrap().into_result().unwrap();

    // Out-of-plane tip load bends about local y (E*Iy)
    let e = 200e9;
    let iy = 2e-5;
    let expected_tip = -p * length.powi(3) / (3.0 * e * iy);

    let disp = model.node_displacement("N2", "Combo 1").unwrap();
    assert_relative_eq!(disp.dz, expected_tip, max_relative = 1e-6);

    let rxn = model.node_reactions("N1", "Combo 1").unwrap();
    assert_relative_eq!(rxn.fz, p, max_relative = 1e-6);
    assert_relative_eq!(rxn.my, -p * length, max_relative = 1e-6);
}

#[test]
fn pin_ended_member_sheds_end_moments() {
    // Member pinned at both ends between two fixed nodes: the condensed
    // fixed-end forces of a uniform load are simple-beam reactions, with no
    // clamping moments
    let length = 8.0;
    let w = 4_000.0;

    let mut model = Model::new();
    model.add_material("Steel", Material::steel()).unwrap();
    model
        .add_section("S", Section::rectangular(0.3, 0.5))
        .unwrap();
    model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
    model.add_node("N2", Node::new(length, 0.0, 0.0)).unwrap();
    model
        .add_member(
            "M1",
            Member::new("N1", "N2", "Steel", "S").with_releases(MemberReleases::pin_both()),
        )
        .unwrap();
    model.add_support("N1", Support::fixed()).unwrap();
    model.add_support("N2", Support::fixed()).unwrap();
    model
        .add_member_dist_load("M1", DistributedLoad::uniform_downward(w, "Case 1"))
        .unwrap();

    model.analyze_linear().unwrap().into_result().unwrap();

    let rxn1 = model.node_reactions("N1", "Combo 1").unwrap();
    let rxn2 = model.node_reactions("N2", "Combo 1").unwrap();
    assert_relative_eq!(rxn1.fy, w * length / 2.0, max_relative = 1e-9);
    assert_relative_eq!(rxn2.fy, w * length / 2.0, max_relative = 1e-9);
    assert_relative_eq!(rxn1.mz, 0.0, epsilon = w * length * length * 1e-9);
    assert_relative_eq!(rxn2.mz, 0.0, epsilon = w * length * length * 1e-9);
}

#[test]
fn support_settlement_induces_forces() {
    // Fixed-fixed beam with a prescribed settlement at one end: classic
    // shears 12*E*I*d/L^3 and end moment 6*E*I*d/L^2
    let length = 6.0;
    let settlement = 0.01;

    let mut model = cantilever_model(length);
    model
        .add_support("N2", Support::fixed().with_enforced_dy(-settlement))
        .unwrap();
    model.analyze_linear().unwrap().into_result().unwrap();

    let e = 200e9;
    let iz = 4e-5;
    let shear = 12.0 * e * iz * settlement / length.powi(3);
    let moment = 6.0 * e * iz * settlement / length.powi(2);

    let rxn1 = model.node_reactions("N1", "Combo 1").unwrap();
    assert_relative_eq!(rxn1.fy, shear, max_relative = 1e-9);
    assert_relative_eq!(rxn1.mz, moment, max_relative = 1e-9);

    let disp2 = model.node_displacement("N2", "Combo 1").unwrap();
    assert_relative_eq!(disp2.dy, -settlement, max_relative = 1e-12);

    // The settled end carries the opposite shear
    let rxn2 = model.node_reactions("N2", "Combo 1").unwrap();
    assert_relative_eq!(rxn2.fy, -shear, max_relative = 1e-9);
}

#[test]
fn sparse_solver_matches_dense() {
    let length = 10.0;
    let p = 10_000.0;

    let mut dense = cantilever_model(length);
    dense
        .add_node_load("N2", NodeLoad::fy(-p, "Case 1"))
        .unwrap();
    dense.analyze_linear().unwrap().into_result().unwrap();

    let mut sparse = cantilever_model(length);
    sparse
        .add_node_load("N2", NodeLoad::fy(-p, "Case 1"))
        .unwrap();
    sparse
        .analyze(AnalysisOptions::linear().with_sparse_solver())
        .unwrap()
        .into_result()
        .unwrap();

    let d_dense = dense.node_displacement("N2", "Combo 1").unwrap();
    let d_sparse = sparse.node_displacement("N2", "Combo 1").unwrap();
    assert_relative_eq!(d_dense.dy, d_sparse.dy, max_relative = 1e-8);
    assert_relative_eq!(d_dense.rz, d_sparse.rz, max_relative = 1e-8);
}

#[test]
fn midspan_point_load_on_member() {
    // Cantilever with the load at midspan: tip deflection
    // 5*P*a^3/(6*E*I) with a = L/2 applied at midspan... use the standard
    // result delta_tip = P*a^2*(3L - a)/(6*E*I)
    let length = 10.0;
    let a = 5.0;
    let p = 10_000.0;

    let mut model = cantilever_model(length);
    model
        .add_member_point_load(
            "M1",
            PointLoad::new(-p, a, LoadDirection::Fy, "Case 1"),
        )
        .unwrap();
    model.analyze_linear().unwrap().into_result().unwrap();

    let e = 200e9;
    let iz = 4e-5;
    let expected_tip = -p * a.powi(2) * (3.0 * length - a) / (6.0 * e * iz);

    let disp = model.node_displacement("N2", "Combo 1").unwrap();
    assert_relative_eq!(disp.dy, expected_tip, max_relative = 1e-6);

    let rxn = model.node_reactions("N1", "Combo 1").unwrap();
    assert_relative_eq!(rxn.fy, p, max_relative = 1e-9);
    assert_relative_eq!(rxn.mz, p * a, max_relative = 1e-9);
}
