//! Global statics checks: reactions balance applied loads, and linear
//! results superpose across load cases

use approx::assert_relative_eq;
use frame3d::prelude::*;

/// Right-angle frame, pin-supported at both far ends, point load at the
/// shared corner. Reactions must split per statics: the sum of vertical
/// reactions equals the applied vertical load, and the global force/moment
/// balance closes.
#[test]
fn right_angle_frame_reaction_split() {
    let mut model = Model::new();
    model.add_material("Steel", Material::steel()).unwrap();
    model
        .add_section("S", Section::rectangular(0.2, 0.3))
        .unwrap();

    // Vertical leg N1 -> N2, horizontal leg N2 -> N3
    model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
    model.add_node("N2", Node::new(0.0, 4.0, 0.0)).unwrap();
    model.add_node("N3", Node::new(6.0, 4.0, 0.0)).unwrap();

    model
        .add_member("Leg", Member::new("N1", "N2", "Steel", "S"))
        .unwrap();
    model
        .add_member("Arm", Member::new("N2", "N3", "Steel", "S"))
        .unwrap();

    // Pins in-plane; out-of-plane DOFs are restrained everywhere so the
    // planar frame has no out-of-plane rigid-body mode in 3D
    model
        .add_support("N1", Support::with_restraints(true, true, true, true, true, false))
        .unwrap();
    model
        .add_support("N3", Support::with_restraints(true, true, true, true, true, false))
        .unwrap();
    model
        .add_support("N2", Support::with_restraints(false, false, true, true, true, false))
        .unwrap();

    let p = 20_000.0;
    model
        .add_node_load("N2", NodeLoad::fy(-p, "Case 1"))
        .unwrap();

    let report = model
        .analyze(AnalysisOptions::linear().with_statics_check())
        .unwrap();
    assert!(report.all_converged());

    let r1 = model.node_reactions("N1", "Combo 1").unwrap();
    let r3 = model.node_reactions("N3", "Combo 1").unwrap();

    // Vertical equilibrium
    assert_relative_eq!(r1.fy + r3.fy, p, max_relative = 1e-9);
    // Horizontal reactions cancel
    assert_relative_eq!(r1.fx + r3.fx, 0.0, epsilon = p * 1e-9);
    // Moment balance about N1: the applied load acts at x=0, so the N3
    // reaction pair must produce no net moment
    let m_about_n1 = r3.fy * 6.0 - r3.fx * 4.0;
    assert_relative_eq!(m_about_n1, 0.0, epsilon = p * 6.0 * 1e-9);
}

/// Sum of applied loads plus reactions vanishes in every global direction
/// and about every global axis, for a loaded space frame
#[test]
fn space_frame_equilibrium() {
    let mut model = Model::new();
    model.add_material("Steel", Material::steel()).unwrap();
    model
        .add_section("S", Section::rectangular(0.25, 0.25))
        .unwrap();

    // A small 3D table: four columns, two beams
    let coords = [
        ("B1", [0.0, 0.0, 0.0]),
        ("B2", [5.0, 0.0, 0.0]),
        ("B3", [5.0, 0.0, 4.0]),
        ("B4", [0.0, 0.0, 4.0]),
        ("T1", [0.0, 3.0, 0.0]),
        ("T2", [5.0, 3.0, 0.0]),
        ("T3", [5.0, 3.0, 4.0]),
        ("T4", [0.0, 3.0, 4.0]),
    ];
    for (name, [x, y, z]) in coords {
        model.add_node(name, Node::new(x, y, z)).unwrap();
    }
    for (name, i, j) in [
        ("C1", "B1", "T1"),
        ("C2", "B2", "T2"),
        ("C3", "B3", "T3"),
        ("C4", "B4", "T4"),
        ("G12", "T1", "T2"),
        ("G23", "T2", "T3"),
        ("G34", "T3", "T4"),
        ("G41", "T4", "T1"),
    ] {
        model
            .add_member(name, Member::new(i, j, "Steel", "S"))
            .unwrap();
    }
    for base in ["B1", "B2", "B3", "B4"] {
        model.add_support(base, Support::fixed()).unwrap();
    }

    // Unsymmetric loading: gravity, lateral push, and a twist moment
    model
        .add_node_load("T1", NodeLoad::force(8_000.0, -20_000.0, 3_000.0, "Case 1"))
        .unwrap();
    model
        .add_node_load("T3", NodeLoad::moment(0.0, 5_000.0, 0.0, "Case 1"))
        .unwrap();
    model
        .add_member_dist_load("G12", DistributedLoad::uniform_downward(4_000.0, "Case 1"))
        .unwrap();

    model.analyze_linear().unwrap().into_result().unwrap();

    // Collect applied loads (including the distributed load resultant) and
    // reactions; both forces and moments about the origin must cancel
    let mut sum_f = [0.0_f64; 3];
    let mut sum_m = [0.0_f64; 3];

    let mut add = |coords: [f64; 3], f: [f64; 3], m: [f64; 3]| {
        for k in 0..3 {
            sum_f[k] += f[k];
        }
        sum_m[0] += m[0] + coords[1] * f[2] - coords[2] * f[1];
        sum_m[1] += m[1] + coords[2] * f[0] - coords[0] * f[2];
        sum_m[2] += m[2] + coords[0] * f[1] - coords[1] * f[0];
    };

    // Applied nodal loads
    add(
        [0.0, 3.0, 0.0],
        [8_000.0, -20_000.0, 3_000.0],
        [0.0, 0.0, 0.0],
    );
    add([5.0, 3.0, 4.0], [0.0, 0.0, 0.0], [0.0, 5_000.0, 0.0]);
    // Distributed load resultant on G12: 4 kN/m over 5 m downward at its
    // centroid (2.5, 3.0, 0.0)
    add([2.5, 3.0, 0.0], [0.0, -4_000.0 * 5.0, 0.0], [0.0, 0.0, 0.0]);

    for base in ["B1", "B2", "B3", "B4"] {
        let node = &model.nodes[base];
        let r = model.node_reactions(base, "Combo 1").unwrap();
        add(node.coords(), [r.fx, r.fy, r.fz], [r.mx, r.my, r.mz]);
    }

    let scale = 40_000.0;
    for k in 0..3 {
        assert_relative_eq!(sum_f[k], 0.0, epsilon = scale * 1e-9);
        assert_relative_eq!(sum_m[k], 0.0, epsilon = scale * 6.0 * 1e-9);
    }
}

/// Solving two cases independently and summing equals solving their
/// combination with unit factors (linear model)
#[test]
fn superposition_across_cases() {
    let build = || {
        let mut model = Model::new();
        model.add_material("Steel", Material::steel()).unwrap();
        model
            .add_section("S", Section::rectangular(0.3, 0.4))
            .unwrap();
        model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node("N2", Node::new(0.0, 4.0, 0.0)).unwrap();
        model.add_node("N3", Node::new(6.0, 4.0, 0.0)).unwrap();
        model
            .add_member("Col", Member::new("N1", "N2", "Steel", "S"))
            .unwrap();
        model
            .add_member("Beam", Member::new("N2", "N3", "Steel", "S"))
            .unwrap();
        model.add_support("N1", Support::fixed()).unwrap();
        model.add_support("N3", Support::roller_y()).unwrap();

        model
            .add_node_load("N2", NodeLoad::fy(-15_000.0, "Dead"))
            .unwrap();
        model
            .add_node_load("N2", NodeLoad::fx(5_000.0, "Wind"))
            .unwrap();
        model
            .add_member_dist_load("Beam", DistributedLoad::uniform_downward(3_000.0, "Dead"))
            .unwrap();

        model
            .add_load_combo(LoadCombination::new("D").with_case("Dead", 1.0))
            .unwrap();
        model
            .add_load_combo(LoadCombination::new("W").with_case("Wind", 1.0))
            .unwrap();
        model
            .add_load_combo(
                LoadCombination::new("D+W")
                    .with_case("Dead", 1.0)
                    .with_case("Wind", 1.0),
            )
            .unwrap();
        model
    };

    let mut model = build();
    model.analyze_linear().unwrap().into_result().unwrap();

    for node in ["N2", "N3"] {
        let d = model.node_displacement(node, "D").unwrap();
        let w = model.node_displacement(node, "W").unwrap();
        let dw = model.node_displacement(node, "D+W").unwrap();

        assert_relative_eq!(d.dx + w.dx, dw.dx, max_relative = 1e-9, epsilon = 1e-15);
        assert_relative_eq!(d.dy + w.dy, dw.dy, max_relative = 1e-9, epsilon = 1e-15);
        assert_relative_eq!(d.rz + w.rz, dw.rz, max_relative = 1e-9, epsilon = 1e-15);
    }

    for node in ["N1", "N3"] {
        let d = model.node_reactions(node, "D").unwrap();
        let w = model.node_reactions(node, "W").unwrap();
        let dw = model.node_reactions(node, "D+W").unwrap();
        assert_relative_eq!(d.fy + w.fy, dw.fy, max_relative = 1e-9, epsilon = 1e-9);
        assert_relative_eq!(d.fx + w.fx, dw.fx, max_relative = 1e-9, epsilon = 1e-9);
    }
}

/// A combination whose factors net to zero still yields a deterministic
/// zero result, not a missing entry
#[test]
fn zero_combination_still_participates() {
    let mut model = Model::new();
    model.add_material("Steel", Material::steel()).unwrap();
    model
        .add_section("S", Section::rectangular(0.2, 0.2))
        .unwrap();
    model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
    model.add_node("N2", Node::new(5.0, 0.0, 0.0)).unwrap();
    model
        .add_member("M1", Member::new("N1", "N2", "Steel", "S"))
        .unwrap();
    model.add_support("N1", Support::fixed()).unwrap();
    model
        .add_node_load("N2", NodeLoad::fy(-1_000.0, "Dead"))
        .unwrap();
    model
        .add_load_combo(LoadCombination::new("Nothing").with_case("Dead", 0.0))
        .unwrap();

    model.analyze_linear().unwrap().into_result().unwrap();

    let disp = model.node_displacement("N2", "Nothing").unwrap();
    assert_eq!(disp.dy, 0.0);
    let rxn = model.node_reactions("N1", "Nothing").unwrap();
    assert_eq!(rxn.fy, 0.0);
}
