//! Example: braced portal frame with a tension-only brace pair

use anyhow::Result;
use frame3d::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== frame3d example: braced portal frame ===\n");

    let mut model = Model::new();

    model.add_material("Steel", Material::steel())?;

    // W12x26 (approximate SI properties)
    model.add_section("W12x26", Section::new(4.94e-3, 8.49e-5, 7.2e-6, 1.25e-7))?;
    // Slender rod for the braces
    model.add_section("Rod20", Section::circular(0.02))?;

    // A simple portal frame with crossed braces:
    //
    //     N3 -------- N4
    //     | \      /  |
    //     |   \  /    |
    //     |   /  \    |
    //     | /      \  |
    //     N1        N2
    //     ^          ^
    //   Fixed      Fixed
    let height = 4.0;
    let span = 6.0;

    model.add_node("N1", Node::new(0.0, 0.0, 0.0))?;
    model.add_node("N2", Node::new(span, 0.0, 0.0))?;
    model.add_node("N3", Node::new(0.0, height, 0.0))?;
    model.add_node("N4", Node::new(span, height, 0.0))?;

    model.add_member("Col1", Member::new("N1", "N3", "Steel", "W12x26"))?;
    model.add_member("Col2", Member::new("N2", "N4", "Steel", "W12x26"))?;
    model.add_member("Beam", Member::new("N3", "N4", "Steel", "W12x26"))?;

    // Crossed tension-only braces: only one engages per wind direction
    model.add_member(
        "Brace1",
        Member::new("N1", "N4", "Steel", "Rod20").tension_only(),
    )?;
    model.add_member(
        "Brace2",
        Member::new("N2", "N3", "Steel", "Rod20").tension_only(),
    )?;

    model.add_support("N1", Support::fixed())?;
    model.add_support("N2", Support::fixed())?;

    // Gravity on the beam, wind at roof level
    model.add_member_dist_load("Beam", DistributedLoad::uniform_downward(20_000.0, "Dead"))?;
    model.add_node_load("N3", NodeLoad::fx(10_000.0, "Wind"))?;

    model.add_load_combo(LoadCombination::new("1.4D").with_case("Dead", 1.4))?;
    model.add_load_combo(
        LoadCombination::new("1.2D + 1.0W")
            .with_case("Dead", 1.2)
            .with_case("Wind", 1.0),
    )?;

    println!("Running first-order analysis...\n");
    let report = model.analyze_linear()?;
    report.into_result()?;

    for combo_name in model.combo_names() {
        println!("=== Results for {combo_name} ===\n");

        println!("Node displacements:");
        for node_name in ["N3", "N4"] {
            let disp = model.node_displacement(node_name, &combo_name)?;
            println!(
                "  {}: DX={:.4}mm, DY={:.4}mm, RZ={:.6}rad",
                node_name,
                disp.dx * 1000.0,
                disp.dy * 1000.0,
                disp.rz
            );
        }

        println!("\nSupport reactions:");
        for node_name in ["N1", "N2"] {
            let rxn = model.node_reactions(node_name, &combo_name)?;
            println!(
                "  {}: FX={:.2}kN, FY={:.2}kN, MZ={:.2}kN*m",
                node_name,
                rxn.fx / 1000.0,
                rxn.fy / 1000.0,
                rxn.mz / 1000.0
            );
        }

        println!("\nBrace state:");
        for brace in ["Brace1", "Brace2"] {
            let activation = model.member_activation(brace, &combo_name)?;
            let axial = model.member_forces_i(brace, &combo_name)?.axial;
            println!("  {brace}: {activation:?}, P={:.2}kN", axial / 1000.0);
        }

        let summary = model.summary(&combo_name)?;
        println!(
            "\nMax displacement: {:.4}mm at {}\n",
            summary.max_displacement * 1000.0,
            summary.max_disp_node
        );
    }

    println!("=== P-Delta comparison ===\n");
    let report = model.analyze_p_delta()?;
    report.into_result()?;

    let disp = model.node_displacement("N3", "1.2D + 1.0W")?;
    println!(
        "Lateral displacement at N3 (P-Delta): {:.4}mm",
        disp.dx * 1000.0
    );

    println!("\n=== Analysis complete ===");
    Ok(())
}
