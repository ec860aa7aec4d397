//! Model - main structural model container and analysis entry point

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::context::SolveContext;
use crate::analysis::{iterate, AnalysisOptions};
use crate::elements::{Material, Member, Node, Plate, Quad, Section, Spring, Support};
use crate::error::{FrameError, FrameResult};
use crate::loads::{
    DistributedLoad, LoadCase, LoadCombination, NodeLoad, PlateLoad, PointLoad,
};
use crate::results::{
    Activation, AnalysisReport, AnalysisSummary, ComboResults, MemberForces, MemberResult,
    NodeDisplacement, PlateStresses, Reactions, SpringResult,
};

/// The main 3D structural model: a registry of nodes, elements, properties,
/// supports and loads, plus the per-combination results store.
///
/// Every mutation invalidates previously published analysis results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    /// Nodes in the model
    pub nodes: HashMap<String, Node>,
    /// Materials in the model
    pub materials: HashMap<String, Material>,
    /// Sections in the model
    pub sections: HashMap<String, Section>,
    /// Members (frame elements), possibly subdivided by intermediate nodes
    pub members: HashMap<String, Member>,
    /// Two-node axial springs
    pub springs: HashMap<String, Spring>,
    /// Rectangular plate elements
    pub plates: HashMap<String, Plate>,
    /// General quadrilateral shell elements
    pub quads: HashMap<String, Quad>,
    /// Support conditions at nodes
    pub supports: HashMap<String, Support>,
    /// Node loads
    pub node_loads: HashMap<String, Vec<NodeLoad>>,
    /// Member point loads
    pub member_point_loads: HashMap<String, Vec<PointLoad>>,
    /// Member distributed loads
    pub member_dist_loads: HashMap<String, Vec<DistributedLoad>>,
    /// Plate/quad pressure loads
    pub plate_loads: HashMap<String, Vec<PlateLoad>>,
    /// Registered load cases
    pub load_cases: HashMap<String, LoadCase>,
    /// Load combinations
    pub load_combos: HashMap<String, LoadCombination>,

    /// Converged results keyed by load combination
    #[serde(skip)]
    results: HashMap<String, ComboResults>,
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all published results; called by every mutation
    fn invalidate(&mut self) {
        self.results.clear();
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node to the model
    pub fn add_node(&mut self, name: &str, node: Node) -> FrameResult<()> {
        if self.nodes.contains_key(name) {
            return Err(FrameError::DuplicateName(name.to_string()));
        }
        self.nodes.insert(name.to_string(), node);
        self.invalidate();
        Ok(())
    }

    /// Add a material to the model
    pub fn add_material(&mut self, name: &str, material: Material) -> FrameResult<()> {
        if self.materials.contains_key(name) {
            return Err(FrameError::DuplicateName(name.to_string()));
        }
        self.materials.insert(name.to_string(), material);
        self.invalidate();
        Ok(())
    }

    /// Add a section to the model
    pub fn add_section(&mut self, name: &str, section: Section) -> FrameResult<()> {
        if self.sections.contains_key(name) {
            return Err(FrameError::DuplicateName(name.to_string()));
        }
        self.sections.insert(name.to_string(), section);
        self.invalidate();
        Ok(())
    }

    /// Add a member to the model
    pub fn add_member(&mut self, name: &str, member: Member) -> FrameResult<()> {
        for node_name in member.node_chain() {
            if !self.nodes.contains_key(node_name) {
                return Err(FrameError::NodeNotFound(node_name.to_string()));
            }
        }
        if !self.materials.contains_key(&member.material) {
            return Err(FrameError::MaterialNotFound(member.material.clone()));
        }
        if !self.sections.contains_key(&member.section) {
            return Err(FrameError::SectionNotFound(member.section.clone()));
        }
        if self.members.contains_key(name) {
            return Err(FrameError::DuplicateName(name.to_string()));
        }

        self.members.insert(name.to_string(), member);
        self.invalidate();
        Ok(())
    }

    /// Add a two-node spring to the model
    pub fn add_spring(&mut self, name: &str, spring: Spring) -> FrameResult<()> {
        for node_name in [&spring.i_node, &spring.j_node] {
            if !self.nodes.contains_key(node_name) {
                return Err(FrameError::NodeNotFound(node_name.clone()));
            }
        }
        if spring.stiffness <= 0.0 {
            return Err(FrameError::InvalidInput(format!(
                "spring '{name}' must have positive stiffness"
            )));
        }
        if self.springs.contains_key(name) {
            return Err(FrameError::DuplicateName(name.to_string()));
        }

        self.springs.insert(name.to_string(), spring);
        self.invalidate();
        Ok(())
    }

    /// Add a rectangular plate element to the model
    pub fn add_plate(&mut self, name: &str, plate: Plate) -> FrameResult<()> {
        for node_name in plate.corner_nodes() {
            if !self.nodes.contains_key(node_name) {
                return Err(FrameError::NodeNotFound(node_name.to_string()));
            }
        }
        if !self.materials.contains_key(&plate.material) {
            return Err(FrameError::MaterialNotFound(plate.material.clone()));
        }
        if self.plates.contains_key(name) || self.quads.contains_key(name) {
            return Err(FrameError::DuplicateName(name.to_string()));
        }

        self.plates.insert(name.to_string(), plate);
        self.invalidate();
        Ok(())
    }

    /// Add a quad element to the model
    pub fn add_quad(&mut self, name: &str, quad: Quad) -> FrameResult<()> {
        for node_name in quad.corner_nodes() {
            if !self.nodes.contains_key(node_name) {
                return Err(FrameError::NodeNotFound(node_name.to_string()));
            }
        }
        if !self.materials.contains_key(&quad.material) {
            return Err(FrameError::MaterialNotFound(quad.material.clone()));
        }
        if self.quads.contains_key(name) || self.plates.contains_key(name) {
            return Err(FrameError::DuplicateName(name.to_string()));
        }

        self.quads.insert(name.to_string(), quad);
        self.invalidate();
        Ok(())
    }

    /// Add a support condition
    pub fn add_support(&mut self, node_name: &str, support: Support) -> FrameResult<()> {
        if !self.nodes.contains_key(node_name) {
            return Err(FrameError::NodeNotFound(node_name.to_string()));
        }
        self.supports.insert(node_name.to_string(), support);
        self.invalidate();
        Ok(())
    }

    /// Add a node load
    pub fn add_node_load(&mut self, node_name: &str, load: NodeLoad) -> FrameResult<()> {
        if !self.nodes.contains_key(node_name) {
            return Err(FrameError::NodeNotFound(node_name.to_string()));
        }
        self.node_loads
            .entry(node_name.to_string())
            .or_default()
            .push(load);
        self.invalidate();
        Ok(())
    }

    /// Add a point load to a member
    pub fn add_member_point_load(&mut self, member_name: &str, load: PointLoad) -> FrameResult<()> {
        if !self.members.contains_key(member_name) {
            return Err(FrameError::MemberNotFound(member_name.to_string()));
        }
        self.member_point_loads
            .entry(member_name.to_string())
            .or_default()
            .push(load);
        self.invalidate();
        Ok(())
    }

    /// Add a distributed load to a member
    pub fn add_member_dist_load(
        &mut self,
        member_name: &str,
        load: DistributedLoad,
    ) -> FrameResult<()> {
        if !self.members.contains_key(member_name) {
            return Err(FrameError::MemberNotFound(member_name.to_string()));
        }
        self.member_dist_loads
            .entry(member_name.to_string())
            .or_default()
            .push(load);
        self.invalidate();
        Ok(())
    }

    /// Add a pressure load to a plate or quad
    pub fn add_plate_load(&mut self, plate_name: &str, load: PlateLoad) -> FrameResult<()> {
        if !self.plates.contains_key(plate_name) && !self.quads.contains_key(plate_name) {
            return Err(FrameError::PlateNotFound(plate_name.to_string()));
        }
        self.plate_loads
            .entry(plate_name.to_string())
            .or_default()
            .push(load);
        self.invalidate();
        Ok(())
    }

    /// Register a load case
    pub fn add_load_case(&mut self, case: LoadCase) -> FrameResult<()> {
        let name = case.name.clone();
        if self.load_cases.contains_key(&name) {
            return Err(FrameError::DuplicateName(name));
        }
        self.load_cases.insert(name, case);
        self.invalidate();
        Ok(())
    }

    /// Add a load combination
    pub fn add_load_combo(&mut self, combo: LoadCombination) -> FrameResult<()> {
        let name = combo.name.clone();
        if self.load_combos.contains_key(&name) {
            return Err(FrameError::DuplicateName(name));
        }
        self.load_combos.insert(name, combo);
        self.invalidate();
        Ok(())
    }

    /// Batch entry point for meshing utilities: nodes and quads created here
    /// go through the same validation as manually authored geometry.
    pub fn add_mesh<N, Q>(&mut self, nodes: N, quads: Q) -> FrameResult<()>
    where
        N: IntoIterator<Item = (String, Node)>,
        Q: IntoIterator<Item = (String, Quad)>,
    {
        for (name, node) in nodes {
            self.add_node(&name, node)?;
        }
        for (name, quad) in quads {
            self.add_quad(&name, quad)?;
        }
        Ok(())
    }

    // ========================
    // Analysis Methods
    // ========================

    /// Run linear static analysis (with tension/compression-only iteration
    /// when the model needs it)
    pub fn analyze_linear(&mut self) -> FrameResult<AnalysisReport> {
        self.analyze(AnalysisOptions::linear())
    }

    /// Run P-Delta (second order) analysis
    pub fn analyze_p_delta(&mut self) -> FrameResult<AnalysisReport> {
        self.analyze(AnalysisOptions::p_delta())
    }

    /// Run analysis with custom options.
    ///
    /// Each requested combination is solved independently; combinations share
    /// only read-only model data and may run concurrently. A failing
    /// combination is recorded in the report and never aborts its siblings.
    /// Converged results are published into the results store; an error
    /// return means the model definition itself is invalid.
    pub fn analyze(&mut self, options: AnalysisOptions) -> FrameResult<AnalysisReport> {
        if self.load_combos.is_empty() {
            self.load_combos.insert(
                "Combo 1".to_string(),
                LoadCombination::single("Combo 1", "Case 1"),
            );
        }

        let mut combo_names: Vec<String> = match &options.combo_tags {
            Some(tags) => self
                .load_combos
                .values()
                .filter(|combo| combo.matches_tags(tags))
                .map(|combo| combo.name.clone())
                .collect(),
            None => self.load_combos.keys().cloned().collect(),
        };
        combo_names.sort();

        let outcomes = {
            let ctx = SolveContext::new(self, options)?;
            debug!(
                "analyzing {} combination(s) over {} DOFs",
                combo_names.len(),
                ctx.dof.n_dofs()
            );

            // The results store is the only shared mutable resource;
            // append-only writes keyed by combination name
            let store: Mutex<Vec<(String, FrameResult<ComboResults>)>> = Mutex::new(Vec::new());
            combo_names.par_iter().for_each(|name| {
                let outcome = iterate::solve_combination(&ctx, name);
                store.lock().expect("results store lock").push((name.clone(), outcome));
            });

            let mut outcomes = store.into_inner().expect("results store lock");
            outcomes.sort_by(|a, b| a.0.cmp(&b.0));
            outcomes
        };

        let mut report = AnalysisReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(results) => {
                    self.results.insert(name.clone(), results);
                    report.converged.push(name);
                }
                Err(error) => report.failures.push((name, error)),
            }
        }
        Ok(report)
    }

    // ========================
    // Result Access Methods
    // ========================

    /// Converged results for a combination
    pub fn results(&self, combo_name: &str) -> FrameResult<&ComboResults> {
        self.results
            .get(combo_name)
            .ok_or_else(|| FrameError::NotAnalyzed(combo_name.to_string()))
    }

    /// Get node displacement
    pub fn node_displacement(
        &self,
        node_name: &str,
        combo_name: &str,
    ) -> FrameResult<NodeDisplacement> {
        if !self.nodes.contains_key(node_name) {
            return Err(FrameError::NodeNotFound(node_name.to_string()));
        }
        let results = self.results(combo_name)?;
        let arr = results
            .displacements
            .get(node_name)
            .copied()
            .unwrap_or([0.0; 6]);
        Ok(NodeDisplacement::from_array(arr))
    }

    /// Get node reactions (zero for a node with no support)
    pub fn node_reactions(&self, node_name: &str, combo_name: &str) -> FrameResult<Reactions> {
        if !self.nodes.contains_key(node_name) {
            return Err(FrameError::NodeNotFound(node_name.to_string()));
        }
        let results = self.results(combo_name)?;
        let arr = results
            .reactions
            .get(node_name)
            .copied()
            .unwrap_or([0.0; 6]);
        Ok(Reactions::from_array(arr))
    }

    /// Full member result (per-segment forces and activation state)
    pub fn member_result(&self, member_name: &str, combo_name: &str) -> FrameResult<&MemberResult> {
        if !self.members.contains_key(member_name) {
            return Err(FrameError::MemberNotFound(member_name.to_string()));
        }
        self.results(combo_name)?
            .members
            .get(member_name)
            .ok_or_else(|| FrameError::NotAnalyzed(combo_name.to_string()))
    }

    /// Get member forces at the physical member's i-end
    pub fn member_forces_i(&self, member_name: &str, combo_name: &str) -> FrameResult<MemberForces> {
        self.member_result(member_name, combo_name)?
            .forces_i()
            .ok_or_else(|| FrameError::NotAnalyzed(combo_name.to_string()))
    }

    /// Get member forces at the physical member's j-end
    pub fn member_forces_j(&self, member_name: &str, combo_name: &str) -> FrameResult<MemberForces> {
        self.member_result(member_name, combo_name)?
            .forces_j()
            .ok_or_else(|| FrameError::NotAnalyzed(combo_name.to_string()))
    }

    /// Activation state of a member at convergence
    pub fn member_activation(&self, member_name: &str, combo_name: &str) -> FrameResult<Activation> {
        Ok(self.member_result(member_name, combo_name)?.activation)
    }

    /// Solved spring state (axial force and activation)
    pub fn spring_result(&self, spring_name: &str, combo_name: &str) -> FrameResult<&SpringResult> {
        if !self.springs.contains_key(spring_name) {
            return Err(FrameError::SpringNotFound(spring_name.to_string()));
        }
        self.results(combo_name)?
            .springs
            .get(spring_name)
            .ok_or_else(|| FrameError::NotAnalyzed(combo_name.to_string()))
    }

    /// Centre stresses of a plate or quad
    pub fn plate_stress(&self, plate_name: &str, combo_name: &str) -> FrameResult<PlateStresses> {
        if !self.plates.contains_key(plate_name) && !self.quads.contains_key(plate_name) {
            return Err(FrameError::PlateNotFound(plate_name.to_string()));
        }
        self.results(combo_name)?
            .plates
            .get(plate_name)
            .map(|r| r.stresses)
            .ok_or_else(|| FrameError::NotAnalyzed(combo_name.to_string()))
    }

    /// Get analysis summary for a combination
    pub fn summary(&self, combo_name: &str) -> FrameResult<AnalysisSummary> {
        let results = self.results(combo_name)?;

        let mut summary = AnalysisSummary {
            num_nodes: self.nodes.len(),
            num_members: self.members.len(),
            num_plates: self.plates.len() + self.quads.len(),
            total_dofs: self.nodes.len() * 6,
            ..Default::default()
        };

        for (name, disp) in &results.displacements {
            let mag = (disp[0].powi(2) + disp[1].powi(2) + disp[2].powi(2)).sqrt();
            if mag > summary.max_displacement {
                summary.max_displacement = mag;
                summary.max_disp_node = name.clone();
            }
        }

        for (name, rxn) in &results.reactions {
            let mag = (rxn[0].powi(2) + rxn[1].powi(2) + rxn[2].powi(2)).sqrt();
            if mag > summary.max_reaction {
                summary.max_reaction = mag;
                summary.max_reaction_node = name.clone();
            }
        }

        for (name, member) in &results.members {
            let axial = member.governing_axial().abs();
            if axial > summary.max_axial {
                summary.max_axial = axial;
                summary.max_axial_member = name.clone();
            }
            for segment in &member.segments {
                let f = &segment.local_forces;
                let moment = f[4].abs().max(f[5].abs()).max(f[10].abs()).max(f[11].abs());
                if moment > summary.max_moment {
                    summary.max_moment = moment;
                    summary.max_moment_member = name.clone();
                }
            }
        }

        let restrained: usize = self.supports.values().map(Support::num_restrained).sum();
        summary.free_dofs = summary.total_dofs - restrained;

        Ok(summary)
    }

    /// Check whether results exist for at least one combination
    pub fn is_analyzed(&self) -> bool {
        !self.results.is_empty()
    }

    /// Get all load combination names (sorted)
    pub fn combo_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.load_combos.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all load case names in use (registered or referenced by a load),
    /// sorted
    pub fn load_case_names(&self) -> Vec<String> {
        let mut cases: Vec<String> = self.known_case_names().into_iter().collect();
        cases.sort();
        cases
    }

    /// Case names that are valid targets for a combination factor
    pub(crate) fn known_case_names(&self) -> HashSet<String> {
        let mut cases: HashSet<String> = self.load_cases.keys().cloned().collect();
        for loads in self.node_loads.values() {
            cases.extend(loads.iter().map(|l| l.case.clone()));
        }
        for loads in self.member_point_loads.values() {
            cases.extend(loads.iter().map(|l| l.case.clone()));
        }
        for loads in self.member_dist_loads.values() {
            cases.extend(loads.iter().map(|l| l.case.clone()));
        }
        for loads in self.plate_loads.values() {
            cases.extend(loads.iter().map(|l| l.case.clone()));
        }
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadDirection;
    use approx::assert_relative_eq;

    #[test]
    fn test_simple_cantilever() {
        let mut model = Model::new();

        model.add_material("Steel", Material::steel()).unwrap();
        model
            .add_section("Section1", Section::rectangular(0.3, 0.5))
            .unwrap();

        model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node("N2", Node::new(10.0, 0.0, 0.0)).unwrap();

        model
            .add_member("M1", Member::new("N1", "N2", "Steel", "Section1"))
            .unwrap();
        model.add_support("N1", Support::fixed()).unwrap();
        model
            .add_node_load("N2", NodeLoad::fy(-10000.0, "Case 1"))
            .unwrap();

        let report = model.analyze_linear().unwrap();
        assert!(report.all_converged());

        let disp = model.node_displacement("N2", "Combo 1").unwrap();
        assert!(disp.dy < 0.0, "expected downward tip displacement");

        let rxn = model.node_reactions("N1", "Combo 1").unwrap();
        assert_relative_eq!(rxn.fy, 10000.0, epsilon = 1.0);
    }

    #[test]
    fn test_mutation_invalidates_results() {
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
            .add_node_load("N2", NodeLoad::fy(-1000.0, "Case 1"))
            .unwrap();

        model.analyze_linear().unwrap();
        assert!(model.is_analyzed());

        model.add_node("N3", Node::new(10.0, 0.0, 0.0)).unwrap();
        assert!(!model.is_analyzed());
        assert!(matches!(
            model.node_displacement("N2", "Combo 1"),
            Err(FrameError::NotAnalyzed(_))
        ));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut model = Model::new();
        model.add_material("Steel", Material::steel()).unwrap();
        model
            .add_section("S", Section::rectangular(0.2, 0.2))
            .unwrap();
        model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();

        let result = model.add_member("M1", Member::new("N1", "Nowhere", "Steel", "S"));
        assert!(matches!(result, Err(FrameError::NodeNotFound(_))));
    }

    #[test]
    fn test_combination_with_unknown_case_rejected() {
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
            .add_node_load("N2", NodeLoad::fy(-1000.0, "Dead"))
            .unwrap();
        model
            .add_load_combo(LoadCombination::new("C").with_case("Phantom", 1.0))
            .unwrap();

        let result = model.analyze_linear();
        assert!(matches!(result, Err(FrameError::LoadCaseNotFound(_))));
    }

    #[test]
    fn test_member_dist_load_fer() {
        // Propped cantilever sanity: uniform load on a fixed-fixed beam
        // produces the textbook end moments wL^2/12
        let mut model = Model::new();
        model.add_material("Steel", Material::steel()).unwrap();
        model
            .add_section("S", Section::rectangular(0.3, 0.5))
            .unwrap();
        model.add_node("N1", Node::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node("N2", Node::new(8.0, 0.0, 0.0)).unwrap();
        model
            .add_member("M1", Member::new("N1", "N2", "Steel", "S"))
            .unwrap();
        model.add_support("N1", Support::fixed()).unwrap();
        model.add_support("N2", Support::fixed()).unwrap();
        model
            .add_member_dist_load(
                "M1",
                DistributedLoad::uniform(-5000.0, LoadDirection::Fy, "Case 1"),
            )
            .unwrap();

        model.analyze_linear().unwrap();

        let rxn1 = model.node_reactions("N1", "Combo 1").unwrap();
        let rxn2 = model.node_reactions("N2", "Combo 1").unwrap();
        assert_relative_eq!(rxn1.fy, 5000.0 * 8.0 / 2.0, max_relative = 1e-9);
        assert_relative_eq!(rxn2.fy, 5000.0 * 8.0 / 2.0, max_relative = 1e-9);
        assert_relative_eq!(rxn1.mz, 5000.0 * 8.0 * 8.0 / 12.0, max_relative = 1e-9);
        assert_relative_eq!(rxn2.mz, -5000.0 * 8.0 * 8.0 / 12.0, max_relative = 1e-9);
    }
}
