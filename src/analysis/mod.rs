//! Analysis types and options

use serde::{Deserialize, Serialize};

pub(crate) mod assemble;
pub(crate) mod context;
pub(crate) mod iterate;
pub(crate) mod loads;
pub(crate) mod solve;

/// Type of structural analysis to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalysisType {
    /// First-order static analysis (with tension/compression-only iteration
    /// when the model contains direction-dependent elements)
    #[default]
    Linear,
    /// Second-order P-Delta analysis
    PDelta,
}

/// Options for structural analysis.
///
/// The iteration cap and convergence tolerance are policy choices, not
/// structural constants; the defaults are conservative and validated against
/// the textbook-problem test suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Type of analysis
    pub analysis_type: AnalysisType,
    /// Check static equilibrium of each converged combination and log the
    /// imbalance
    pub check_statics: bool,
    /// Maximum iterations for the activation toggle loop and for the
    /// P-Delta outer loop
    pub max_iterations: usize,
    /// Relative convergence tolerance on the change in maximum nodal
    /// displacement between consecutive P-Delta iterations
    pub tolerance: f64,
    /// Solve the reduced system iteratively (CSR + preconditioned CG)
    /// instead of by dense factorization; pays off for large models
    pub sparse: bool,
    /// Load combination tags to analyze (None = all combinations)
    pub combo_tags: Option<Vec<String>>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::Linear,
            check_statics: false,
            max_iterations: 30,
            tolerance: 1e-6,
            sparse: false,
            combo_tags: None,
        }
    }
}

impl AnalysisOptions {
    /// Create options for linear analysis
    pub fn linear() -> Self {
        Self::default()
    }

    /// Create options for P-Delta analysis
    pub fn p_delta() -> Self {
        Self {
            analysis_type: AnalysisType::PDelta,
            ..Self::default()
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Enable the statics check
    pub fn with_statics_check(mut self) -> Self {
        self.check_statics = true;
        self
    }

    /// Use the sparse iterative solver
    pub fn with_sparse_solver(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Filter by combo tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.combo_tags = Some(tags);
        self
    }
}
