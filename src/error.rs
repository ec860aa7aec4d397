//! Error types for frame3d

use thiserror::Error;

/// Main error type for model construction and analysis
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Node '{0}' not found in model")]
    NodeNotFound(String),

    #[error("Member '{0}' not found in model")]
    MemberNotFound(String),

    #[error("Spring '{0}' not found in model")]
    SpringNotFound(String),

    #[error("Material '{0}' not found in model")]
    MaterialNotFound(String),

    #[error("Section '{0}' not found in model")]
    SectionNotFound(String),

    #[error("Plate '{0}' not found in model")]
    PlateNotFound(String),

    #[error("Load combination '{0}' not found in model")]
    LoadCombinationNotFound(String),

    #[error("Load case '{0}' not found in model")]
    LoadCaseNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Singular or near-singular free-free partition. `details` names the
    /// nodes/DOFs implicated so a disconnected or under-restrained structure
    /// can be diagnosed.
    #[error("Model is unstable for combination '{combo}': {details}")]
    Unstable { combo: String, details: String },

    /// The activation toggle loop or P-Delta loop hit the iteration cap.
    /// `toggling` is the last known set of elements still changing state.
    #[error(
        "Combination '{combo}' failed to converge after {iterations} iterations \
         (still toggling: {toggling:?})"
    )]
    Nonconvergence {
        combo: String,
        iterations: usize,
        toggling: Vec<String>,
    },

    #[error("No results for combination '{0}' - run analyze() first")]
    NotAnalyzed(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FrameError {
    /// True for errors raised while defining the model (bad references,
    /// malformed geometry) as opposed to failures of a solve.
    pub fn is_definition_error(&self) -> bool {
        !matches!(
            self,
            FrameError::Unstable { .. }
                | FrameError::Nonconvergence { .. }
                | FrameError::NotAnalyzed(_)
                | FrameError::AnalysisFailed(_)
        )
    }
}

/// Result type for frame3d operations
pub type FrameResult<T> = Result<T, FrameError>;
