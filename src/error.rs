use std::path::PathBuf;

use thiserror::Error;

/// Conditions that abort the run before anything is rendered.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("policy file {} is required but does not exist", .0.display())]
    MissingPolicy(PathBuf),
    #[error("policy evaluation is required but no allowed-licenses file is configured")]
    PolicyNotConfigured,
    #[error("no dependencies resolved for requested scope(s): {}", .0.join(", "))]
    NoDependencies(Vec<String>),
    #[error("dependency list {} does not exist", .0.display())]
    MissingInput(PathBuf),
}

/// Failure of a single renderer; siblings are unaffected.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("renderer panicked: {0}")]
    Panicked(String),
}
