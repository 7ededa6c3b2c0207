//! Error types for the compile-measure pipeline.

use knobtune_knobs::KnobError;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors raised while discovering knobs, building or running the program.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A tool could not be started at all.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A tool ran and exited unsuccessfully.
    #[error("stage `{stage}` failed ({status}): {command}\n{output}")]
    ToolFailed {
        stage: String,
        command: String,
        status: ExitStatus,
        output: String,
    },

    /// The optimizer removed the computation the knobs are meant to shape.
    #[error("abnormal optimization result: no multiplication left in `{}` (config: {config})", path.display())]
    Anomaly { path: PathBuf, config: String },

    /// Reading or writing an artifact failed.
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact is not valid JSON.
    #[error("failed to parse `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The extra-definitions file has an unsupported shape or value type.
    #[error("extra definition `{name}` must be an integer or a string, got {found}")]
    InvalidDefinition { name: String, found: String },

    #[error(transparent)]
    Knob(#[from] KnobError),
}

impl PipelineError {
    /// Whether a trial hitting this error can be scored as a failure and the
    /// search continued. Everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::Spawn { .. } | PipelineError::ToolFailed { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
