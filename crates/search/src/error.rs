//! Error types for parameter space declaration.

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The declared space has no parameters.
    #[error("cannot search an empty parameter space")]
    EmptySpace,

    /// A parameter admits no value.
    #[error("parameter `{0}` has no admissible value")]
    EmptyParameter(String),

    /// Two parameters share a name.
    #[error("parameter `{0}` declared twice")]
    DuplicateParameter(String),
}
