//! Error types for knob parsing and path handling.

/// Errors raised while building or reshaping a knob space.
#[derive(Debug, thiserror::Error)]
pub enum KnobError {
    /// A value above the requested depth is not a mapping.
    #[error("expected a mapping at `{path}` (level {level} of {depth})")]
    NotAMapping {
        path: String,
        level: usize,
        depth: usize,
    },

    /// A key segment is empty or contains the path separator.
    #[error("invalid key segment `{segment}` under `{path}`")]
    InvalidSegment { path: String, segment: String },

    /// One path is a strict prefix of another, so both cannot be placed in a tree.
    #[error("knob path `{path}` collides with `{other}`")]
    PathCollision { path: String, other: String },

    /// A knob path does not have the `function.operator.parameter` shape.
    #[error("malformed knob path `{0}`: expected function.operator.parameter")]
    MalformedPath(String),

    /// A knob declares neither or both of `data_range` and `values`, or an empty domain.
    #[error("invalid knob domain: {0}")]
    InvalidDomain(String),

    /// A knob description could not be decoded.
    #[error("failed to parse knob `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Only integer knobs can be searched.
    #[error("knob `{path}` has unsupported data type `{data_type}` (only `int` is supported)")]
    UnsupportedDataType { path: String, data_type: String },

    /// A knob could not be written back out.
    #[error("failed to encode knob `{path}`: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
