use thiserror::Error;

/// One violated cross-graph-link cycle, reported by
/// [`crate::ir::graph_set::GraphSet::check_acyclic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Graph names along the cycle, in traversal order.
    pub graphs: Vec<String>,
}

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.graphs.join(" -> "))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    #[error("recursion detected: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    RecursionDetected(Vec<Cycle>),

    /// Indicates a compiler bug rather than bad input.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::UnsupportedConstruct(what.into())
    }

    pub(crate) fn invariant(what: impl Into<String>) -> Self {
        Self::InternalInvariant(what.into())
    }

    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Self::MalformedInput(what.into())
    }
}
