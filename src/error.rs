use crate::scene::NodeId;

/// Failures that abort a curve construction or a whole bind.
///
/// Recoverable problems (unresolvable pipe ids, unknown interpolation orders,
/// degenerate trajectory runs) are logged and skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("curve input contains a non-finite coordinate")]
    NonFiniteInput,

    #[error("tessellation tolerance is NaN")]
    NanTolerance,

    #[error("explicit pipe from node {from} to node {to} has no path data")]
    MissingExplicitPath { from: NodeId, to: NodeId },

    #[error("curve needs at least 2 control points, got {0}")]
    TooFewPoints(usize),

    #[error("curve has {times} knots but {points} control points")]
    MismatchedKnots { times: usize, points: usize },

    #[error("curve knots must be strictly increasing")]
    UnorderedKnots,

    #[error("node {0} is not part of the bound tree")]
    UnknownNode(NodeId),

    #[error("pipe {0} is not part of the bound tree")]
    UnknownPipe(usize),

    #[error("arc endpoints have no defined great-circle midpoint")]
    DegenerateArc,

    #[error("event received before a dataset was bound")]
    NotBound,

    #[error("data provider failed: {0}")]
    Provider(String),

    #[error("invalid dataset: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
