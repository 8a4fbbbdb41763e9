use thiserror::Error;

/// Fatal, non-recoverable error kinds for the scheduling core.
///
/// `EmptyPlan` and `SolverDegenerate` from the design are intentionally NOT
/// variants here: per the error-handling policy they are success-path
/// outcomes surfaced as `DebugEntry`s in a stage's output, not failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input payload could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("input payload is not valid JSON: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("order {order_id} is missing required field: {field}")]
    MissingRequired { order_id: String, field: String },

    #[error("operation {op_id} on order {order_id} has non-positive duration: {duration}")]
    InvalidDuration { order_id: String, op_id: String, duration: f64 },

    #[error("unknown station id: {0}")]
    UnknownStation(String),

    #[error("variant {variant_id} on order {order_id} maps to zero executable operations")]
    EmptyVariantMapping { order_id: String, variant_id: String },

    #[error("failed to build internal domain model: {0}")]
    ModelConstruction(String),
}

pub type Result<T> = std::result::Result<T, Error>;
