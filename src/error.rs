use thiserror::Error;

/// Errors surfaced by the unit of work and its collaborators.
///
/// Store-originated failures are never translated: concurrency conflicts keep
/// their version information so callers can reload and retry at the business
/// level, and infrastructure failures pass through as [`UowError::Store`].
#[derive(Error, Debug)]
pub enum UowError {
    #[error("aggregate `{aggregate_id}` of type `{aggregate_type}` is already tracked in this session")]
    AlreadyTracked {
        aggregate_type: String,
        aggregate_id: String,
    },

    #[error("aggregate type not supported: expected `{expected}`, got `{actual}`")]
    UnsupportedAggregateType { expected: String, actual: String },

    #[error("change type not supported by this change mapper: {change}")]
    UnsupportedChangeType { change: String },

    #[error("no stream exists for aggregate `{aggregate_id}` of type `{aggregate_type}`")]
    StreamNotFound {
        aggregate_type: String,
        aggregate_id: String,
    },

    #[error("concurrency conflict on aggregate `{aggregate_id}` of type `{aggregate_type}`: expected version {expected}, found {actual}")]
    Concurrency {
        aggregate_type: String,
        aggregate_id: String,
        expected: i64,
        actual: i64,
    },

    #[error("event store operation failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// Result alias within the library.
pub type Result<T, E = UowError> = std::result::Result<T, E>;
