use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The record cannot be used at all (no usable code, missing required
    /// fields). Not retried; callers skip the record or abort per policy.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A code from the interpretation value set that is not in the
    /// recognized subset. Codes from other value sets are ignored instead.
    #[error("unsupported interpretation code '{0}'")]
    UnsupportedInterpretation(String),

    /// The record carries no quantity, qualitative result, interpretation,
    /// or nested components: nothing to chart.
    #[error("observation carries no value, interpretation, or components")]
    EmptyObservation,

    #[error("malformed record JSON: {0}")]
    Json(#[from] serde_json::Error),
}
