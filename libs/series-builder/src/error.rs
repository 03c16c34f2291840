use flowsheet_models::GroupError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The requested axis could not form a homogeneous code group (mixed
    /// coding systems, or no recognized codes). Raised at group
    /// construction, before any fetch is attempted.
    #[error(transparent)]
    MixedCodeTypes(#[from] GroupError),

    /// An observation set mixes qualitative and quantitative results, so
    /// neither the discrete nor the continuous path can represent it.
    #[error("observation sets mix qualitative and quantitative results")]
    MixedValueKind,

    /// Members of one set disagree on a non-null normal range.
    #[error("observations disagree on the normal range")]
    InconsistentRange,

    /// Member orders of one order set disagree on the dose unit.
    #[error("medication orders disagree on the dose unit: '{0}' vs '{1}'")]
    InconsistentUnit(String, String),

    /// A fetch failed; the source's own error is passed through unchanged.
    #[error(transparent)]
    Source(crate::source::SourceError),
}
