use crate::domain::household::CorrelationKey;
use thiserror::Error;

/// Structural or value problem with a submitted household payload.
///
/// Reported synchronously to the submitter. Never stored, never retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("id is required")]
    MissingKey,
    #[error("id must not contain '/', '+' or '#'")]
    InvalidKey,
    #[error("Invalid familyComposition")]
    InvalidComposition,
    #[error("Invalid numberOfChildren")]
    InvalidChildCount,
    #[error("Invalid familyUnitInPayForDecember")]
    InvalidEligibilityFlag,
}

#[derive(Error, Debug)]
pub enum SupplementError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("correlation key `{0}` has already been submitted")]
    DuplicateKey(CorrelationKey),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("computation error: {0}")]
    Computation(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SupplementError>;
