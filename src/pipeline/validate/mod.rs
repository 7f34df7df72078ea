//! Demographic-aware validation stage: reference-range table, unit
//! conversion, and the validator that classifies merged records.

pub mod ranges;
pub mod units;
pub mod validator;

pub use ranges::ReferenceTable;
pub use validator::Validator;

#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("Failed to read reference table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid reference table: {0}")]
    Table(#[source] serde_json::Error),
}
