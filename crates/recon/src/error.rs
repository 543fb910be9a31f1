use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad threshold, missing column mapping, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A canonicalization rule did not compile into a pattern.
    #[error("invalid canonical rule '{pattern}': {message}")]
    InvalidRule { pattern: String, message: String },
    /// A required input catalog is not available. Fatal.
    #[error("catalog '{catalog}': input not found at {}", path.display())]
    MissingInput { catalog: String, path: PathBuf },
    /// Missing mapped column in a CSV header.
    #[error("catalog '{catalog}': missing column '{column}'")]
    MissingColumn { catalog: String, column: String },
    /// `street_id` appeared twice within one catalog load.
    #[error("catalog '{catalog}': duplicate street_id '{street_id}'")]
    DuplicateStreetId { catalog: String, street_id: String },
    #[error("catalog '{catalog}': CSV error: {message}")]
    Csv { catalog: String, message: String },
    #[error("catalog '{catalog}': JSON error: {message}")]
    Json { catalog: String, message: String },
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
    /// Output buckets do not account for every input record.
    #[error("{strategy} strategy: record accounting failed: {detail}")]
    Accounting { strategy: String, detail: String },
}
