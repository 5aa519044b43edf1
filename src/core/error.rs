//! Error taxonomy for the analytics engine
//!
//! Transport and parse-job failures are caught where the request was issued and
//! reported as scoped notices. Validation failures are raised before any request
//! goes out and block the action.

use thiserror::Error;

/// Network or HTTP failure talking to the parsing service
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {detail}")]
    Status {
        url: String,
        status: u16,
        detail: String,
    },

    #[error("Unexpected response body from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid service URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The service reported a failed parse job
#[derive(Debug, Error)]
#[error("Parse job {job_id} failed: {message}")]
pub struct ParseJobError {
    pub job_id: String,
    pub message: String,
}

/// An action rejected before any request was issued
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Cannot select more than {max} tests ({requested} requested)")]
    SelectionCap { requested: usize, max: usize },

    #[error("Nothing to export: the selected tests have no results")]
    EmptyExport,

    #[error("Cannot merge {other_file} with {first_file}: program '{other}' differs from '{first}'")]
    IdentityMismatch {
        first_file: String,
        first: String,
        other_file: String,
        other: String,
    },

    #[error("Test {0} is not in the loaded catalog")]
    UnknownTest(u32),

    #[error("No files given")]
    NoFiles,

    #[error("Unsupported file type: {0} (expected .stdf or .std)")]
    UnsupportedFile(String),
}

/// Any failure surfaced by the engine
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    ParseJob(#[from] ParseJobError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::SelectionCap {
            requested: 9,
            max: 8,
        };
        assert_eq!(err.to_string(), "Cannot select more than 8 tests (9 requested)");

        let err = AnalyticsError::from(ValidationError::UnknownTest(42));
        assert_eq!(err.to_string(), "Test 42 is not in the loaded catalog");
    }

    #[test]
    fn test_parse_job_message() {
        let err = ParseJobError {
            job_id: "abc".to_string(),
            message: "truncated record".to_string(),
        };
        assert_eq!(err.to_string(), "Parse job abc failed: truncated record");
    }
}
