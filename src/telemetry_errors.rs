use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("No adapter available for file: {0}")]
    AdapterNotFound(String),

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported time format: {0}")]
    UnsupportedTimeFormat(String),

    #[error("Unable to perform file operation: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),
}

impl PartialEq for TelemetryError {
    fn eq(&self, other: &Self) -> bool {
        use TelemetryError::*;
        match (self, other) {
            (AdapterNotFound(a), AdapterNotFound(b)) => a == b,
            (MalformedHeader(a), MalformedHeader(b)) => a == b,
            (UnsupportedTimeFormat(a), UnsupportedTimeFormat(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (RunNotFound(a), RunNotFound(b)) => a == b,

            // io::Error is not comparable: same variant means equal
            (IoFailure(_), IoFailure(_)) => true,

            _ => false,
        }
    }
}
