use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Coarse classification used by callers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or disallowed input, correctable by the user.
    Validation,
    /// The inference service failed or returned unusable output.
    UpstreamService,
    /// A collaborator such as the profile store is unavailable.
    ServiceUnavailable,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No file provided")]
    NoFile,

    #[error("Invalid file extension '{extension}'. Allowed: {allowed}")]
    InvalidExtension { extension: String, allowed: String },

    #[error("Invalid MIME type '{mime_type}'. Allowed: {allowed}")]
    InvalidMimeType { mime_type: String, allowed: String },

    #[error("File size {size_mb:.2}MB exceeds limit of {limit_mb}MB")]
    FileTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("Invalid filename")]
    InvalidFilename,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NoFile => "NO_FILE",
            ValidationError::InvalidExtension { .. } => "INVALID_EXTENSION",
            ValidationError::InvalidMimeType { .. } => "INVALID_MIME_TYPE",
            ValidationError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ValidationError::InvalidFilename => "INVALID_FILENAME",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("No valid JSON found in model response")]
    NoJson,

    #[error("Failed to parse JSON: {message}")]
    InvalidJson { message: String, excerpt: String },

    #[error("Invalid response structure: {reason}")]
    InvalidStructure { reason: String },
}

impl ExtractionError {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionError::NoJson => "NO_JSON",
            ExtractionError::InvalidJson { .. } => "INVALID_JSON",
            ExtractionError::InvalidStructure { .. } => "INVALID_STRUCTURE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationErrorKind {
    Timeout,
    ConnectionReset,
    NameResolution,
    RateLimited,
    /// Non-success HTTP status other than rate limiting.
    Upstream(u16),
    EmptyResponse,
    Transport,
}

/// Message fragments that mark an untyped transport failure as transient.
const RETRYABLE_MESSAGES: [&str; 5] = [
    "timeout",
    "econnreset",
    "enotfound",
    "etimedout",
    "rate limit exceeded",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvocationError {
    pub kind: InvocationErrorKind,
    pub message: String,
}

impl InvocationError {
    pub fn new(kind: InvocationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(operation: &str, after: std::time::Duration) -> Self {
        Self::new(
            InvocationErrorKind::Timeout,
            format!("{operation} timeout after {}ms", after.as_millis()),
        )
    }

    /// Builds an error from a free-form transport message, picking the kind
    /// from the known transient signatures.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        let kind = if lower.contains("econnreset") || lower.contains("connection reset") {
            InvocationErrorKind::ConnectionReset
        } else if lower.contains("enotfound") || lower.contains("dns") {
            InvocationErrorKind::NameResolution
        } else if lower.contains("rate limit") {
            InvocationErrorKind::RateLimited
        } else if lower.contains("timeout") || lower.contains("etimedout") {
            InvocationErrorKind::Timeout
        } else {
            InvocationErrorKind::Transport
        };

        Self { kind, message }
    }

    pub fn is_retryable(&self) -> bool {
        match self.kind {
            InvocationErrorKind::Timeout
            | InvocationErrorKind::ConnectionReset
            | InvocationErrorKind::NameResolution
            | InvocationErrorKind::RateLimited => true,
            InvocationErrorKind::Upstream(_) | InvocationErrorKind::EmptyResponse => false,
            InvocationErrorKind::Transport => {
                let lower = self.message.to_lowercase();
                RETRYABLE_MESSAGES.iter().any(|m| lower.contains(m))
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            InvocationErrorKind::Timeout => "REQUEST_TIMEOUT",
            InvocationErrorKind::ConnectionReset => "CONNECTION_RESET",
            InvocationErrorKind::NameResolution => "NAME_RESOLUTION",
            InvocationErrorKind::RateLimited => "RATE_LIMITED",
            InvocationErrorKind::Upstream(_) => "UPSTREAM_ERROR",
            InvocationErrorKind::EmptyResponse => "EMPTY_RESPONSE",
            InvocationErrorKind::Transport => "TRANSPORT_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("Failed to fetch user health conditions: {0}")]
    Database(String),

    #[error("{message}")]
    Processing { code: &'static str, message: String },
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(e) => e.code(),
            CoreError::Extraction(e) => e.code(),
            CoreError::Invocation(e) => e.code(),
            CoreError::Database(_) => "USER_HEALTH_FETCH_ERROR",
            CoreError::Processing { code, .. } => *code,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Extraction(_) | CoreError::Invocation(_) => ErrorKind::UpstreamService,
            CoreError::Database(_) => ErrorKind::ServiceUnavailable,
            CoreError::Processing { .. } => ErrorKind::Internal,
        }
    }

    /// Name of the failure family, reported next to the code.
    pub fn type_name(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "ValidationError",
            CoreError::Extraction(_) => "ExtractionError",
            CoreError::Invocation(_) => "InvocationError",
            CoreError::Database(_) => "DatabaseError",
            CoreError::Processing { .. } => "ProcessingError",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Invocation(e) if e.is_retryable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(InvocationError::new(InvocationErrorKind::Timeout, "t").is_retryable());
        assert!(InvocationError::new(InvocationErrorKind::RateLimited, "r").is_retryable());
        assert!(!InvocationError::new(InvocationErrorKind::Upstream(400), "bad").is_retryable());
        assert!(!InvocationError::new(InvocationErrorKind::EmptyResponse, "e").is_retryable());
    }

    #[test]
    fn test_from_message_classification() {
        let err = InvocationError::from_message("read ECONNRESET");
        assert_eq!(err.kind, InvocationErrorKind::ConnectionReset);
        assert!(err.is_retryable());

        let err = InvocationError::from_message("getaddrinfo ENOTFOUND example.org");
        assert_eq!(err.kind, InvocationErrorKind::NameResolution);

        let err = InvocationError::from_message("Rate limit exceeded");
        assert_eq!(err.kind, InvocationErrorKind::RateLimited);

        let err = InvocationError::from_message("certificate rejected");
        assert_eq!(err.kind, InvocationErrorKind::Transport);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_core_error_codes_and_kinds() {
        let err = CoreError::from(ValidationError::NoFile);
        assert_eq!(err.code(), "NO_FILE");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = CoreError::from(ExtractionError::NoJson);
        assert_eq!(err.code(), "NO_JSON");
        assert_eq!(err.kind(), ErrorKind::UpstreamService);

        let err = CoreError::Database("connection refused".to_string());
        assert_eq!(err.code(), "USER_HEALTH_FETCH_ERROR");
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(!err.is_retryable());
    }
}
