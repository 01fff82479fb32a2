//! Error types for casewise operations.
//!
//! This module provides the error hierarchy using `thiserror` for every
//! stage of the pipeline: text extraction, chunking, prompt composition,
//! provider dispatch, file I/O and CLI commands.
//!
//! No error in this crate is fatal to a session. Extraction and chunking
//! errors affect a single document, provider errors a single provider
//! response; everything is reported with a [`Error::kind`] and a message.

use thiserror::Error;

/// Result type alias for casewise operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Text extraction errors (unsupported or corrupt documents).
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Chunking errors (invalid window parameters).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Prompt composition errors.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// A single provider's failure.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Returns a stable, machine-readable name for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Extraction(ExtractionError::UnsupportedFormat { .. }) => "unsupported_format",
            Self::Extraction(ExtractionError::ExtractionFailure { .. }) => "extraction_failure",
            Self::Chunking(_) => "invalid_chunk_parameters",
            Self::Prompt(PromptError::EmptyQuery) => "empty_query",
            Self::Prompt(_) => "prompt",
            Self::Provider(_) => "provider_error",
            Self::Io(_) => "io",
            Self::Command(_) => "command",
            Self::Config { .. } => "config",
        }
    }

    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Errors raised while turning uploaded bytes into text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The declared format is not one this build can read.
    #[error("unsupported format: {format}")]
    UnsupportedFormat {
        /// The declared format or file extension.
        format: String,
    },

    /// The document could not be parsed.
    #[error("failed to extract {format} text: {reason}")]
    ExtractionFailure {
        /// Format the document was parsed as.
        format: String,
        /// Reason for failure.
        reason: String,
    },
}

impl ExtractionError {
    /// Creates an [`ExtractionError::ExtractionFailure`].
    pub fn failure(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::ExtractionFailure {
            format: format.into(),
            reason: reason.to_string(),
        }
    }
}

/// Chunking-specific errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Window parameters that cannot make progress.
    #[error("invalid chunk parameters: {reason}")]
    InvalidChunkParameters {
        /// Reason the parameters are invalid.
        reason: String,
    },
}

impl ChunkingError {
    pub(crate) fn invalid(chunk_size: usize, overlap: usize) -> Self {
        let reason = if chunk_size == 0 {
            "chunk size must be > 0".to_string()
        } else {
            format!("overlap {overlap} must be less than chunk size {chunk_size}")
        };
        Self::InvalidChunkParameters { reason }
    }
}

/// Prompt composition errors.
#[derive(Error, Debug)]
pub enum PromptError {
    /// The query text is blank after trimming whitespace.
    #[error("query is empty")]
    EmptyQuery,

    /// Unknown query kind name.
    #[error("unknown query kind: {name}")]
    UnknownKind {
        /// Name that was not recognized.
        name: String,
    },

    /// Failed to read or write a template file.
    #[error("template {path}: {reason}")]
    Template {
        /// Template path.
        path: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Failure of a single provider call.
///
/// Captured per provider by the dispatcher, never escalated to abort a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No API key configured for the provider.
    #[error("no API key configured for {provider}")]
    MissingCredential {
        /// Provider name.
        provider: String,
    },

    /// The provider rejected the credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limit or quota exhausted.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not finish in time.
    #[error("request timed out after {seconds}s")]
    Timeout {
        /// Timeout in seconds.
        seconds: u64,
    },

    /// The response could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other API error status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code (0 when unknown).
        status: u16,
        /// Error message returned by the provider.
        message: String,
    },

    /// Unknown provider name.
    #[error("unknown provider: {name}")]
    UnknownProvider {
        /// Name that was not recognized.
        name: String,
    },
}

impl ProviderError {
    /// Returns a stable name for the failure category.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::Auth(_) => "auth",
            Self::Quota(_) => "quota",
            Self::Network(_) => "network",
            Self::Timeout { .. } => "timeout",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Api { .. } => "api",
            Self::UnknownProvider { .. } => "unknown_provider",
        }
    }

    /// Classifies an HTTP error status returned by a provider.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Auth(message),
            429 => Self::Quota(message),
            _ => Self::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<async_openai::error::OpenAIError> for ProviderError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;

        match err {
            OpenAIError::ApiError(api) => {
                let code = api.code.as_ref().map(ToString::to_string).unwrap_or_default();
                let kind = api.r#type.as_deref().unwrap_or_default();
                if code.contains("invalid_api_key") || kind == "authentication_error" {
                    Self::Auth(api.message)
                } else if code.contains("insufficient_quota")
                    || code.contains("rate_limit_exceeded")
                    || kind == "insufficient_quota"
                {
                    Self::Quota(api.message)
                } else {
                    Self::Api {
                        status: 0,
                        message: api.message,
                    }
                }
            }
            OpenAIError::Reqwest(e) => e.into(),
            OpenAIError::JSONDeserialize(e) => Self::MalformedResponse(e.to_string()),
            other => Self::Api {
                status: 0,
                message: other.to_string(),
            },
        }
    }
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_display() {
        let err = ExtractionError::UnsupportedFormat {
            format: "xlsx".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported format: xlsx");

        let err = ExtractionError::failure("docx", "missing word/document.xml");
        assert_eq!(
            err.to_string(),
            "failed to extract docx text: missing word/document.xml"
        );
    }

    #[test]
    fn test_chunking_error_reasons() {
        let err = ChunkingError::invalid(0, 0);
        assert!(err.to_string().contains("chunk size must be > 0"));

        let err = ChunkingError::invalid(50, 100);
        assert_eq!(
            err.to_string(),
            "invalid chunk parameters: overlap 100 must be less than chunk size 50"
        );
    }

    #[test]
    fn test_error_kinds() {
        let err: Error = ExtractionError::UnsupportedFormat {
            format: "xlsx".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "unsupported_format");

        let err: Error = ExtractionError::failure("pdf", "corrupt").into();
        assert_eq!(err.kind(), "extraction_failure");

        let err: Error = ChunkingError::invalid(10, 10).into();
        assert_eq!(err.kind(), "invalid_chunk_parameters");

        let err: Error = PromptError::EmptyQuery.into();
        assert_eq!(err.kind(), "empty_query");

        let err: Error = ProviderError::Quota("slow down".to_string()).into();
        assert_eq!(err.kind(), "provider_error");

        assert_eq!(Error::config("bad").kind(), "config");
    }

    #[test]
    fn test_provider_error_from_status() {
        assert!(matches!(
            ProviderError::from_status(401, "bad key".to_string()),
            ProviderError::Auth(_)
        ));
        assert!(matches!(
            ProviderError::from_status(403, "forbidden".to_string()),
            ProviderError::Auth(_)
        ));
        assert!(matches!(
            ProviderError::from_status(429, "slow down".to_string()),
            ProviderError::Quota(_)
        ));
        assert_eq!(
            ProviderError::from_status(500, "boom".to_string()),
            ProviderError::Api {
                status: 500,
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_provider_error_categories() {
        let err = ProviderError::MissingCredential {
            provider: "claude".to_string(),
        };
        assert_eq!(err.category(), "missing_credential");
        assert_eq!(err.to_string(), "no API key configured for claude");

        assert_eq!(ProviderError::Timeout { seconds: 5 }.category(), "timeout");
        assert_eq!(
            ProviderError::MalformedResponse("no choices".to_string()).category(),
            "malformed_response"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_error_config_display() {
        let err = Error::config("temperature must be between 0.0 and 2.0");
        assert_eq!(
            err.to_string(),
            "configuration error: temperature must be between 0.0 and 2.0"
        );
    }
}
