//! Custom error types for the advisor pipeline

use thiserror::Error;

/// Per-provider translation failure. Always absorbed by the provider chain.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// API request failed
    #[error("API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Rate limit or quota exceeded
    #[error("Quota exceeded")]
    QuotaExceededError,

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Provider answered with nothing
    #[error("Empty translation returned")]
    EmptyResponse,

    /// Request timeout
    #[error("Request timeout")]
    TimeoutError,

    /// Provider used as backend failed
    #[error("LLM backend error: {0}")]
    LlmBackend(#[from] LlmError),
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslationError::TimeoutError
        } else {
            TranslationError::NetworkError {
                message: err.without_url().to_string(),
            }
        }
    }
}

/// LLM completion failure. Fatal for the request.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Missing credentials
    #[error("LLM API key is not configured")]
    MissingApiKey,

    /// API returned an error status
    #[error("LLM API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Quota exhausted upstream
    #[error("LLM quota exceeded")]
    QuotaExceeded,

    /// Transport failure
    #[error("LLM transport error: {message}")]
    Transport {
        message: String,
    },

    /// Call exceeded its deadline
    #[error("LLM request timeout")]
    Timeout,

    /// No usable text in the response
    #[error("LLM returned no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport {
                message: err.without_url().to_string(),
            }
        }
    }
}

/// Document extraction errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// File does not exist
    #[error("File not found: {path}")]
    NotFound {
        path: String,
    },

    /// Format we cannot read
    #[error("Unsupported document format: {format}")]
    UnsupportedFormat {
        format: String,
    },

    /// Upload exceeds size ceiling
    #[error("Document too large: {size} bytes (max {max})")]
    TooLarge {
        size: u64,
        max: u64,
    },

    /// Text is not valid UTF-8
    #[error("Document is not valid UTF-8")]
    Encoding,

    /// Broken docx or PDF container
    #[error("Corrupt document: {message}")]
    Archive {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<lopdf::Error> for ExtractionError {
    fn from(err: lopdf::Error) -> Self {
        ExtractionError::Archive {
            message: format!("invalid PDF: {}", err),
        }
    }
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(err: zip::result::ZipError) -> Self {
        ExtractionError::Archive {
            message: err.to_string(),
        }
    }
}

/// Fatal error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    ServiceUnavailable,
    DocumentError,
    DailyLimit,
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::BadInput => "bad-input",
            ErrorKind::ServiceUnavailable => "service-unavailable",
            ErrorKind::DocumentError => "document-error",
            ErrorKind::DailyLimit => "daily-limit",
        }
    }
}

/// Hard failures of a question/answer exchange
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Missing or malformed input
    #[error("Bad input: {message}")]
    BadInput {
        message: String,
    },

    /// LLM could not produce an answer
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(#[from] LlmError),

    /// Uploaded document could not be read
    #[error("Document error: {0}")]
    Document(#[from] ExtractionError),

    /// Daily query cap reached
    #[error("Daily query limit of {limit} reached")]
    DailyLimit {
        limit: usize,
    },
}

impl AdvisorError {
    pub fn bad_input(message: impl Into<String>) -> Self {
        AdvisorError::BadInput {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdvisorError::BadInput { .. } => ErrorKind::BadInput,
            AdvisorError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            AdvisorError::Document(_) => ErrorKind::DocumentError,
            AdvisorError::DailyLimit { .. } => ErrorKind::DailyLimit,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Short message safe to show end users. Input problems are echoed since
    /// they describe the user's own request; everything else stays generic.
    pub fn user_message(&self) -> String {
        match self {
            AdvisorError::BadInput { message } => message.clone(),
            AdvisorError::ServiceUnavailable(_) => {
                "The advisor is temporarily unavailable. Please try again later.".to_string()
            }
            AdvisorError::Document(ExtractionError::UnsupportedFormat { .. }) => {
                "This document format is not supported. Please upload a .txt, .md, .docx or .pdf file."
                    .to_string()
            }
            AdvisorError::Document(ExtractionError::TooLarge { .. }) => {
                "The document is too large. Please upload a smaller file.".to_string()
            }
            AdvisorError::Document(ExtractionError::Encoding) => {
                "The document encoding is not supported. Please use UTF-8.".to_string()
            }
            AdvisorError::Document(_) => {
                "The document could not be read. Please try another file.".to_string()
            }
            AdvisorError::DailyLimit { limit } => format!(
                "Daily query limit reached ({} queries). Please try again tomorrow.",
                limit
            ),
        }
    }
}

/// Result type for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;
