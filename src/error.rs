//! Error types for busca-retrabalho
//!
//! Two classes of failure exist in a report run:
//! - fatal errors, returned as [`Error`] and ending the run without writing a report
//! - degraded lookups, which the enrichment resolver absorbs and only reports as events
//!
//! Every fatal variant carries enough context (query parameters, server message)
//! to be shown to the user once.

use thiserror::Error;

/// Result type alias for busca-retrabalho operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when the API rejects a request without a `mensagem` field
pub const MISSING_API_MESSAGE: &str = "A API não enviou uma mensagem de erro, verifique os logs.";

/// Main error type for busca-retrabalho
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "separator")
        key: Option<String>,
    },

    /// Login against the API failed
    #[error("authentication failed: {message}")]
    Auth {
        /// Message sent by the API, or a fallback when none was sent
        message: String,
    },

    /// The API answered with a non-success HTTP status
    #[error("API returned HTTP {status} for {url}: {}", .message.as_deref().unwrap_or(MISSING_API_MESSAGE))]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL, including the query string
        url: String,
        /// `mensagem` field of the error body, if any
        message: Option<String>,
    },

    /// The paginated rework fetch failed; the whole run is aborted
    #[error("failed to fetch rework records with parameters {params}: {source}")]
    Fetch {
        /// Query parameters of the failing page request
        params: String,
        /// Underlying request error
        #[source]
        source: Box<Error>,
    },

    /// No rework record matched the filters
    #[error("no rework records found with parameters {params}")]
    NotFound {
        /// Query parameters of the last page request
        params: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL (host or endpoint path)
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code, used as a structured log field
    pub fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Auth { .. } => "auth_failed",
            Error::Status { .. } => "http_status",
            Error::Fetch { .. } => "fetch_failed",
            Error::NotFound { .. } => "not_found",
            Error::Network(_) => "network_error",
            Error::Url(_) => "invalid_url",
            Error::Serialization(_) => "serialization_error",
            Error::Csv(_) => "csv_error",
            Error::Io(_) => "io_error",
            Error::Other(_) => "internal_error",
        }
    }

    /// Title of the user-facing notification for this error
    pub fn title(&self) -> &'static str {
        match self {
            Error::Auth { .. } => "Erro ao conectar a API",
            Error::Fetch { .. } => "Erro ao buscar retrabalhos",
            Error::NotFound { .. } => "Retrabalho não encontrado",
            Error::Config { .. } => "Configuração inválida",
            _ => "Erro não esperado",
        }
    }

    /// Message the API itself sent, looking through fetch wrappers
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Error::Auth { message } => Some(message),
            Error::Status { message, .. } => message.as_deref(),
            Error::Fetch { source, .. } => source.api_message(),
            _ => None,
        }
    }

    /// Query parameters attached to fetch-stage errors
    pub fn query_params(&self) -> Option<&str> {
        match self {
            Error::Fetch { params, .. } | Error::NotFound { params } => Some(params),
            _ => None,
        }
    }
}
