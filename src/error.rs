use std::result::Result as StdResult;
use thiserror::Error;
use std::io;

#[derive(Debug, Error)]
pub enum Error {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("API invalid format: {0}")]
    ApiInvalidFormat(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("WebSocket error: {0}")]
    WebSocketError(String),
    #[error("Upload error: {0}")]
    UploadError(String),
    #[error("Solana RPC error: {0}")]
    SolanaRpcError(String),
    #[error("Account does not exist: {0}")]
    AccountNotFound(String),
    #[error("Invalid account discriminator for {0}")]
    AccountDiscriminatorMismatch(String),
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl Error {
    /// True for the errors a protocol client reports when the address does not
    /// hold an account of the expected program.
    pub fn is_missing_account(&self) -> bool {
        matches!(
            self,
            Error::AccountNotFound(_) | Error::AccountDiscriminatorMismatch(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ApiInvalidFormat(err.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocketError(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl From<solana_client::client_error::ClientError> for Error {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Error::SolanaRpcError(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::InternalError(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::InternalError(err.to_string())
    }
}

pub type Result<T> = StdResult<T, Error>;
