use thiserror::Error;

/// Errors raised by the key-value stores backing the wallet session
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<&str> for StorageError {
    fn from(s: &str) -> Self {
        StorageError::Unavailable(s.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("A swap is already in flight")]
    SwapInFlight,

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Invalid slippage: {0:?}")]
    InvalidSlippage(String),

    #[error("Transaction controller has been disposed")]
    Disposed,

    #[error("No Tokio runtime available to schedule swap timers")]
    NoRuntime,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, SwapError>;
