use deskenum_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("request failed: {0}")]
    Client(#[from] ClientError),

    #[error("search reported errors: {}", .0.join("; "))]
    Application(Vec<String>),

    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("enumeration cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
