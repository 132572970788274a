use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host has not provisioned this capability yet (e.g. the embedded
    /// player surface is still initializing).
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
