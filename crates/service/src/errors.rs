use thiserror::Error;

/// Business-rule violations raised by the ledger. None of them are transient,
/// so callers report them rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("account id {0} already exists")]
    DuplicateKey(String),
    #[error("account {0} does not exist")]
    AccountNotFound(String),
    #[error("account {0} does not have enough balance for this transfer")]
    InsufficientFunds(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    /// Stable code for error bodies, logs and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::DuplicateKey(_) => "duplicate_account",
            ServiceError::AccountNotFound(_) => "account_not_found",
            ServiceError::InsufficientFunds(_) => "insufficient_funds",
        }
    }
}
