use crate::token::TokenKey;
use std::io;
use thiserror::Error;

/// Represents all possible errors that can occur when operating on the piece ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The referenced token does not exist in the arena
    #[error("Token not found: {0}")]
    TokenNotFound(TokenKey),

    /// The source account holds fewer pieces than the operation needs.
    /// Surfaced on some compatibility layers as `TokenValueTooLow`.
    #[error("Insufficient balance: held {held}, needed {needed}")]
    InsufficientBalance { held: u128, needed: u128 },

    /// The spender's allowance is lower than the requested amount
    #[error("Approved value too low: approved {approved}, needed {needed}")]
    ApprovedValueTooLow { approved: u128, needed: u128 },

    /// Approval authority is bounded by the caller's own balance
    #[error("Cannot approve more than owned: held {held}, requested {requested}")]
    CantApproveMoreThanOwned { held: u128, requested: u128 },

    /// Repartition requires the caller to hold every piece of the token
    #[error("Repartition of token {0} while not owning all pieces")]
    RepartitionWhileNotOwningAllPieces(TokenKey),

    /// Malformed input at a call boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO errors that occur when reading/writing files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors that occur during event journal operations
    #[error("Journal error: {0}")]
    Journal(String),

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

// Additional From conversions for common error types

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
