pub mod account;
pub mod addr;
pub mod error;
pub mod event;
pub mod token;

// Re-export the main types for convenience
pub use account::CrossAccountId;
pub use addr::{EthAddress, NativeAddress};
pub use error::LedgerError;
pub use event::{EventParty, LedgerEvent};
pub use token::{CollectionId, TokenId, TokenKey};
