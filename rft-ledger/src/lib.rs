pub mod arena;
pub mod journal;
pub mod state;

// Re-export the main types for convenience
pub use arena::TokenLedger;
pub use journal::{FileEventJournal, JournalEntry};
pub use state::TokenState;
