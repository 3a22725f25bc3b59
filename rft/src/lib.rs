//! ReFungible (RFT) piece ledger
//!
//! This crate re-exports all the components of the RFT system.

pub use rft_core::*;
pub use rft_ledger::*;
pub use rft_engine::*;
pub use rft_api::*;
