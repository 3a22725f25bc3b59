pub mod eth;
pub mod native;

// Re-export the main types for convenience
pub use eth::{EthCrossAccount, EthTokenApi, EthWireEvent};
pub use native::NativeTokenApi;
