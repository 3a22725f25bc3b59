pub mod engine;

// Re-export the main types for convenience
pub use engine::TokenEngine;
