//! Value objects representing immutable domain concepts.

pub mod identifier;

// Re-export commonly used types
pub use identifier::Identifier;
