/// Core value types: frame rates, field modes, format descriptors.
pub mod core;
/// Crate error taxonomy.
pub mod error;
