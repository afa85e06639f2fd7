//! Commands module - CLI command implementations.

pub mod codes;
pub mod migrate;
pub mod serve;
