//! OTP Auth Service - email registration with one-time verification codes.
//!
//! Accounts are created pending, confirmed with a six digit code sent by
//! email, and then sign in with a password. Google and Facebook access
//! tokens can be exchanged for a local account. A contact form stores
//! visitor messages.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Users, passwords, verification codes, contact messages
//! - **services**: Registration, authentication and contact use cases
//! - **infra**: Database, Redis, outbound mail and identity providers
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared response types
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Remove verification codes past their lifetime
//! cargo run -- codes purge
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Password, User, VerificationCode, VerificationPolicy};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
