//! HTTP request handlers.

pub mod auth_handler;
pub mod contact_handler;
pub mod social_handler;

pub use auth_handler::{auth_routes, session_routes};
pub use contact_handler::contact_routes;
pub use social_handler::social_routes;
