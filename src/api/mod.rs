//! HTTP surface: `/auth/*` (registration, verification, login, social
//! sign-in, logout), `/contact`, health and the OpenAPI document.
//!
//! Handlers validate input with [`extractors::ValidatedJson`] and call the
//! services held in [`AppState`]. Bearer credentials are checked by
//! [`middleware::auth_middleware`]; every API route is rate limited.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
