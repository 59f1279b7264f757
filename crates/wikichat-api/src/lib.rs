//! WikiChat API crate - axum HTTP server, chat page, and JSON endpoints.
//!
//! Serves the single chat page and the session endpoints it talks to:
//! creating a session, rendering its transcript, and submitting questions.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod ui;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
