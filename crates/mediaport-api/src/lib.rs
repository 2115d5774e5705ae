//! Mediaport API Library
//!
//! HTTP handlers for media source ingestion, authentication, error mapping
//! and application setup.

mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
