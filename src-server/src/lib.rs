//! ATM Service - HTTP transport
//!
//! Thin adapter over `atm-core`: decodes headers and bodies, asks the core
//! to do the work, and renders the outcome as a status code plus a short
//! plain-text body.

pub mod cli;
mod error;
mod middleware;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
