//! Docent API - REST server
//!
//! Provides the HTTP endpoints for ingesting documents and asking grounded
//! questions. All pipeline work is delegated to `docent-rag`; this crate
//! only maps requests and errors onto the wire.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
