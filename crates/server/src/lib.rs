//! HTTP API server for the imgapi image repository.
//!
//! This crate provides the hypermedia surface:
//! - Image upload with content-addressed deduplication
//! - Original and thumbnail retrieval with content negotiation
//! - RESTdesc affordance documents for every resource
//! - RFC 7807 problem details for every failure

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod negotiate;
pub mod routes;
pub mod state;
pub mod templates;

pub use bootstrap::build_state;
pub use error::{ApiError, ProblemDetails};
pub use routes::create_router;
pub use state::AppState;
