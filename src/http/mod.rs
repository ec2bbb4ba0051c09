//! JSON over HTTP in front of the quotation service.

pub mod dto;
pub mod error;
pub mod router;

pub use error::ApiError;
pub use router::{AppState, build_router, cors_layer, serve};
