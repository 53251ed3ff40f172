pub mod error;
pub mod handlers;
pub mod outcome;
pub mod service;

pub use error::EdgeError;
pub use handlers::process_edge_request;
pub use outcome::{CacheStatus, EdgeResponse, MissResponse};
pub use service::{CacheService, EdgeRequest};
