pub mod api;
pub mod error;
pub mod origin;

pub use api::{ApiClient, ApiRequest, ApiResponse, HttpApiClient};
pub use error::FetchError;
pub use origin::{HttpOriginClient, OriginClient, OriginResponse};
