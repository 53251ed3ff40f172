pub mod constants;
pub mod settings;

pub use constants::{API_PREFIX, DEFAULT_FETCH_TIMEOUT, DEFAULT_TTL, PURGE_PATH, STATS_PATH};
pub use settings::{ConfigError, EdgeConfig};
