use std::time::Duration;

pub const API_PREFIX: &str = "/api/";
pub const STATS_PATH: &str = "/__cache-stats";
pub const PURGE_PATH: &str = "/__cache-purge";

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// Sent on every asset response, HIT or MISS
pub const EDGE_CACHE_CONTROL: &str = "public, max-age=31536000";

pub const SERVED_FROM_EDGE: &str = "CDN Edge Server";
pub const SERVED_FROM_ORIGIN: &str = "Origin Server (via CDN)";
pub const BYPASS_REASON: &str = "Dynamic API request";
