use std::path::PathBuf;

/// Runtime configuration, loaded from `ROTACEP_*` environment variables.
///
/// Every field has a default; unset environments get a working local
/// setup (cache and output directories under the working directory, the
/// public geocoding endpoints, a conservative pool width).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Directory holding one JSON file per geocoded (state, city) pair.
    pub cache_dir: PathBuf,
    /// Directory the CSV sheet store writes into.
    pub output_dir: PathBuf,
    pub jobs_path: PathBuf,
    pub user_agent: String,
    /// Bounded width of the concurrent resolution pool.
    pub pool_width: usize,
    /// Progress is reported every this many resolved postal codes.
    pub progress_every: usize,
    pub api_timeout_secs: u64,
    pub scrape_timeout_secs: u64,
    pub geocode_timeout_secs: u64,
    /// Minimum spacing between forward-geocode calls, per the upstream
    /// usage policy.
    pub geocode_min_interval_ms: u64,
    /// Base URL of the postal-lookup scrape source; unset disables the
    /// scrape strategy entirely.
    pub scrape_base_url: Option<String>,
    pub crawler_base_url: String,
    pub crawler_page_delay_ms: u64,
    /// Base URL of the routing oracle; unset disables the `routes`
    /// queue command.
    pub osrm_base_url: Option<String>,
}
