use crate::app_config::AppConfig;
use crate::ConfigError;

/// Default base URL of the public city/postal-code directory.
pub const DEFAULT_CRAWLER_BASE_URL: &str = "https://codigo-postal.org";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a set variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("ROTACEP_LOG_LEVEL", "info");
    let cache_dir = PathBuf::from(or_default("ROTACEP_CACHE_DIR", "./cache"));
    let output_dir = PathBuf::from(or_default("ROTACEP_OUTPUT_DIR", "./output"));
    let jobs_path = PathBuf::from(or_default("ROTACEP_JOBS_PATH", "./config/jobs.yaml"));
    let user_agent = or_default(
        "ROTACEP_USER_AGENT",
        "rotacep/0.1 (delivery-radius planner)",
    );

    let pool_width = parse_usize("ROTACEP_POOL_WIDTH", "20")?;
    let progress_every = parse_usize("ROTACEP_PROGRESS_EVERY", "50")?;
    let api_timeout_secs = parse_u64("ROTACEP_API_TIMEOUT_SECS", "5")?;
    let scrape_timeout_secs = parse_u64("ROTACEP_SCRAPE_TIMEOUT_SECS", "10")?;
    let geocode_timeout_secs = parse_u64("ROTACEP_GEOCODE_TIMEOUT_SECS", "15")?;
    let geocode_min_interval_ms = parse_u64("ROTACEP_GEOCODE_MIN_INTERVAL_MS", "1100")?;

    let scrape_base_url = lookup("ROTACEP_SCRAPE_BASE_URL").ok();
    let crawler_base_url = or_default("ROTACEP_CRAWLER_BASE_URL", DEFAULT_CRAWLER_BASE_URL);
    let crawler_page_delay_ms = parse_u64("ROTACEP_CRAWLER_PAGE_DELAY_MS", "500")?;
    let osrm_base_url = lookup("ROTACEP_OSRM_BASE_URL").ok();

    Ok(AppConfig {
        log_level,
        cache_dir,
        output_dir,
        jobs_path,
        user_agent,
        pool_width,
        progress_every,
        api_timeout_secs,
        scrape_timeout_secs,
        geocode_timeout_secs,
        geocode_min_interval_ms,
        scrape_base_url,
        crawler_base_url,
        crawler_page_delay_ms,
        osrm_base_url,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.cache_dir.to_str(), Some("./cache"));
        assert_eq!(cfg.output_dir.to_str(), Some("./output"));
        assert_eq!(cfg.jobs_path.to_str(), Some("./config/jobs.yaml"));
        assert_eq!(cfg.pool_width, 20);
        assert_eq!(cfg.progress_every, 50);
        assert_eq!(cfg.api_timeout_secs, 5);
        assert_eq!(cfg.scrape_timeout_secs, 10);
        assert_eq!(cfg.geocode_timeout_secs, 15);
        assert_eq!(cfg.geocode_min_interval_ms, 1100);
        assert!(cfg.scrape_base_url.is_none());
        assert_eq!(cfg.crawler_base_url, DEFAULT_CRAWLER_BASE_URL);
        assert_eq!(cfg.crawler_page_delay_ms, 500);
        assert!(cfg.osrm_base_url.is_none());
    }

    #[test]
    fn pool_width_override() {
        let mut map = HashMap::new();
        map.insert("ROTACEP_POOL_WIDTH", "10");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.pool_width, 10);
    }

    #[test]
    fn pool_width_invalid() {
        let mut map = HashMap::new();
        map.insert("ROTACEP_POOL_WIDTH", "many");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ROTACEP_POOL_WIDTH"),
            "expected InvalidEnvVar(ROTACEP_POOL_WIDTH), got: {result:?}"
        );
    }

    #[test]
    fn geocode_min_interval_override() {
        let mut map = HashMap::new();
        map.insert("ROTACEP_GEOCODE_MIN_INTERVAL_MS", "2000");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.geocode_min_interval_ms, 2000);
    }

    #[test]
    fn geocode_min_interval_invalid() {
        let mut map = HashMap::new();
        map.insert("ROTACEP_GEOCODE_MIN_INTERVAL_MS", "1.1s");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "ROTACEP_GEOCODE_MIN_INTERVAL_MS"),
            "expected InvalidEnvVar(ROTACEP_GEOCODE_MIN_INTERVAL_MS), got: {result:?}"
        );
    }

    #[test]
    fn scrape_base_url_enables_the_scrape_source() {
        let mut map = HashMap::new();
        map.insert("ROTACEP_SCRAPE_BASE_URL", "https://cep-lookup.example");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.scrape_base_url.as_deref(),
            Some("https://cep-lookup.example")
        );
    }

    #[test]
    fn osrm_base_url_override() {
        let mut map = HashMap::new();
        map.insert("ROTACEP_OSRM_BASE_URL", "http://localhost:5000");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.osrm_base_url.as_deref(), Some("http://localhost:5000"));
    }

    #[test]
    fn user_agent_override() {
        let mut map = HashMap::new();
        map.insert("ROTACEP_USER_AGENT", "custom-agent/2.0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.user_agent, "custom-agent/2.0");
    }
}
