use serde::Deserialize;
use std::time::Duration;

/// Upper bound on extra attempts per provider call
pub const MAX_RETRIES_LIMIT: u32 = 2;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Google Maps Platform key used for geocoding, nearby search, details and photos
    pub google_maps_api_key: String,

    /// Key for the chat-completion provider
    pub llm_api_key: String,

    /// Geocoding API endpoint
    #[serde(default = "default_geocode_api_url")]
    pub geocode_api_url: String,

    /// Places API base URL (`/nearbysearch/json`, `/details/json`, `/photo` live under it)
    #[serde(default = "default_places_api_url")]
    pub places_api_url: String,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_llm_api_url")]
    pub llm_api_url: String,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for geocode, search and detail calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Timeout for the chat completion call
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Extra attempts for transient geocode/places failures, capped at [`MAX_RETRIES_LIMIT`]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fetch phone, website and opening hours for every candidate
    #[serde(default)]
    pub place_details_enabled: bool,

    /// Maximum detail lookups in flight per request
    #[serde(default = "default_place_details_concurrency")]
    pub place_details_concurrency: usize,

    /// Max width requested from the photo endpoint
    #[serde(default = "default_photo_max_width")]
    pub photo_max_width: u32,
}

fn default_geocode_api_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_places_api_url() -> String {
    "https://maps.googleapis.com/maps/api/place".to_string()
}

fn default_llm_api_url() -> String {
    "https://api.deepseek.com/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

fn default_place_details_concurrency() -> usize {
    8
}

fn default_photo_max_width() -> u32 {
    400
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from key/value pairs named like the environment variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config: Config = envy::from_iter(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.max_retries > MAX_RETRIES_LIMIT {
            tracing::warn!(
                requested = config.max_retries,
                limit = MAX_RETRIES_LIMIT,
                "MAX_RETRIES above limit, clamping"
            );
            config.max_retries = MAX_RETRIES_LIMIT;
        }

        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_for_optional_keys() {
        let vars = vec![
            ("GOOGLE_MAPS_API_KEY".to_string(), "maps-key".to_string()),
            ("LLM_API_KEY".to_string(), "llm-key".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.llm_model, "deepseek-chat");
        assert_eq!(config.max_retries, 1);
        assert!(!config.place_details_enabled);
        assert_eq!(config.place_details_concurrency, 8);
        assert_eq!(config.http_timeout(), Duration::from_secs(15));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let vars = vec![("LLM_API_KEY".to_string(), "llm-key".to_string())];
        let result: Result<Config, _> = envy::from_iter(vars);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let vars = vec![
            ("GOOGLE_MAPS_API_KEY".to_string(), "maps-key".to_string()),
            ("LLM_API_KEY".to_string(), "llm-key".to_string()),
            ("PORT".to_string(), "8080".to_string()),
            ("PLACE_DETAILS_ENABLED".to_string(), "true".to_string()),
            ("PLACE_DETAILS_CONCURRENCY".to_string(), "12".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.place_details_enabled);
        assert_eq!(config.place_details_concurrency, 12);
    }

    #[test]
    fn test_large_retry_count_is_clamped() {
        let vars = vec![
            ("GOOGLE_MAPS_API_KEY".to_string(), "maps-key".to_string()),
            ("LLM_API_KEY".to_string(), "llm-key".to_string()),
            ("MAX_RETRIES".to_string(), "20".to_string()),
        ];
        let config = Config::from_vars(vars).unwrap();
        assert_eq!(config.max_retries, MAX_RETRIES_LIMIT);

        let vars = vec![
            ("GOOGLE_MAPS_API_KEY".to_string(), "maps-key".to_string()),
            ("LLM_API_KEY".to_string(), "llm-key".to_string()),
            ("MAX_RETRIES".to_string(), "0".to_string()),
        ];
        assert_eq!(Config::from_vars(vars).unwrap().max_retries, 0);
    }
}
