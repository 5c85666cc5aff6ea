use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::RecommendationLimits;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub appwrite: AppwriteSettings,
    pub collection: CollectionSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub ranker: RankerSettings,
    #[serde(default)]
    pub recommendations: RecommendationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub users: String,
    pub recommendation_blocks: String,
    /// Mirror blocks into `recommendation_blocks` in Appwrite
    #[serde(default)]
    pub mirror_blocks: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            redis_url: None,
            ttl_secs: None,
            l1_cache_size: None,
        }
    }
}

fn default_cache_enabled() -> bool { true }

/// External ranker (Gemini) settings; both key and model are needed to use it
#[derive(Debug, Clone, Deserialize)]
pub struct RankerSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(default = "default_ranker_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ranker_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for RankerSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            endpoint: default_ranker_endpoint(),
            timeout_secs: default_ranker_timeout(),
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_ranker_endpoint() -> String { crate::services::gemini::DEFAULT_ENDPOINT.to_string() }
fn default_ranker_timeout() -> u64 { 10 }
fn default_max_output_tokens() -> u32 { 3000 }

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationSettings {
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
    #[serde(default = "default_interest_tags")]
    pub interest_tags: usize,
    #[serde(default = "default_interest_query_limit")]
    pub interest_query_limit: usize,
    #[serde(default = "default_ranker_candidates")]
    pub ranker_candidates: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            max_matches: default_max_matches(),
            interest_tags: default_interest_tags(),
            interest_query_limit: default_interest_query_limit(),
            ranker_candidates: default_ranker_candidates(),
        }
    }
}

impl From<&RecommendationSettings> for RecommendationLimits {
    fn from(settings: &RecommendationSettings) -> Self {
        Self {
            max_matches: settings.max_matches,
            interest_tags: settings.interest_tags,
            interest_query_limit: settings.interest_query_limit,
            ranker_candidates: settings.ranker_candidates,
        }
        .clamped()
    }
}

fn default_max_matches() -> usize { 10 }
fn default_interest_tags() -> usize { 10 }
fn default_interest_query_limit() -> usize { 200 }
fn default_ranker_candidates() -> usize { 20 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with ALUMNI_)
    /// 4. DATABASE_URL, GEMINI_API_KEY and GEMINI_MODEL
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // e.g., ALUMNI__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("ALUMNI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ALUMNI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the well-known, unprefixed environment variables on top of the config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("database.url", env::var("DATABASE_URL").ok()),
        ("ranker.api_key", env::var("GEMINI_API_KEY").ok()),
        ("ranker.model", env::var("GEMINI_MODEL").ok()),
    ];

    let mut builder = Config::builder().add_source(settings);

    for (key, value) in overrides {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_recommendation_limits() {
        let limits = RecommendationLimits::from(&RecommendationSettings::default());
        assert_eq!(limits.max_matches, 10);
        assert_eq!(limits.interest_tags, 10);
        assert_eq!(limits.interest_query_limit, 200);
        assert_eq!(limits.ranker_candidates, 20);
    }

    #[test]
    fn test_max_matches_is_capped() {
        let settings = RecommendationSettings {
            max_matches: 25,
            ..Default::default()
        };
        assert_eq!(RecommendationLimits::from(&settings).max_matches, 10);
    }

    #[test]
    fn test_default_ranker_is_unconfigured() {
        let ranker = RankerSettings::default();
        assert!(ranker.api_key.is_none());
        assert!(ranker.model.is_none());
        assert_eq!(ranker.timeout_secs, 10);
        assert_eq!(ranker.max_output_tokens, 3000);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("alumni-match-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8081

[appwrite]
endpoint = "https://appwrite.test/v1"
api_key = "key"
project_id = "project"
database_id = "db"

[collection]
users = "users"
recommendation_blocks = "alumni_recommendation_blocks"

[database]
url = "postgres://localhost/alumni"

[ranker]
model = "gemini-2.5-flash"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.ranker.model.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(settings.ranker.timeout_secs, 10);
        assert!(settings.cache.enabled);
        assert!(!settings.collection.mirror_blocks);
        assert_eq!(settings.recommendations.max_matches, 10);
    }
}
