use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};

use crate::models::DistanceMetric;

pub const DEFAULT_INDEX_NAME: &str = "yc-ai-profiles";
pub const DEFAULT_DIMENSION: u32 = 1536;

/// Name and shape of the profile index, shared by every backend
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    pub name: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
}

impl IndexSettings {
    pub fn new(name: impl Into<String>, dimension: u32) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: DistanceMetric::Cosine,
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME, DEFAULT_DIMENSION)
    }
}

impl FromEnv for IndexSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let dimension = env_parse_or("EMBEDDING_DIMENSION", DEFAULT_DIMENSION)?;
        if dimension == 0 {
            return Err(ConfigError::ParseError {
                key: "EMBEDDING_DIMENSION".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            name: env_or_default("PROFILE_INDEX_NAME", DEFAULT_INDEX_NAME),
            dimension,
            metric: env_parse_or("PROFILE_INDEX_METRIC", DistanceMetric::Cosine)?,
        })
    }
}

/// `top_k` and score threshold applied when a request leaves them out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub top_k: u32,
    pub threshold: f32,
}

impl SearchParams {
    pub const fn new(top_k: u32, threshold: f32) -> Self {
        Self { top_k, threshold }
    }

    fn from_env(prefix: &str, default: SearchParams) -> Result<Self, ConfigError> {
        let top_k_key = format!("{}_TOP_K", prefix);
        let threshold_key = format!("{}_THRESHOLD", prefix);

        let top_k: u32 = env_parse_or(&top_k_key, default.top_k)?;
        if top_k == 0 {
            return Err(ConfigError::ParseError {
                key: top_k_key,
                details: "must be greater than zero".to_string(),
            });
        }

        let threshold: f32 = env_parse_or(&threshold_key, default.threshold)?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ParseError {
                key: threshold_key,
                details: format!("{} is outside [0, 1]", threshold),
            });
        }

        Ok(Self { top_k, threshold })
    }
}

/// Settings the profile service needs besides its clients
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileServiceConfig {
    /// Expected embedding length; vectors of any other length are rejected
    pub dimension: u32,
    /// Defaults for `/fetch_top_k_profiles`
    pub fetch: SearchParams,
    /// Defaults for `/search`
    pub search: SearchParams,
}

impl ProfileServiceConfig {
    pub const DEFAULT_FETCH: SearchParams = SearchParams::new(5, 0.25);
    pub const DEFAULT_SEARCH: SearchParams = SearchParams::new(10, 0.8);
}

impl Default for ProfileServiceConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            fetch: Self::DEFAULT_FETCH,
            search: Self::DEFAULT_SEARCH,
        }
    }
}

impl FromEnv for ProfileServiceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dimension: env_parse_or("EMBEDDING_DIMENSION", DEFAULT_DIMENSION)?,
            fetch: SearchParams::from_env("FETCH", Self::DEFAULT_FETCH)?,
            search: SearchParams::from_env("SEARCH", Self::DEFAULT_SEARCH)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_VARS: [(&str, Option<&str>); 5] = [
        ("EMBEDDING_DIMENSION", None),
        ("FETCH_TOP_K", None),
        ("FETCH_THRESHOLD", None),
        ("SEARCH_TOP_K", None),
        ("SEARCH_THRESHOLD", None),
    ];

    #[test]
    fn test_service_config_defaults() {
        temp_env::with_vars(SEARCH_VARS, || {
            let config = ProfileServiceConfig::from_env().unwrap();
            assert_eq!(config, ProfileServiceConfig::default());
            assert_eq!(config.fetch, SearchParams::new(5, 0.25));
            assert_eq!(config.search, SearchParams::new(10, 0.8));
        });
    }

    #[test]
    fn test_service_config_overrides() {
        temp_env::with_vars(
            [
                ("FETCH_TOP_K", Some("3")),
                ("SEARCH_THRESHOLD", Some("0.5")),
            ],
            || {
                let config = ProfileServiceConfig::from_env().unwrap();
                assert_eq!(config.fetch.top_k, 3);
                assert_eq!(config.search.threshold, 0.5);
            },
        );
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        temp_env::with_var("SEARCH_THRESHOLD", Some("1.5"), || {
            let err = ProfileServiceConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("SEARCH_THRESHOLD"));
        });
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        temp_env::with_var("FETCH_TOP_K", Some("0"), || {
            assert!(ProfileServiceConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_index_settings_from_env() {
        temp_env::with_vars(
            [
                ("PROFILE_INDEX_NAME", Some("roster-test")),
                ("EMBEDDING_DIMENSION", Some("768")),
                ("PROFILE_INDEX_METRIC", None),
            ],
            || {
                let settings = IndexSettings::from_env().unwrap();
                assert_eq!(settings.name, "roster-test");
                assert_eq!(settings.dimension, 768);
                assert_eq!(settings.metric, DistanceMetric::Cosine);
            },
        );
    }

    #[test]
    fn test_index_settings_defaults() {
        temp_env::with_vars(
            [
                ("PROFILE_INDEX_NAME", None::<&str>),
                ("EMBEDDING_DIMENSION", None),
                ("PROFILE_INDEX_METRIC", None),
            ],
            || {
                assert_eq!(IndexSettings::from_env().unwrap(), IndexSettings::default());
            },
        );
    }

    #[test]
    fn test_bad_metric_is_parse_error() {
        temp_env::with_var("PROFILE_INDEX_METRIC", Some("hamming"), || {
            assert!(matches!(
                IndexSettings::from_env(),
                Err(ConfigError::ParseError { .. })
            ));
        });
    }
}
