//! Client configuration.
//!
//! Read from a JSON file, then overridden from the environment. Every field
//! has a default, so an empty object (or no file at all) is a valid config.

use std::{env, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::policy::ReviewPolicy;

/// Validity window folded into reveal challenges.
pub const DEFAULT_DURATION_DAYS: u32 = 30;
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Environment variables read by [`ClientConfig::with_env_overrides`].
pub mod env_vars {
    pub const CHAIN_ID: &str = "COLLATERAL_CHAIN_ID";
    pub const DURATION_DAYS: &str = "COLLATERAL_DURATION_DAYS";
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Chain id reported in reveal challenges. `0` when unknown.
    pub chain_id: u64,
    pub duration_days: u32,
    pub review_policy: ReviewPolicy,
    /// Refuse submissions valued at exactly zero.
    pub reject_zero_value: bool,
    /// Buffered registry events per subscriber before lagging.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: 0,
            duration_days: DEFAULT_DURATION_DAYS,
            review_policy: ReviewPolicy::default(),
            reject_zero_value: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| env::var(var).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(env_vars::CHAIN_ID) {
            self.chain_id = value.trim().parse().map_err(|_| ConfigError::Env {
                var: env_vars::CHAIN_ID,
                value,
            })?;
        }
        if let Some(value) = lookup(env_vars::DURATION_DAYS) {
            self.duration_days = value.trim().parse().map_err(|_| ConfigError::Env {
                var: env_vars::DURATION_DAYS,
                value,
            })?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collateral_assets_primitives::Address;

    #[test]
    fn empty_object_is_the_default_config() {
        let cfg = ClientConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.duration_days, 30);
        assert!(cfg.reject_zero_value);
        assert_eq!(cfg.review_policy, ReviewPolicy::Owner);
    }

    #[test]
    fn reads_reviewer_policy_and_chain() {
        let cfg = ClientConfig::from_json(
            r#"{
                "chain_id": 11155111,
                "review_policy": { "mode": "reviewers", "reviewers": ["0xAA", "0xbb"] }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.chain_id, 11_155_111);
        assert_eq!(
            cfg.review_policy,
            ReviewPolicy::Reviewers {
                reviewers: vec![Address::new("0xaa"), Address::new("0xBB")]
            }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            ClientConfig::from_json(r#"{"chainId": 1}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let cfg = ClientConfig::default()
            .with_overrides(|var| match var {
                env_vars::CHAIN_ID => Some("31337".into()),
                env_vars::DURATION_DAYS => Some(" 7 ".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(cfg.chain_id, 31337);
        assert_eq!(cfg.duration_days, 7);
    }

    #[test]
    fn bad_override_names_the_variable() {
        let err = ClientConfig::default()
            .with_overrides(|var| (var == env_vars::CHAIN_ID).then(|| "mainnet".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(env_vars::CHAIN_ID));
    }
}
