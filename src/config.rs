// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology service configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::pattern::DEFAULT_EXPANSION_LIMIT;
use crate::domain::ConnectionStatus;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Configuration shared by the topology services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Maximum number of related devices returned for cross-linking
    #[serde(default = "default_related_device_limit")]
    pub related_device_limit: usize,

    /// Maximum number of names a single pattern may expand to
    #[serde(default = "default_max_pattern_expansion")]
    pub max_pattern_expansion: usize,

    /// Status applied when a connect request does not specify one
    #[serde(default)]
    pub default_connection_status: ConnectionStatus,
}

fn default_related_device_limit() -> usize {
    10
}

fn default_max_pattern_expansion() -> usize {
    DEFAULT_EXPANSION_LIMIT
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            related_device_limit: default_related_device_limit(),
            max_pattern_expansion: default_max_pattern_expansion(),
            default_connection_status: ConnectionStatus::default(),
        }
    }
}

impl TopologyConfig {
    pub const RELATED_DEVICE_LIMIT_VAR: &'static str = "DCIM_RELATED_DEVICE_LIMIT";
    pub const MAX_PATTERN_EXPANSION_VAR: &'static str = "DCIM_MAX_PATTERN_EXPANSION";
    pub const DEFAULT_CONNECTION_STATUS_VAR: &'static str = "DCIM_DEFAULT_CONNECTION_STATUS";

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::RELATED_DEVICE_LIMIT_VAR) {
            config.related_device_limit = parse_count(Self::RELATED_DEVICE_LIMIT_VAR, &value)?;
        }

        if let Some(value) = lookup(Self::MAX_PATTERN_EXPANSION_VAR) {
            config.max_pattern_expansion = parse_count(Self::MAX_PATTERN_EXPANSION_VAR, &value)?;
        }

        if let Some(value) = lookup(Self::DEFAULT_CONNECTION_STATUS_VAR) {
            config.default_connection_status =
                ConnectionStatus::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                    key: Self::DEFAULT_CONNECTION_STATUS_VAR.to_string(),
                    value: value.clone(),
                })?;
        }

        Ok(config)
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
