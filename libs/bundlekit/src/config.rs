//! Typed access to per-bundle configuration.
//!
//! Each bundle owns one section of the host configuration:
//! `bundles.<name> = { enabled: .., run_level: .., config: { .. } }`.
//! The host reads `enabled` / `run_level`; the bundle reads `config`.
//!
//! Two loaders are provided:
//!
//! 1. **Lenient** ([`bundle_config_or_default`]): falls back to `T::default()` when the
//!    section or its `config` field is missing.
//! 2. **Strict** ([`bundle_config_required`]): every missing piece is an error.

use std::collections::HashMap;
use std::hash::BuildHasher;

use serde::de::DeserializeOwned;

/// Configuration error for typed config operations
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("bundle '{bundle}' not found")]
    BundleNotFound { bundle: String },
    #[error("bundle '{bundle}' config must be an object")]
    InvalidBundleStructure { bundle: String },
    #[error("missing 'config' section in bundle '{bundle}'")]
    MissingConfigSection { bundle: String },
    #[error("invalid config for bundle '{bundle}': {source}")]
    InvalidConfig {
        bundle: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Provider of bundle-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns the raw JSON section for the bundle, if any.
    fn get_bundle_config(&self, bundle_name: &str) -> Option<&serde_json::Value>;
}

/// Provider with no sections at all; every bundle runs on defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyConfigProvider;

impl ConfigProvider for EmptyConfigProvider {
    fn get_bundle_config(&self, _bundle_name: &str) -> Option<&serde_json::Value> {
        None
    }
}

impl<S> ConfigProvider for HashMap<String, serde_json::Value, S>
where
    S: BuildHasher + Send + Sync,
{
    fn get_bundle_config(&self, bundle_name: &str) -> Option<&serde_json::Value> {
        self.get(bundle_name)
    }
}

/// Host-side settings read from the bundle section, next to `config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleSettings {
    pub enabled: bool,
    pub run_level: Option<u32>,
}

impl Default for BundleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            run_level: None,
        }
    }
}

/// Read `enabled` and `run_level` for a bundle. Missing or malformed values keep defaults.
#[must_use]
pub fn bundle_settings(provider: &dyn ConfigProvider, bundle_name: &str) -> BundleSettings {
    let Some(obj) = provider
        .get_bundle_config(bundle_name)
        .and_then(serde_json::Value::as_object)
    else {
        return BundleSettings::default();
    };

    BundleSettings {
        enabled: obj
            .get("enabled")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true),
        run_level: obj
            .get("run_level")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok()),
    }
}

/// Lenient configuration loader that falls back to defaults.
///
/// - bundle not present → `Ok(T::default())`
/// - bundle value is not an object → `Ok(T::default())`
/// - no `config` field → `Ok(T::default())`
/// - `config` present but invalid → `Err(ConfigError::InvalidConfig)`
///
/// # Errors
/// Returns `ConfigError::InvalidConfig` if the config section exists but cannot be deserialized.
pub fn bundle_config_or_default<T: DeserializeOwned + Default>(
    provider: &dyn ConfigProvider,
    bundle_name: &str,
) -> Result<T, ConfigError> {
    let Some(bundle_raw) = provider.get_bundle_config(bundle_name) else {
        return Ok(T::default());
    };

    let Some(obj) = bundle_raw.as_object() else {
        return Ok(T::default());
    };

    let Some(config_section) = obj.get("config") else {
        return Ok(T::default());
    };

    serde_json::from_value(config_section.clone()).map_err(|e| ConfigError::InvalidConfig {
        bundle: bundle_name.to_owned(),
        source: e,
    })
}

/// Strict configuration loader that requires configuration to be present.
///
/// # Errors
/// Returns `ConfigError` if the bundle is not found, has invalid structure, or its
/// config is invalid.
pub fn bundle_config_required<T: DeserializeOwned>(
    provider: &dyn ConfigProvider,
    bundle_name: &str,
) -> Result<T, ConfigError> {
    let bundle_raw =
        provider
            .get_bundle_config(bundle_name)
            .ok_or_else(|| ConfigError::BundleNotFound {
                bundle: bundle_name.to_owned(),
            })?;

    let obj = bundle_raw
        .as_object()
        .ok_or_else(|| ConfigError::InvalidBundleStructure {
            bundle: bundle_name.to_owned(),
        })?;

    let config_section = obj
        .get("config")
        .ok_or_else(|| ConfigError::MissingConfigSection {
            bundle: bundle_name.to_owned(),
        })?;

    serde_json::from_value(config_section.clone()).map_err(|e| ConfigError::InvalidConfig {
        bundle: bundle_name.to_owned(),
        source: e,
    })
}
