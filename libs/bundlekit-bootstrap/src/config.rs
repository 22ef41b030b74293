//! Application configuration.
//!
//! Layering, later wins:
//! 1. built-in defaults
//! 2. YAML file (if provided)
//! 3. environment variables `BUNDLE_HOST__*`, nested with `__`
//!    (e.g. `BUNDLE_HOST__BUNDLES__CONSUMER__CONFIG__A=5`)
//! 4. CLI overrides

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use bundlekit::ConfigProvider;

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "BUNDLE_HOST__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `info,bundle=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Whole host configuration.
///
/// Every entry of `bundles` is a raw section `{ enabled, run_level, config }` handed to
/// the bundle with that name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub bundles: BTreeMap<String, serde_json::Value>,
}

/// Command-line values that take part in configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub print_config: bool,
    pub verbose: u8,
}

impl AppConfig {
    /// Load layered configuration. A `None` path means defaults plus environment.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or any layer does not match the
    /// expected shape.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: AppConfig = figment
            .extract()
            .context("failed to load configuration")?;

        tracing::debug!(bundles = config.bundles.len(), "configuration loaded");
        Ok(config)
    }

    /// Apply CLI overrides: `-v` info, `-vv` debug, `-vvv` trace.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let level = match args.verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// Render effective configuration as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize configuration")
    }

    /// Configured bundle names, sorted.
    #[must_use]
    pub fn bundle_names(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }
}

impl ConfigProvider for AppConfig {
    fn get_bundle_config(&self, bundle_name: &str) -> Option<&serde_json::Value> {
        self.bundles.get(bundle_name)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.bundles.is_empty());
    }

    #[test]
    fn verbosity_overrides_level() {
        let mut config = AppConfig::default();

        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config.logging.level, "info");

        for (verbose, expected) in [(1, "info"), (2, "debug"), (3, "trace"), (7, "trace")] {
            config.apply_cli_overrides(&CliArgs {
                verbose,
                ..CliArgs::default()
            });
            assert_eq!(config.logging.level, expected);
        }
    }

    #[test]
    fn provides_bundle_sections() {
        let mut config = AppConfig::default();
        config
            .bundles
            .insert("consumer".to_owned(), json!({ "config": { "a": 1 } }));

        assert_eq!(
            config.get_bundle_config("consumer"),
            Some(&json!({ "config": { "a": 1 } }))
        );
        assert!(config.get_bundle_config("missing").is_none());
        assert_eq!(config.bundle_names(), vec!["consumer"]);
    }

    #[test]
    fn pretty_json_contains_sections() {
        let mut config = AppConfig::default();
        config
            .bundles
            .insert("simple".to_owned(), json!({ "enabled": false }));
        let rendered = config.to_pretty_json().unwrap();
        assert!(rendered.contains("\"simple\""));
        assert!(rendered.contains("\"level\": \"info\""));
    }
}
