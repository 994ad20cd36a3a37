//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/dagtree/dagtree.toml`
//! 3. Local config: a file path supplied by the caller
//! 4. Environment variables: `DAGTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::TraversalStrategy;
use crate::errors::{ConfigError, ConfigResult};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "DAGTREE";

/// Tree behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Strategy used when a caller does not pick one
    pub traversal: TraversalStrategy,
    /// Reject add/move operations that would close a cycle
    pub check_cycles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            traversal: TraversalStrategy::BreadthFirst,
            check_cycles: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub traversal: Option<TraversalStrategy>,
    pub check_cycles: Option<bool>,
}

/// Get the XDG config directory for dagtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dagtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("dagtree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ConfigResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            traversal: overlay.traversal.unwrap_or(self.traversal),
            check_cycles: overlay.check_cycles.unwrap_or(self.check_cycles),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional local config file, skipped when it does not exist
    pub fn load(local: Option<&Path>) -> ConfigResult<Self> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__");
        Self::load_layers(global_config_path().as_deref(), local, env)
    }

    /// Load settings from explicit layers.
    ///
    /// Missing files are skipped; unreadable or malformed ones are errors.
    #[instrument(level = "debug", skip(env))]
    pub fn load_layers(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Environment,
    ) -> ConfigResult<Self> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global, then 3. local: each overrides what it specifies
        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "loading config file");
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current, env)?;

        Ok(current)
    }

    /// Apply `DAGTREE_*` environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> ConfigResult<Self> {
        let config = Config::builder().add_source(env).build()?;

        if let Ok(val) = config.get_string("traversal") {
            settings.traversal = val
                .parse::<TraversalStrategy>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "traversal".into(),
                    message,
                })?;
        }
        if config.get_string("check_cycles").is_ok() {
            settings.check_cycles = config.get_bool("check_cycles").map_err(|e| {
                ConfigError::InvalidValue {
                    key: "check_cycles".into(),
                    message: e.to_string(),
                }
            })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# dagtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/dagtree/dagtree.toml
#   Local:  file passed to Settings::load
#   Env:    DAGTREE_* environment variables

# Default traversal for lookups: "breadth_first" or "depth_first"
# traversal = "breadth_first"

# Reject add/move operations that would create a cycle
# check_cycles = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;

    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let source: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .source(Some(source))
    }

    #[test]
    fn given_no_layers_when_loading_then_uses_defaults() {
        let settings = Settings::load_layers(None, None, env_with(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.traversal, TraversalStrategy::BreadthFirst);
        assert!(settings.check_cycles);
    }

    #[test]
    fn given_partial_overlay_when_merged_then_keeps_unspecified_fields() {
        let overlay = RawSettings {
            traversal: Some(TraversalStrategy::DepthFirst),
            check_cycles: None,
        };
        let merged = Settings::default().merge_with(&overlay);
        assert_eq!(merged.traversal, TraversalStrategy::DepthFirst);
        assert!(merged.check_cycles);
    }

    #[test]
    fn given_env_overrides_when_loading_then_env_wins() {
        let env = env_with(&[
            ("DAGTREE_TRAVERSAL", "dfs"),
            ("DAGTREE_CHECK_CYCLES", "false"),
        ]);
        let settings = Settings::load_layers(None, None, env).unwrap();
        assert_eq!(settings.traversal, TraversalStrategy::DepthFirst);
        assert!(!settings.check_cycles);
    }

    #[test]
    fn given_invalid_env_traversal_when_loading_then_error() {
        let env = env_with(&[("DAGTREE_TRAVERSAL", "sideways")]);
        let err = Settings::load_layers(None, None, env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "traversal"));
    }

    #[test]
    fn given_settings_when_rendered_then_toml_round_trips() {
        let settings = Settings {
            traversal: TraversalStrategy::DepthFirst,
            check_cycles: false,
        };
        let rendered = settings.to_toml().unwrap();
        assert!(rendered.contains("traversal = \"depth_first\""));
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let parsed: Settings = toml::from_str(&Settings::template()).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
