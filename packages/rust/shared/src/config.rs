//! Application configuration for Orderdesk.
//!
//! User config lives at `./orderdesk.toml` next to the working directory the
//! tool is run from. CLI flags override config file values, which override
//! defaults. All paths are resolved relative to the working directory unless
//! absolute.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrderdeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "orderdesk.toml";

// ---------------------------------------------------------------------------
// Config structs (matching orderdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Input document selection.
    #[serde(default)]
    pub input: InputConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root for persisted configuration (mapping, rules, learning store).
    #[serde(default = "default_config_dir")]
    pub config_dir: String,

    /// Directory holding template descriptors.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Root for run outputs (exports and diagnostics).
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_config_dir() -> String {
    "config".into()
}
fn default_templates_dir() -> String {
    "templates".into()
}
fn default_output_dir() -> String {
    "output".into()
}

/// `[input]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// File extensions considered eligible order documents.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["docx".into(), "txt".into()]
}

impl AppConfig {
    /// Resolved path to the default template descriptor.
    pub fn default_template_path(&self) -> PathBuf {
        Path::new(&self.paths.templates_dir).join("standard.json")
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the application config from the default location. Returns defaults
/// if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = PathBuf::from(CONFIG_FILE_NAME);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OrderdeskError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| OrderdeskError::config(format!("failed to parse {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("config_dir"));
        assert!(toml_str.contains("extensions"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.output_dir, "output");
        assert_eq!(parsed.input.extensions, vec!["docx", "txt"]);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
output_dir = "/tmp/orderdesk-out"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.output_dir, "/tmp/orderdesk-out");
        assert_eq!(config.paths.config_dir, "config");
        assert_eq!(config.input.extensions.len(), 2);
    }

    #[test]
    fn default_template_path_under_templates_dir() {
        let config = AppConfig::default();
        assert_eq!(
            config.default_template_path(),
            PathBuf::from("templates/standard.json")
        );
    }
}
