//! Configuration management for feedharvest using the prefer crate.

pub mod browser;
mod tuning;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HarvestError;
use crate::models::RunSettings;

pub use browser::BrowserEngineConfig;
pub use tuning::LoopTuning;

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Defaults for the start request.
    #[serde(default)]
    pub run: RunSettings,
    /// Scroll loop timing.
    #[serde(default)]
    pub tuning: LoopTuning,
    /// Browser launch and profile address settings.
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    /// Directory export files are written to when no explicit path is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers feedharvest config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("feedharvest").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config file {}: {}", path.display(), e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => {
                debug!("No config file found, using defaults");
                Self::default_with_env()
            }
        }
    }

    /// Defaults with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, HarvestError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HarvestError::Config(format!("Failed to read config file: {}", e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, HarvestError> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| HarvestError::Config(format!("Failed to parse TOML config: {}", e))),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| HarvestError::Config(format!("Failed to parse YAML config: {}", e))),
            _ => serde_json::from_str(contents)
                .map_err(|e| HarvestError::Config(format!("Failed to parse JSON config: {}", e))),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// - `HARVEST_MAX_POSTS` - default post limit
    /// - `HARVEST_SCROLL_DELAY_MS` - default delay between passes
    /// - `BROWSER_URL` - remote Chrome DevTools URL
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(max) = env_number("HARVEST_MAX_POSTS") {
            self.run.max_posts = max;
        }
        if let Some(delay) = env_number("HARVEST_SCROLL_DELAY_MS") {
            self.run.scroll_delay_ms = delay;
        }
        self.browser = self.browser.with_env_overrides();
        self
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Directory for export files: `output_dir` resolved against the config
    /// file location, or the current directory.
    pub fn output_dir(&self) -> PathBuf {
        let cwd = PathBuf::from(".");
        match self.output_dir {
            Some(ref dir) => self.resolve_path(dir, &self.base_dir().unwrap_or(cwd)),
            None => cwd,
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_sections() {
        let config = Config::parse(
            r#"
            output_dir = "~/harvests"

            [run]
            max_posts = 250

            [tuning]
            silence_window_ms = 3000

            [browser]
            headless = false
            "#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.run.max_posts, 250);
        assert_eq!(config.run.scroll_delay_ms, 2000);
        assert_eq!(config.tuning.silence_window_ms, 3000);
        assert_eq!(config.tuning.poll_interval_ms, 250);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = Config::parse("run:\n  scroll_delay_ms: 800\n", "yaml").unwrap();
        assert_eq!(yaml.run.scroll_delay_ms, 800);

        let json = Config::parse(r#"{"tuning": {"nudge_px": 250}}"#, "json").unwrap();
        assert_eq!(json.tuning.nudge_px, 250.0);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        assert!(matches!(
            Config::parse("run = [", "toml"),
            Err(HarvestError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedharvest.json");
        std::fs::write(&path, r#"{"output_dir": "out"}"#).unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.output_dir(), dir.path().join("out"));
    }

    #[test]
    fn test_resolve_path() {
        let config = Config::default();
        let base = Path::new("/base");
        assert_eq!(
            config.resolve_path("/abs/file", base),
            PathBuf::from("/abs/file")
        );
        assert_eq!(config.resolve_path("rel", base), PathBuf::from("/base/rel"));
    }
}
