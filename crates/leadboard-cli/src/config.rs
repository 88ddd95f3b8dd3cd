//! Settings resolution.
//!
//! Priority order, highest first:
//! 1. Command-line flag (clap also fills these from `LEADBOARD_*` variables)
//! 2. TOML config file (`leadboard.toml`, or the path given by `--config`)
//! 3. Built-in default

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use leadboard_sync::{SavePolicy, ScorePolicy};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "leadboard.toml";
pub const ENDPOINT_ENV: &str = "LEADBOARD_ENDPOINT";
pub const CONFIG_ENV: &str = "LEADBOARD_CONFIG";

/// Contents of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub save_policy: Option<SavePolicy>,
    pub score_policy: Option<ScorePolicy>,
    pub search_notes: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read `path`, or the default file when `path` is `None`.
    ///
    /// A missing default file yields an empty config; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub save_policy: SavePolicy,
    pub score_policy: ScorePolicy,
    pub search_notes: bool,
    pub timeout: Option<Duration>,
}

impl Settings {
    pub fn resolve(cli_endpoint: Option<String>, file: FileConfig) -> anyhow::Result<Self> {
        let endpoint = cli_endpoint
            .or(file.endpoint)
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        let Some(endpoint) = endpoint else {
            bail!(
                "no sheet endpoint configured: pass --endpoint, set {ENDPOINT_ENV}, \
                 or add `endpoint` to {DEFAULT_CONFIG_FILE}"
            );
        };

        Ok(Self {
            endpoint,
            save_policy: file.save_policy.unwrap_or_default(),
            score_policy: file.score_policy.unwrap_or_default(),
            search_notes: file.search_notes.unwrap_or(false),
            timeout: file.timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_file() {
        let file = FileConfig::parse(
            r#"
            endpoint = "https://sheets.example.com/exec"
            save_policy = "revert"
            score_policy = "manual"
            search_notes = true
            timeout_secs = 20
            "#,
        )
        .unwrap();
        assert_eq!(file.save_policy, Some(SavePolicy::Revert));
        assert_eq!(file.score_policy, Some(ScorePolicy::Manual));

        let settings = Settings::resolve(None, file).unwrap();
        assert_eq!(settings.endpoint, "https://sheets.example.com/exec");
        assert!(settings.search_notes);
        assert_eq!(settings.timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn flag_beats_file() {
        let file = FileConfig {
            endpoint: Some("https://file.example.com".into()),
            ..Default::default()
        };
        let settings = Settings::resolve(Some("https://flag.example.com".into()), file).unwrap();
        assert_eq!(settings.endpoint, "https://flag.example.com");
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::resolve(Some("http://localhost".into()), FileConfig::default())
            .unwrap();
        assert_eq!(settings.save_policy, SavePolicy::Keep);
        assert_eq!(settings.score_policy, ScorePolicy::Recompute);
        assert!(!settings.search_notes);
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn missing_endpoint_is_error() {
        let err = Settings::resolve(None, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no sheet endpoint"));
        assert!(Settings::resolve(Some("  ".into()), FileConfig::default()).is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(FileConfig::parse("endpont = \"x\"").is_err());
        assert!(FileConfig::parse("save_policy = \"sometimes\"").is_err());
    }

    #[test]
    fn missing_explicit_file_is_error() {
        assert!(FileConfig::load(Some(Path::new("/nonexistent/leadboard.toml"))).is_err());
    }
}
