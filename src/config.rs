use crate::fragment::{DEFAULT_FRAGLEN, DEFAULT_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default pause between replayed datagrams, in milliseconds.
pub const DEFAULT_REPLAY_DELAY_MS: u64 = 250;

fn empty_path_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(opt.and_then(|path| {
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detect: DetectConfig,
    pub repair: RepairConfig,
    pub replay: ReplayConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    pub fraglen: usize,
    /// Lookback window of the detector.
    pub number: usize,
    pub exclude_newest: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        DetectConfig {
            fraglen: DEFAULT_FRAGLEN,
            number: DEFAULT_WINDOW,
            exclude_newest: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub fraglen: usize,
    pub window: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        RepairConfig {
            fraglen: DEFAULT_FRAGLEN,
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub delay_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            delay_ms: DEFAULT_REPLAY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(deserialize_with = "empty_path_none")]
    pub report_json: Option<PathBuf>,
    /// Suppress per-fragment lines and the replay progress bar.
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.detect.fraglen, 7);
        assert_eq!(config.detect.number, 10);
        assert!(!config.detect.exclude_newest);
        assert_eq!(config.repair.window, 10);
        assert_eq!(config.replay.delay_ms, 250);
        assert!(config.output.report_json.is_none());
        assert!(!config.output.quiet);
    }

    #[test]
    fn sections_override_defaults() {
        let raw = r#"
            [detect]
            fraglen = 12
            exclude_newest = true

            [repair]
            window = 4

            [output]
            report_json = "report.json"
            quiet = true
        "#;
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.detect.fraglen, 12);
        assert_eq!(config.detect.number, 10);
        assert!(config.detect.exclude_newest);
        assert_eq!(config.repair.fraglen, 7);
        assert_eq!(config.repair.window, 4);
        assert_eq!(
            config.output.report_json.as_deref(),
            Some(Path::new("report.json"))
        );
        assert!(config.output.quiet);
    }

    #[test]
    fn empty_report_path_means_none() {
        let config = Config::parse("[output]\nreport_json = \"\"\n").unwrap();
        assert!(config.output.report_json.is_none());
    }

    #[test]
    fn rejects_bad_types() {
        let err = Config::parse("[detect]\nfraglen = \"seven\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
