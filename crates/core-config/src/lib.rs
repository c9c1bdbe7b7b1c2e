//! Configuration loading and parsing.
//!
//! Parses `led.toml`, or an override path provided by the binary. Only
//! startup sizing lives here: initial row capacity for the document buffer
//! and initial record capacity for the edit history. Unknown fields are
//! ignored so the file format can evolve without breaking older binaries,
//! and any unreadable or unparsable file falls back to defaults.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone)]
pub struct BufferConfig {
    /// Row capacity reserved at startup before the first growth.
    #[serde(default = "BufferConfig::default_initial_rows")]
    pub initial_rows: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_rows: Self::default_initial_rows(),
        }
    }
}

impl BufferConfig {
    const fn default_initial_rows() -> usize {
        20
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Edit-record capacity reserved at startup before the first growth.
    #[serde(default = "HistoryConfig::default_initial_records")]
    pub initial_records: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            initial_records: Self::default_initial_records(),
        }
    }
}

impl HistoryConfig {
    const fn default_initial_records() -> usize {
        20
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Default, Clone)]
pub struct Config {
    /// Original file string, when one was read.
    pub raw: Option<String>,
    pub file: ConfigFile,
}

/// Best-effort config path: working-directory `led.toml` first, then the
/// platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("led.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("led").join("led.toml");
    }
    PathBuf::from("led.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(
                    target: "config",
                    path = %path.display(),
                    initial_rows = file.buffer.initial_rows,
                    initial_records = file.history.initial_records,
                    "config_loaded"
                );
                Ok(Config {
                    raw: Some(content),
                    file,
                })
            }
            Err(err) => {
                warn!(target: "config", path = %path.display(), %err, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.buffer.initial_rows, 20);
        assert_eq!(cfg.file.history.initial_records, 20);
    }

    #[test]
    fn parses_capacities() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[buffer]\ninitial_rows = 128\n[history]\ninitial_records = 64\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.buffer.initial_rows, 128);
        assert_eq!(cfg.file.history.initial_records, 64);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[buffer]\ninitial_rows = 4\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.buffer.initial_rows, 4);
        assert_eq!(cfg.file.history.initial_records, 20);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "buffer = \"not a table\"\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.buffer.initial_rows, 20);
        assert!(cfg.raw.is_none());
    }
}
