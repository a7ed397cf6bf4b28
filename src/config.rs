//! netsample configuration persistence (htoprc-style key=value format)
//!
//! Lives at `%APPDATA%/netsample/netsamplerc` on Windows and
//! `$XDG_CONFIG_HOME/netsample/netsamplerc` (or `~/.config/...`) elsewhere.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, SampleError};

const CONFIG_DIR: &str = "netsample";
const CONFIG_FILE: &str = "netsamplerc";

/// Default config file path, if a config home can be determined
pub fn config_path() -> Option<PathBuf> {
    let base = if cfg!(windows) {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
    };
    base.map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Persistable settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetsampleConfig {
    /// Throughput measurement window
    pub window_ms: u64,
    /// Pause between throughput samples in the monitor
    pub speed_interval_ms: u64,
    /// Pause between per-uid reads in the monitor
    pub usage_interval_ms: u64,
    /// uid whose traffic is tracked
    pub uid: Option<u32>,
    pub include_loopback: bool,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for NetsampleConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000,
            speed_interval_ms: 3000,
            usage_interval_ms: 500,
            uid: None,
            include_loopback: false,
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl NetsampleConfig {
    /// Load from the default location, returning defaults if there is none
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded config");
                Ok(Self::parse(&content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_window_ms(&mut self, ms: u64) {
        self.window_ms = ms.clamp(100, 10_000);
    }

    pub fn set_speed_interval_ms(&mut self, ms: u64) {
        self.speed_interval_ms = ms.clamp(200, 60_000);
    }

    pub fn set_usage_interval_ms(&mut self, ms: u64) {
        self.usage_interval_ms = ms.clamp(100, 60_000);
    }

    /// Parse rc content. Unknown keys and unparseable values are ignored.
    /// Intervals are clamped to sane ranges.
    pub fn parse(content: &str) -> Self {
        let mut cfg = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "window_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.set_window_ms(v);
                    }
                }
                "speed_interval_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.set_speed_interval_ms(v);
                    }
                }
                "usage_interval_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        cfg.set_usage_interval_ms(v);
                    }
                }
                "uid" => {
                    if value.is_empty() {
                        cfg.uid = None;
                    } else if let Ok(v) = value.parse::<u32>() {
                        cfg.uid = Some(v);
                    }
                }
                "include_loopback" => cfg.include_loopback = value == "1",
                "log_level" => {
                    if !value.is_empty() {
                        cfg.log_level = value.to_string();
                    }
                }
                "log_dir" => {
                    cfg.log_dir = (!value.is_empty()).then(|| PathBuf::from(value));
                }
                _ => {} // Ignore unknown keys
            }
        }

        cfg
    }

    /// Render as rc file content
    pub fn render(&self) -> String {
        let b = |v: bool| if v { "1" } else { "0" };

        let mut lines = vec![
            "# netsample configuration file".to_string(),
            String::new(),
            format!("window_ms={}", self.window_ms),
            format!("speed_interval_ms={}", self.speed_interval_ms),
            format!("usage_interval_ms={}", self.usage_interval_ms),
            format!("uid={}", self.uid.map(|u| u.to_string()).unwrap_or_default()),
            format!("include_loopback={}", b(self.include_loopback)),
            format!("log_level={}", self.log_level),
        ];
        lines.push(format!(
            "log_dir={}",
            self.log_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default()
        ));

        lines.join("\n") + "\n"
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        let path = config_path()
            .ok_or_else(|| SampleError::Config("could not determine config path".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn speed_interval(&self) -> Duration {
        Duration::from_millis(self.speed_interval_ms)
    }

    pub fn usage_interval(&self) -> Duration {
        Duration::from_millis(self.usage_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = NetsampleConfig::default();
        assert_eq!(cfg.window(), Duration::from_millis(1000));
        assert_eq!(cfg.speed_interval(), Duration::from_millis(3000));
        assert_eq!(cfg.usage_interval(), Duration::from_millis(500));
        assert_eq!(cfg.uid, None);
        assert!(!cfg.include_loopback);
    }

    #[test]
    fn test_parse_values() {
        let cfg = NetsampleConfig::parse(
            "# comment\n\
             window_ms = 2000\n\
             uid=10123\n\
             include_loopback=1\n\
             log_level=debug\n\
             log_dir=/var/log/netsample\n\
             unknown=7\n",
        );
        assert_eq!(cfg.window_ms, 2000);
        assert_eq!(cfg.uid, Some(10123));
        assert!(cfg.include_loopback);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.log_dir, Some(PathBuf::from("/var/log/netsample")));
        assert_eq!(cfg.speed_interval_ms, 3000);
    }

    #[test]
    fn test_parse_clamps_and_ignores_garbage() {
        let cfg = NetsampleConfig::parse(
            "window_ms=5\nspeed_interval_ms=999999\nusage_interval_ms=abc\nuid=-3\nnot a pair\n",
        );
        assert_eq!(cfg.window_ms, 100);
        assert_eq!(cfg.speed_interval_ms, 60_000);
        assert_eq!(cfg.usage_interval_ms, 500);
        assert_eq!(cfg.uid, None);
    }

    #[test]
    fn test_setters_clamp_like_parse() {
        let mut cfg = NetsampleConfig::default();
        cfg.set_window_ms(1);
        cfg.set_speed_interval_ms(u64::MAX);
        cfg.set_usage_interval_ms(0);
        let parsed = NetsampleConfig::parse(
            "window_ms=1\nspeed_interval_ms=18446744073709551615\nusage_interval_ms=0\n",
        );
        assert_eq!(cfg, parsed);
        assert_eq!(cfg.window_ms, 100);
        assert_eq!(cfg.speed_interval_ms, 60_000);
        assert_eq!(cfg.usage_interval_ms, 100);

        cfg.set_window_ms(2500);
        assert_eq!(cfg.window(), Duration::from_millis(2500));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = NetsampleConfig::load_from(&dir.path().join("nope")).unwrap();
        assert_eq!(cfg, NetsampleConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let cfg = NetsampleConfig {
            uid: Some(42),
            include_loopback: true,
            log_dir: Some(PathBuf::from("logs")),
            ..NetsampleConfig::default()
        };

        cfg.save_to(&path).unwrap();
        assert_eq!(NetsampleConfig::load_from(&path).unwrap(), cfg);
    }
}
