use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "/etc/probed/probed.toml";
const ENV_CONFIG_PATH: &str = "PROBED_CONFIG";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub probes: ProbesConfig,
}

impl Config {
    /// Load configuration from file. The path can be overridden with the
    /// `PROBED_CONFIG` environment variable. If the file is missing or
    /// fails to parse, defaults are returned.
    pub fn load() -> Self {
        let path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = PathBuf::from(path);
        match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
            Err(_) => Config::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Capacity of the aggregator's bounded outbound queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// When false (default) a full queue applies back-pressure to the
    /// producing pump. When true, the pump drops the event instead of
    /// blocking and increments that probe's dropped counter.
    #[serde(default = "default_lossy_drop")]
    pub lossy_drop: bool,
    /// Policy applied when k8s enrichment fails for a record: drop the
    /// event entirely (default) vs emit it with the Kubernetes field omitted.
    #[serde(default = "default_drop_on_enrich_failure")]
    pub drop_on_enrich_failure: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            lossy_drop: default_lossy_drop(),
            drop_on_enrich_failure: default_drop_on_enrich_failure(),
        }
    }
}

fn default_queue_capacity() -> usize {
    4096
}
fn default_lossy_drop() -> bool {
    false
}
fn default_drop_on_enrich_failure() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbesConfig {
    /// Enable the networking probes (socket/bind/connect/accept/listen).
    #[serde(default = "default_enable_net")]
    pub enable_net: bool,
    /// Enable the high-frequency file I/O probes (read/write/readv/writev).
    #[serde(default = "default_enable_io")]
    pub enable_io: bool,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            enable_net: default_enable_net(),
            enable_io: default_enable_io(),
        }
    }
}

fn default_enable_net() -> bool {
    true
}
fn default_enable_io() -> bool {
    false // disabled by default for production - too high frequency
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_config_defaults() {
        let toml = r#"[runtime]
queue_capacity = 4096
lossy_drop = false
drop_on_enrich_failure = true
[logging]
level = "info"
[probes]
enable_net = true
enable_io = false
"#;
        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.runtime.queue_capacity, 4096);
        assert!(!cfg.runtime.lossy_drop);
        assert!(cfg.runtime.drop_on_enrich_failure);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.probes.enable_net);
        assert!(!cfg.probes.enable_io);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("[runtime]\nlossy_drop = true\n").unwrap();
        assert!(cfg.runtime.lossy_drop);
        assert_eq!(cfg.runtime.queue_capacity, default_queue_capacity());
    }

    #[test]
    fn env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[runtime]\nqueue_capacity = 16").unwrap();
        unsafe {
            std::env::set_var(ENV_CONFIG_PATH, file.path());
        }
        let cfg = Config::load();
        assert_eq!(cfg.runtime.queue_capacity, 16);
        unsafe {
            std::env::remove_var(ENV_CONFIG_PATH);
        }
    }

    #[test]
    fn unreadable_path_falls_back_to_defaults() {
        unsafe {
            std::env::set_var(ENV_CONFIG_PATH, "/nonexistent/probed.toml");
        }
        let cfg = Config::load();
        assert_eq!(cfg.runtime.queue_capacity, default_queue_capacity());
        unsafe {
            std::env::remove_var(ENV_CONFIG_PATH);
        }
    }
}
