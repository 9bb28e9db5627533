use std::path::PathBuf;
use std::time::Duration;

use crate::ai::DEFAULT_MODEL;
use crate::db::Database;
use crate::simulator::TICK_INTERVAL;

pub const LOG_FILE: &str = "hirebot.log";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub model: String,
    pub tick_interval: Duration,
    /// Level for this crate's logs when `RUST_LOG` is unset (`HIREBOT_LOG`).
    pub log_level: Option<String>,
}

impl Config {
    pub fn resolve(db: Option<PathBuf>, model: Option<String>, interval_secs: Option<u64>) -> Self {
        Config {
            db_path: db.unwrap_or_else(Database::default_path),
            model: model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            tick_interval: interval_secs.map(Duration::from_secs).unwrap_or(TICK_INTERVAL),
            log_level: std::env::var("HIREBOT_LOG").ok().filter(|l| !l.trim().is_empty()),
        }
    }

    // Sits next to the database.
    pub fn log_path(&self) -> PathBuf {
        match self.db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(LOG_FILE),
            _ => PathBuf::from(LOG_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(None, None, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.tick_interval, TICK_INTERVAL);
        assert!(config.db_path.ends_with("hirebot.db"));
    }

    #[test]
    fn test_overrides_and_log_path() {
        let config = Config::resolve(
            Some(PathBuf::from("/tmp/hb/state.db")),
            Some("api-haiku".to_string()),
            Some(2),
        );
        assert_eq!(config.model, "api-haiku");
        assert_eq!(config.tick_interval, Duration::from_secs(2));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/hb/hirebot.log"));

        let bare = Config::resolve(Some(PathBuf::from("state.db")), Some("  ".to_string()), None);
        assert_eq!(bare.model, DEFAULT_MODEL);
        assert_eq!(bare.log_path(), PathBuf::from(LOG_FILE));
    }
}
