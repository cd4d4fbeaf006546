use bar_core::{DisplayOptions, PageSettings};
use chrono::{FixedOffset, Offset, TimeDelta, Utc};
use serde::Deserialize;
use std::env;
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_true() -> bool { true }

#[derive(Debug, Deserialize, Clone)]
pub struct GridConfig {
    pub page_size: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Offset applied to visitor timestamps, in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { utc_offset_minutes: 180 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub dismiss_after_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { dismiss_after_ms: 3000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Per-subscriber backlog before it starts lagging.
    pub buffer: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { buffer: 64 }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(env_source())
            .build()?;

        s.try_deserialize()
    }

    /// Grid settings shared by both admin views.
    pub fn page_settings(&self) -> PageSettings {
        let offset_secs = self.display.utc_offset_minutes.saturating_mul(60);
        let local_offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| {
            warn!(
                minutes = self.display.utc_offset_minutes,
                "Display offset out of range, falling back to UTC"
            );
            Utc.fix()
        });

        PageSettings {
            page_size: self.grid.page_size.max(1),
            display: DisplayOptions { local_offset },
            dismiss_after: TimeDelta::milliseconds(
                i64::try_from(self.notifications.dismiss_after_ms).unwrap_or(i64::MAX),
            ),
        }
    }
}

/// Eg.. `BAR_ADMIN__DATABASE__URL=postgres://...`, `BAR_ADMIN__GRID__PAGE_SIZE=25`
fn env_source() -> config::Environment {
    config::Environment::with_prefix("BAR_ADMIN").separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_optional_sections_default() {
        let cfg: Config = config::Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                port = 8080

                [database]
                url = "postgres://localhost/bar"
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.grid.page_size, 10);
        assert_eq!(cfg.display.utc_offset_minutes, 180);
        assert_eq!(cfg.notifications.dismiss_after_ms, 3000);
        assert_eq!(cfg.database.max_connections, 5);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.feed.buffer, 64);

        let settings = cfg.page_settings();
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.display.local_offset.local_minus_utc(), 180 * 60);
        assert_eq!(settings.dismiss_after, TimeDelta::milliseconds(3000));
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let cfg: Config = config::Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                port = 8080

                [database]
                url = "postgres://localhost/bar"

                [display]
                utc_offset_minutes = 100000
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.page_settings().display.local_offset.local_minus_utc(), 0);
    }

    #[test]
    fn test_env_overrides_use_double_underscore() {
        let vars: config::Map<String, String> = [
            ("BAR_ADMIN__DATABASE__URL", "postgres://db.internal/bar"),
            ("BAR_ADMIN__SERVER__PORT", "9090"),
            ("BAR_ADMIN__GRID__PAGE_SIZE", "25"),
            ("BAR_ADMIN_DATABASE__URL", "postgres://wrong/bar"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg: Config = config::Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                port = 8080

                [database]
                url = "postgres://localhost/bar"
                "#,
                FileFormat::Toml,
            ))
            .add_source(env_source().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.database.url, "postgres://db.internal/bar");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.grid.page_size, 25);
    }
}
