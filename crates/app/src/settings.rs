//! Settings of the `moneta` binary.
//!
//! Read once at startup from a TOML file (`config/moneta.toml` unless
//! `--config` says otherwise) and `MONETA__*` environment variables, e.g.
//! `MONETA__SERVER__PORT=8080`.

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/moneta";

#[derive(Debug, Parser)]
#[command(name = "moneta", version)]
struct Args {
    /// Config file path (TOML), extension optional.
    #[arg(long, env = "MONETA_CONFIG")]
    config: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// IANA name, defaults to UTC.
    pub timezone: Option<String>,
    pub trend_months: Option<usize>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Receipt {
    pub api_key: String,
    pub endpoint: Option<String>,
}

impl Server {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        match self.timezone.as_deref() {
            None => Ok(Tz::UTC),
            Some(name) => name
                .parse()
                .map_err(|_| ConfigError::Message(format!("unknown timezone '{name}'"))),
        }
    }

    pub fn address(&self) -> String {
        let bind = self.bind.as_deref().unwrap_or("127.0.0.1");
        format!("{bind}:{}", self.port)
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        Self::from_config(
            Config::builder()
                .add_source(File::with_name(path).required(false))
                .add_source(
                    Environment::with_prefix("MONETA")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.server.timezone()?;
        Ok(settings)
    }

    #[cfg(test)]
    fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::from_str(raw, config::FileFormat::Toml))
                .build()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file_is_read() {
        let settings = Settings::from_toml(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 8080
            database = { sqlite = "moneta.db" }
            timezone = "Asia/Ho_Chi_Minh"
            trend_months = 12

            [receipt]
            api_key = "key"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.address(), "0.0.0.0:8080");
        assert_eq!(
            settings.server.database,
            Database::Sqlite("moneta.db".to_string())
        );
        assert_eq!(
            settings.server.timezone().unwrap(),
            chrono_tz::Asia::Ho_Chi_Minh
        );
        assert_eq!(settings.server.trend_months, Some(12));
        assert_eq!(settings.receipt.unwrap().endpoint, None);
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 3000
            database = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.address(), "127.0.0.1:3000");
        assert_eq!(settings.server.database, Database::Memory);
        assert_eq!(settings.server.timezone().unwrap(), Tz::UTC);
        assert!(settings.receipt.is_none());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = Settings::from_toml(
            r#"
            [server]
            port = 3000
            database = "memory"
            timezone = "Mars/Olympus"
            "#,
        );
        assert!(err.is_err());
    }
}
