//! Command-line arguments.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Appliance-parts help desk: answers part, compatibility, installation and
/// order questions from a product catalog.
#[derive(Parser, Debug)]
#[command(name = "partdesk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Product catalog (JSON array). Overrides `general.catalog_path`.
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Training conversations (JSON array). Overrides `general.training_path`.
    #[arg(long = "training")]
    pub training: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Session id to use instead of a fresh one.
    #[arg(short = 's', long = "session")]
    pub session: Option<String>,

    /// Answer a single question and exit.
    #[arg(short = 'a', long = "ask")]
    pub ask: Option<String>,

    /// Print replies as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

impl CliArgs {
    /// Priority: --config flag > PARTDESK_CONFIG env var > ~/.partdesk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARTDESK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    pub fn resolve_catalog_path(&self, config_path: &str) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }

    pub fn resolve_training_path(&self, config_path: &str) -> PathBuf {
        self.training
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".partdesk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".partdesk").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_values() {
        let args = CliArgs::try_parse_from([
            "partdesk",
            "--catalog",
            "/tmp/parts.json",
            "--log-level",
            "debug",
            "--ask",
            "does PS12345 fit ABC123",
            "--json",
        ])
        .unwrap();
        assert_eq!(
            args.resolve_catalog_path("data/products.json"),
            PathBuf::from("/tmp/parts.json")
        );
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(args.ask.as_deref(), Some("does PS12345 fit ABC123"));
        assert!(args.json);
    }

    #[test]
    fn test_config_values_used_without_flags() {
        let args = CliArgs::try_parse_from(["partdesk"]).unwrap();
        assert_eq!(
            args.resolve_training_path("data/training_conversations.json"),
            PathBuf::from("data/training_conversations.json")
        );
        assert_eq!(args.resolve_log_level("warn"), "warn");
        assert!(args.session.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs::try_parse_from(["partdesk", "-c", "/etc/partdesk.toml"]).unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/partdesk.toml"));
    }
}
