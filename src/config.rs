// ⚙️ Runtime configuration shared by the CLI, TUI and API server

use anyhow::{bail, Context, Result};
use clap::Args;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DATABASE: &str = "dataquality.db";

#[derive(Args, Debug, Clone)]
pub struct DashboardConfig {
    /// SQLite database holding the catalog, reports and flagged issues
    #[arg(long, env = "JQ_DATABASE", default_value = DEFAULT_DATABASE, global = true)]
    pub database: PathBuf,

    /// Log filter (e.g. "info", "jurisdiction_quality=debug")
    #[arg(long, env = "JQ_LOG", default_value = "info", global = true)]
    pub log_level: String,
}

impl DashboardConfig {
    /// Open the database read-only; the dashboard never writes
    pub fn open_database(&self) -> Result<Connection> {
        if !self.database.exists() {
            bail!(
                "database not found at {} (run the report generator first)",
                self.database.display()
            );
        }

        Connection::open_with_flags(&self.database, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open database {}", self.database.display()))
    }

    /// Install the global tracing subscriber (stderr, so stdout stays clean for --json/--csv)
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: DashboardConfig,
    }

    #[test]
    fn test_defaults() {
        let harness = Harness::try_parse_from(["jq"]).unwrap();

        // Env may override in CI; only check when unset
        if std::env::var_os("JQ_DATABASE").is_none() {
            assert_eq!(harness.config.database, PathBuf::from(DEFAULT_DATABASE));
        }
    }

    #[test]
    fn test_flags_override() {
        let harness =
            Harness::try_parse_from(["jq", "--database", "/tmp/x.db", "--log-level", "debug"]).unwrap();

        assert_eq!(harness.config.database, PathBuf::from("/tmp/x.db"));
        assert_eq!(harness.config.log_level, "debug");
    }

    #[test]
    fn test_missing_database_is_reported() {
        let config = DashboardConfig {
            database: PathBuf::from("/nonexistent/dir/quality.db"),
            log_level: "info".to_string(),
        };

        let err = config.open_database().unwrap_err();
        assert!(err.to_string().contains("database not found"));
    }
}
