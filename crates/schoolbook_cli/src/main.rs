//! Schoolbook database status command.
//!
//! Loads configuration, opens (and migrates) the configured database and
//! prints the schema version plus a row count per table.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use schoolbook_core::db::migrations::current_version;
use schoolbook_core::{core_version, init_logging, open_db, open_db_in_memory, ping, CoreConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "schoolbook", version, about = "Schoolbook database status")]
struct Cli {
    /// TOML configuration file (environment overrides still apply)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("schoolbook_core ping={}", ping());
    println!("schoolbook_core version={}", core_version());

    let config = CoreConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = &config.logging.dir {
        init_logging(&config.logging.level, dir).context("failed to start logging")?;
    }

    let conn = match &config.database.path {
        Some(path) => {
            println!("database={}", path.display());
            open_db(path).with_context(|| format!("failed to open `{}`", path.display()))?
        }
        None => {
            println!("database=:memory:");
            open_db_in_memory().context("failed to open in-memory database")?
        }
    };

    println!(
        "schema_version={}",
        current_version(&conn).context("failed to read schema version")?
    );
    for table in schoolbook_core::TABLES {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
            .with_context(|| format!("failed to count rows in {table}"))?;
        println!("{table}={count}");
    }

    info!("event=cli_status module=cli status=ok");
    Ok(())
}
