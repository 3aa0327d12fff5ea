//! CLI entry point.
//!
//! # Responsibility
//! - Print core linkage info (`crm_cli`).
//! - Export contacts from a local record store
//!   (`crm_cli export <db_path> <out_dir>`).
//!
//! File logging starts when `--log-dir` / `CRM_LOG_DIR` names an absolute
//! directory.

use clap::{Parser, Subcommand};
use crm_core::{CrmClient, LogNotifier, SqliteRecordStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// CRM record access tools.
#[derive(Parser, Debug)]
#[command(name = "crm_cli", version)]
struct Cli {
    /// Directory for rolling log files
    #[arg(long, env = "CRM_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CRM_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write every contact of a local store to a dated CSV file
    Export {
        /// SQLite record store file
        db_path: PathBuf,
        /// Directory receiving the CSV file
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or_else(|| crm_core::default_log_level());
        if let Err(err) = crm_core::init_logging(level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match cli.command {
        None => {
            println!("crm_core ping={}", crm_core::ping());
            println!("crm_core version={}", crm_core::core_version());
            ExitCode::SUCCESS
        }
        Some(Command::Export { db_path, out_dir }) => match export(&db_path, &out_dir) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("export failed: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

fn export(db_path: &Path, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteRecordStore::open(db_path)?;
    let client = CrmClient::new(store, Arc::new(LogNotifier));

    let (contacts, companies) =
        read_concurrently(|| client.contacts().list(), || client.companies().list())?;

    let summary = client
        .contacts()
        .bulk_export(&contacts, &companies, out_dir)?;
    log::info!(
        "event=cli_export module=cli status=ok count={} companies={}",
        summary.count,
        companies.len()
    );
    println!(
        "exported {} contacts to {}",
        summary.count,
        summary.path.display()
    );
    client.shutdown();
    Ok(())
}

/// Runs two independent reads at once; a panicking reader is an error.
fn read_concurrently<A, B>(
    first: impl FnOnce() -> A,
    second: impl FnOnce() -> B + Send,
) -> Result<(A, B), &'static str>
where
    B: Send,
{
    std::thread::scope(|scope| {
        let second = scope.spawn(second);
        let first = first();
        second
            .join()
            .map(|second| (first, second))
            .map_err(|_| "concurrent reader panicked")
    })
}

#[cfg(test)]
mod tests {
    use super::{read_concurrently, Cli, Command};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_takes_db_path_and_out_dir() {
        let cli = Cli::try_parse_from(["crm_cli", "export", "crm.db", "out"]).unwrap();
        match cli.command {
            Some(Command::Export { db_path, out_dir }) => {
                assert_eq!(db_path, PathBuf::from("crm.db"));
                assert_eq!(out_dir, PathBuf::from("out"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn export_rejects_extra_arguments() {
        assert!(Cli::try_parse_from(["crm_cli", "export", "a", "b", "c"]).is_err());
    }

    #[test]
    fn no_subcommand_prints_linkage_info() {
        let cli = Cli::try_parse_from(["crm_cli", "--log-dir", "/tmp/crm-logs"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/crm-logs")));
    }

    #[test]
    fn panicking_reader_fails_instead_of_yielding_empty() {
        let result = read_concurrently(|| vec![1], || -> Vec<i32> { panic!("reader failed") });
        assert_eq!(result, Err("concurrent reader panicked"));
    }

    #[test]
    fn concurrent_reads_keep_their_order() {
        let result = read_concurrently(|| "contacts", || "companies");
        assert_eq!(result, Ok(("contacts", "companies")));
    }
}
