//! Administration CLI for the federation site's navbar chapters.
//!
//! Each subcommand opens the SQLite database (see [`config`] for its
//! location), runs one chapter operation, and prints the result as JSON on
//! stdout. Logs go to stderr, or to a daily rolling file when
//! `FEDERATION_LOG_DIR` is set.

mod chapters;
mod config;
mod locks;
mod persistence;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use navbar::{ChapterId, ChapterUpdate, NewChapter, Page};
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chapters::ChapterService;
use persistence::sqlite::{Database, SqliteChapterRepository};

#[derive(Parser)]
#[command(name = "federation-server", about = "Manage navbar chapters of the federation site")]
struct Cli {
    /// SQLite database file. Defaults to FEDERATION_DB_PATH or the data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a chapter, appended unless a position is given.
    Create {
        #[arg(long)]
        name: String,
        /// news, gallery or documents.
        #[arg(long)]
        page: Page,
        /// 1-based bar index; later chapters shift back by one.
        #[arg(long)]
        position: Option<u32>,
    },
    /// Show one chapter.
    Get { id: i64 },
    /// Rename a chapter and/or move it within or across pages.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        page: Option<Page>,
        #[arg(long)]
        position: Option<u32>,
    },
    /// Delete a chapter and close the gap it leaves.
    Delete { id: i64 },
    /// Renumber a page; IDS must list every chapter of the page once.
    Reorder {
        #[arg(long)]
        page: Page,
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// List chapters, optionally of a single page.
    List {
        #[arg(long)]
        page: Option<Page>,
    },
    /// Show every page's navbar in display order.
    Navbar,
    /// Verify that every page is densely numbered.
    Check,
}

/// Install the global subscriber. The returned guard flushes file logs on drop.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match config::get_log_dir() {
        Some(log_dir) => {
            std::fs::create_dir_all(&log_dir).ok();
            let file_appender = tracing_appender::rolling::daily(log_dir, "federation-server");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing();

    let db_path = cli.db.unwrap_or_else(config::get_db_path);
    tracing::debug!("Using database: {}", db_path.display());

    let db = Database::open(&db_path, config::get_max_connections())
        .await
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    let service = ChapterService::new(SqliteChapterRepository::new(db.pool().clone()));

    match cli.command {
        Commands::Create {
            name,
            page,
            position,
        } => {
            let chapter = service
                .create(NewChapter {
                    name,
                    page,
                    bar_idx: position,
                })
                .await?;
            print_json(&chapter)?;
        }
        Commands::Get { id } => print_json(&service.get(ChapterId(id)).await?)?,
        Commands::Update {
            id,
            name,
            page,
            position,
        } => {
            let update = ChapterUpdate {
                name,
                page,
                bar_idx: position,
            };
            print_json(&service.update(ChapterId(id), update).await?)?;
        }
        Commands::Delete { id } => print_json(&service.delete(ChapterId(id)).await?)?,
        Commands::Reorder { page, ids } => {
            let ids: Vec<ChapterId> = ids.into_iter().map(ChapterId).collect();
            print_json(&service.reorder(page, &ids).await?)?;
        }
        Commands::List { page: Some(page) } => print_json(&service.list_by_page(page).await?)?,
        Commands::List { page: None } => print_json(&service.list().await?)?,
        Commands::Navbar => print_json(&service.navbar_order().await?)?,
        Commands::Check => {
            service.verify_all().await?;
            tracing::info!("All pages are densely numbered");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_with_position() {
        let cli = Cli::try_parse_from([
            "federation-server",
            "create",
            "--name",
            "Results",
            "--page",
            "news",
            "--position",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Create {
                name,
                page,
                position,
            } => {
                assert_eq!(name, "Results");
                assert_eq!(page, Page::News);
                assert_eq!(position, Some(2));
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_page() {
        let result = Cli::try_parse_from(["federation-server", "list", "--page", "teams"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_reorder_ids() {
        let cli = Cli::try_parse_from([
            "federation-server",
            "--db",
            "/tmp/x.db",
            "reorder",
            "--page",
            "gallery",
            "3",
            "1",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Commands::Reorder { page, ids } => {
                assert_eq!(page, Page::Gallery);
                assert_eq!(ids, vec![3, 1, 2]);
            }
            _ => panic!("expected reorder"),
        }
    }

    #[test]
    fn test_reorder_requires_ids() {
        let result = Cli::try_parse_from(["federation-server", "reorder", "--page", "news"]);
        assert!(result.is_err());
    }
}
