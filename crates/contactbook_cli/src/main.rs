//! `contactbook` entry point.
//!
//! # Responsibility
//! - Resolve paths, start logging, open the store.
//! - Run one-shot import/export/backup requests.
//! - Hand control to the terminal UI.

use anyhow::{Context, Result};
use clap::Parser;
use contactbook_cli::batch::{import_file, run_file_ops};
use contactbook_cli::cli::Args;
use contactbook_cli::config::AppPaths;
use contactbook_cli::tui::{self, App};
use contactbook_core::db::{open_db, open_db_in_memory};
use contactbook_core::{init_logging, ContactService, SqliteContactRepository};
use log::info;

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = AppPaths::from_env(args.data_dir.as_deref())?;
    paths.ensure_data_dir()?;
    init_logging(args.log_level_or_default(), &paths.log_dir)
        .context("failed to initialize logging")?;

    let conn = if args.in_memory {
        open_db_in_memory().context("failed to open in-memory database")?
    } else {
        open_db(&paths.db_path)
            .with_context(|| format!("failed to open database `{}`", paths.db_path.display()))?
    };
    let repo = SqliteContactRepository::try_new(&conn).context("database is not usable")?;
    let service = ContactService::new(repo);

    let import_summary = match &args.import {
        Some(path) => Some(import_file(&service, path)?),
        None => None,
    };

    if args.is_batch() {
        if let Some(summary) = &import_summary {
            eprintln!("{summary}");
        }
        for message in run_file_ops(&conn, &service, &args)? {
            eprintln!("{message}");
        }
        return Ok(());
    }

    let mut app = App::new(service).context("failed to load contacts")?;
    if let Some(summary) = import_summary {
        app.set_info(summary);
    }
    tui::run(&mut app).context("terminal UI failed")?;
    info!("event=app_exit module=cli status=ok");
    Ok(())
}
