//! Opening connections for the contact store.
//!
//! # Invariants
//! - A connection is handed out only after migrations succeed.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the database file at `path` and migrates it.
///
/// The parent directory must already exist.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    prepare("file", || Connection::open(path))
}

/// Opens a migrated in-memory database; contents vanish on drop.
pub fn open_db_in_memory() -> DbResult<Connection> {
    prepare("memory", Connection::open_in_memory)
}

fn prepare(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();

    let outcome = connect().map_err(DbError::from).and_then(|mut conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let applied = apply_migrations(&mut conn)?;
        Ok((conn, applied))
    });

    let elapsed_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok((conn, applied)) => {
            info!(
                "event=db_open module=db status=ok mode={mode} migrations_applied={applied} duration_ms={elapsed_ms}"
            );
            Ok(conn)
        }
        Err(err) => {
            error!("event=db_open module=db status=error mode={mode} duration_ms={elapsed_ms} error={err}");
            Err(err)
        }
    }
}
