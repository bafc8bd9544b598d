//! SQLite storage bootstrap, health check and backup.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the contact store.
//! - Apply schema migrations in deterministic order.
//! - Provide connection health checks and point-in-time file backups.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Contact data is never read or written before migrations succeed.
//! - A backup never overwrites an existing file.

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
pub use rusqlite::Connection;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    BackupTargetExists(PathBuf),
    NonUtf8Path(PathBuf),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::BackupTargetExists(path) => {
                write!(f, "backup target `{}` already exists", path.display())
            }
            Self::NonUtf8Path(path) => {
                write!(f, "path `{}` is not valid UTF-8", path.display())
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::BackupTargetExists(_)
            | Self::NonUtf8Path(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Verifies the connection can execute a trivial query.
pub fn check_connection(conn: &Connection) -> DbResult<()> {
    let one: i64 = conn.query_row("SELECT 1;", [], |row| row.get(0))?;
    if one != 1 {
        return Err(DbError::Sqlite(rusqlite::Error::InvalidQuery));
    }
    Ok(())
}

/// Writes a consistent copy of the main database to `target`.
///
/// # Errors
/// - `BackupTargetExists` when `target` is already present.
/// - `NonUtf8Path` when `target` cannot be passed to SQLite as text.
/// - `Sqlite` when the copy itself fails.
pub fn backup_to(conn: &Connection, target: impl AsRef<Path>) -> DbResult<()> {
    let target = target.as_ref();
    let started_at = Instant::now();

    if target.exists() {
        return Err(DbError::BackupTargetExists(target.to_path_buf()));
    }
    let target_text = target
        .to_str()
        .ok_or_else(|| DbError::NonUtf8Path(target.to_path_buf()))?;

    match conn.execute("VACUUM INTO ?1;", [target_text]) {
        Ok(_) => {
            info!(
                "event=db_backup module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=db_backup module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}
