//! Filesystem locations used by the binary.
//!
//! # Responsibility
//! - Pick the data directory: flag, then `CONTACTBOOK_HOME`, then
//!   `~/.contacts-tui`.
//! - Derive the database and log paths from it.
//!
//! # Invariants
//! - All returned paths are absolute.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const HOME_ENV_VAR: &str = "CONTACTBOOK_HOME";
pub const DEFAULT_DIR_NAME: &str = ".contacts-tui";
pub const DB_FILE_NAME: &str = "contacts.sqlite3";
pub const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// Resolves paths from the process environment.
    pub fn from_env(data_dir_flag: Option<&Path>) -> Result<Self> {
        Self::resolve(
            data_dir_flag,
            std::env::var_os(HOME_ENV_VAR),
            dirs::home_dir(),
        )
    }

    pub fn resolve(
        data_dir_flag: Option<&Path>,
        env_home: Option<OsString>,
        user_home: Option<PathBuf>,
    ) -> Result<Self> {
        let data_dir = match (data_dir_flag, env_home.filter(|v| !v.is_empty()), user_home) {
            (Some(flag), _, _) => flag.to_path_buf(),
            (None, Some(env_home), _) => PathBuf::from(env_home),
            (None, None, Some(home)) => home.join(DEFAULT_DIR_NAME),
            (None, None, None) => bail!(
                "cannot determine a home directory; pass --data-dir or set {HOME_ENV_VAR}"
            ),
        };
        let data_dir = std::path::absolute(&data_dir)
            .with_context(|| format!("cannot resolve data dir `{}`", data_dir.display()))?;

        Ok(Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            data_dir,
        })
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("cannot create data dir `{}`", self.data_dir.display()))
    }
}
