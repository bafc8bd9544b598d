//! One-shot file operations run from the command line.
//!
//! # Invariants
//! - An import always runs before backup and export, so
//!   `--import a.json --export b.json` converts in one call.
//! - Backup runs before export.

use crate::cli::Args;
use anyhow::{Context, Result};
use contactbook_core::db::{backup_to, Connection};
use contactbook_core::{
    export_json_file, import_json_file, ContactRepository, ContactService, ImportReport,
};
use log::warn;
use std::path::Path;

/// Imports `path` and returns a one-line summary for the user.
pub fn import_file<R: ContactRepository>(
    service: &ContactService<R>,
    path: &Path,
) -> Result<String> {
    let report = import_json_file(service, path)
        .with_context(|| format!("failed to import `{}`", path.display()))?;
    for skipped in &report.skipped {
        warn!(
            "event=import_skip module=cli index={} reason={}",
            skipped.index, skipped.reason
        );
    }
    Ok(summarize_import(&report))
}

/// Runs the `--backup` and `--export` requests in `args`.
///
/// Returns one message per completed operation.
pub fn run_file_ops<R: ContactRepository>(
    conn: &Connection,
    service: &ContactService<R>,
    args: &Args,
) -> Result<Vec<String>> {
    let mut messages = Vec::new();
    if let Some(target) = &args.backup {
        backup_to(conn, target)
            .with_context(|| format!("failed to back up to `{}`", target.display()))?;
        messages.push(format!("Backup written to {}", target.display()));
    }
    if let Some(target) = &args.export {
        export_json_file(service, target)
            .with_context(|| format!("failed to export to `{}`", target.display()))?;
        messages.push(format!("Contacts exported to {}", target.display()));
    }
    Ok(messages)
}

fn summarize_import(report: &ImportReport) -> String {
    if report.skipped.is_empty() {
        format!("Imported {} contacts", report.imported.len())
    } else {
        format!(
            "Imported {} contacts, skipped {} invalid records (see log)",
            report.imported.len(),
            report.skipped.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{import_file, run_file_ops};
    use crate::cli::Args;
    use clap::Parser;
    use contactbook_core::db::open_db_in_memory;
    use contactbook_core::{ContactService, SqliteContactRepository};

    #[test]
    fn import_then_export_writes_imported_contacts_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        std::fs::write(
            &input,
            r#"[
                {"name": "Ann", "phone": "555-0100"},
                {"name": "", "phone": "1"},
                {"name": "Bob", "phone": "555-0101", "notes": "met at work"}
            ]"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "contactbook",
            "--import",
            input.to_str().unwrap(),
            "--export",
            output.to_str().unwrap(),
        ])
        .unwrap();
        let conn = open_db_in_memory().unwrap();
        let service = ContactService::new(SqliteContactRepository::try_new(&conn).unwrap());

        let summary = import_file(&service, args.import.as_deref().unwrap()).unwrap();
        assert_eq!(summary, "Imported 2 contacts, skipped 1 invalid records (see log)");

        let messages = run_file_ops(&conn, &service, &args).unwrap();
        assert_eq!(messages.len(), 1);

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let names: Vec<&str> = exported
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
        assert_eq!(exported[1]["notes"], "met at work");
    }

    #[test]
    fn backup_refuses_existing_target_before_export() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("copy.sqlite3");
        let output = dir.path().join("out.json");
        std::fs::write(&backup, b"taken").unwrap();

        let args = Args::try_parse_from([
            "contactbook",
            "--backup",
            backup.to_str().unwrap(),
            "--export",
            output.to_str().unwrap(),
        ])
        .unwrap();
        let conn = open_db_in_memory().unwrap();
        let service = ContactService::new(SqliteContactRepository::try_new(&conn).unwrap());

        let err = run_file_ops(&conn, &service, &args).unwrap_err();
        assert!(err.to_string().contains("failed to back up"));
        assert!(!output.exists());
    }
}
