//! JSON import/export of the contact list.
//!
//! # Responsibility
//! - Serialize all contacts as a pretty-printed JSON array.
//! - Import such arrays through the regular `add_contact` validation path.
//!
//! # Invariants
//! - Export preserves insertion order.
//! - A bad record is skipped and reported; it never aborts the import.
//! - Imported contacts always receive fresh identities.

use crate::model::contact::{format_timestamp, Contact, ContactDraft, ContactId};
use crate::repo::contact_repo::ContactRepository;
use crate::service::contact_service::{ContactService, ContactServiceError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Wire shape of one contact in the JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// ISO-8601 local timestamp, e.g. `2023-05-17T10:00:00`.
    #[serde(default)]
    pub last_contacted: Option<String>,
}

impl From<&Contact> for ContactRecord {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            notes: contact.notes.clone(),
            last_contacted: contact.last_contacted.map(format_timestamp),
        }
    }
}

impl From<ContactRecord> for ContactDraft {
    fn from(record: ContactRecord) -> Self {
        Self {
            name: record.name,
            phone: record.phone,
            email: record.email,
            notes: record.notes,
            last_contacted: record.last_contacted,
        }
    }
}

/// One record that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Zero-based position in the input array.
    pub index: usize,
    pub reason: String,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Ids of created contacts, in input order.
    pub imported: Vec<ContactId>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug)]
pub enum TransferError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Service(ContactServiceError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Parse(err) => write!(f, "invalid contacts JSON: {err}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Service(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<ContactServiceError> for TransferError {
    fn from(value: ContactServiceError) -> Self {
        Self::Service(value)
    }
}

/// Renders all contacts as a pretty-printed JSON array.
pub fn export_json<R: ContactRepository>(
    service: &ContactService<R>,
) -> Result<String, TransferError> {
    let records = service
        .list_contacts()?
        .iter()
        .map(ContactRecord::from)
        .collect::<Vec<_>>();
    let mut json = serde_json::to_string_pretty(&records)?;
    json.push('\n');
    info!(
        "event=contacts_export module=transfer status=ok count={}",
        records.len()
    );
    Ok(json)
}

/// Writes `export_json` output to `path`, replacing any existing file.
pub fn export_json_file<R: ContactRepository>(
    service: &ContactService<R>,
    path: impl AsRef<Path>,
) -> Result<(), TransferError> {
    let path = path.as_ref();
    let json = export_json(service)?;
    std::fs::write(path, json).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Imports a JSON array of contact records.
///
/// Records that do not match the wire shape or fail validation are skipped
/// and listed in the report. Storage failures abort the import.
///
/// # Errors
/// - `Parse` when `json` is not an array.
/// - `Service` when persistence fails.
pub fn import_json<R: ContactRepository>(
    service: &ContactService<R>,
    json: &str,
) -> Result<ImportReport, TransferError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut report = ImportReport::default();

    for (index, value) in values.into_iter().enumerate() {
        let record = match serde_json::from_value::<ContactRecord>(value) {
            Ok(record) => record,
            Err(err) => {
                report.skipped.push(SkippedRecord {
                    index,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        match service.add_contact(&ContactDraft::from(record)) {
            Ok(contact) => report.imported.push(contact.id),
            Err(ContactServiceError::Validation(err)) => report.skipped.push(SkippedRecord {
                index,
                reason: err.to_string(),
            }),
            Err(other) => return Err(other.into()),
        }
    }

    if report.skipped.is_empty() {
        info!(
            "event=contacts_import module=transfer status=ok imported={}",
            report.imported.len()
        );
    } else {
        warn!(
            "event=contacts_import module=transfer status=partial imported={} skipped={}",
            report.imported.len(),
            report.skipped.len()
        );
    }
    Ok(report)
}

/// Reads `path` and runs `import_json` on its contents.
pub fn import_json_file<R: ContactRepository>(
    service: &ContactService<R>,
    path: impl AsRef<Path>,
) -> Result<ImportReport, TransferError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import_json(service, &json)
}
