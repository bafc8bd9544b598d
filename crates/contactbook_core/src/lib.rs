//! Core domain logic for the contact book.
//! This crate is the single source of truth for contact invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;

pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::contact::{
    format_timestamp, parse_timestamp, Contact, ContactDraft, ContactField, ContactId,
    ContactValidationError, FieldIssue, FieldProblem,
};
pub use repo::contact_repo::{
    ContactListQuery, ContactOrder, ContactRepository, RepoError, RepoResult,
    SqliteContactRepository,
};
pub use service::contact_service::{ContactService, ContactServiceError, ServiceResult};
pub use transfer::{
    export_json, export_json_file, import_json, import_json_file, ContactRecord, ImportReport,
    SkippedRecord, TransferError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
