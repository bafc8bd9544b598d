//! Contact domain model and field validation.
//!
//! # Responsibility
//! - Define the canonical `Contact` record and its unvalidated `ContactDraft`.
//! - Turn drafts into contacts through one pure validation path.
//!
//! # Invariants
//! - A `Contact` always has a non-blank `name` and `phone`.
//! - Text fields are stored trimmed; blank optional fields are `None`.
//! - `id` is stable and never reused for another contact.
//! - Validation reports every invalid field, not only the first one.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a contact.
pub type ContactId = Uuid;

pub const NAME_MAX_CHARS: usize = 100;
pub const PHONE_MAX_CHARS: usize = 20;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const NOTES_MAX_CHARS: usize = 1000;

/// Canonical text form used for storage and JSON transfer.
const TIMESTAMP_CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";
const TIMESTAMP_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

/// Field names used in validation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Phone,
    Email,
    Notes,
    LastContacted,
}

impl ContactField {
    /// All fields in form order.
    pub const ALL: [ContactField; 5] = [
        ContactField::Name,
        ContactField::Phone,
        ContactField::Email,
        ContactField::Notes,
        ContactField::LastContacted,
    ];

    /// Stable snake_case key used in logs and wire formats.
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Notes => "notes",
            Self::LastContacted => "last_contacted",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Notes => "notes",
            Self::LastContacted => "last contacted",
        }
    }
}

impl Display for ContactField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why one field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// Required field is empty or whitespace only.
    Missing,
    /// Field exceeds its character limit.
    TooLong { max: usize, actual: usize },
    /// Timestamp text did not match any accepted format.
    InvalidTimestamp { value: String },
    /// Stored text has surrounding whitespace, or an optional field is
    /// present but blank.
    NotNormalized,
}

/// One rejected field with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: ContactField,
    pub problem: FieldProblem,
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "{} is required", self.field),
            FieldProblem::TooLong { max, actual } => write!(
                f,
                "{} is too long ({actual} chars, max {max})",
                self.field
            ),
            FieldProblem::InvalidTimestamp { value } => write!(
                f,
                "{} `{value}` is not a valid date (expected YYYY-MM-DD or YYYY-MM-DD HH:MM)",
                self.field
            ),
            FieldProblem::NotNormalized => write!(
                f,
                "{} must be trimmed and non-blank when present",
                self.field
            ),
        }
    }
}

/// Structured validation failure listing every invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactValidationError {
    issues: Vec<FieldIssue>,
}

impl ContactValidationError {
    /// All issues in form field order.
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Returns whether `field` has at least one issue.
    pub fn has_issue(&self, field: ContactField) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }

    /// Returns the first issue recorded for `field`.
    pub fn issue_for(&self, field: ContactField) -> Option<&FieldIssue> {
        self.issues.iter().find(|issue| issue.field == field)
    }
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl Error for ContactValidationError {}

/// Unvalidated candidate field set, as typed into a form or read from import.
///
/// `last_contacted` stays raw text until validation parses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub last_contacted: Option<String>,
}

impl ContactDraft {
    /// Creates a draft with the two required fields set.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the raw timestamp text; parsed during validation.
    pub fn with_last_contacted(mut self, last_contacted: impl Into<String>) -> Self {
        self.last_contacted = Some(last_contacted.into());
        self
    }

    /// Validates this draft without assigning an identity.
    pub fn validate(&self) -> Result<ValidFields, ContactValidationError> {
        let mut issues = Vec::new();

        let name = required_text(ContactField::Name, &self.name, NAME_MAX_CHARS, &mut issues);
        let phone = required_text(
            ContactField::Phone,
            &self.phone,
            PHONE_MAX_CHARS,
            &mut issues,
        );
        let email = optional_text(
            ContactField::Email,
            self.email.as_deref(),
            EMAIL_MAX_CHARS,
            &mut issues,
        );
        let notes = optional_text(
            ContactField::Notes,
            self.notes.as_deref(),
            NOTES_MAX_CHARS,
            &mut issues,
        );
        let last_contacted = match self.last_contacted.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => match parse_timestamp(value) {
                Some(timestamp) => Some(timestamp),
                None => {
                    issues.push(FieldIssue {
                        field: ContactField::LastContacted,
                        problem: FieldProblem::InvalidTimestamp {
                            value: value.to_string(),
                        },
                    });
                    None
                }
            },
        };

        if !issues.is_empty() {
            return Err(ContactValidationError { issues });
        }

        Ok(ValidFields {
            name,
            phone,
            email,
            notes,
            last_contacted,
        })
    }
}

impl From<&Contact> for ContactDraft {
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

/// Normalized field values that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFields {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub last_contacted: Option<NaiveDateTime>,
}

impl ValidFields {
    /// Attaches an identity, producing a contact.
    pub fn into_contact(self, id: ContactId) -> Contact {
        Contact {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            notes: self.notes,
            last_contacted: self.last_contacted,
        }
    }
}

/// Canonical contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContactWire")]
pub struct Contact {
    /// Stable identifier assigned at creation.
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub notes: Option<String>,
    /// Local wall-clock time of the last interaction.
    pub last_contacted: Option<NaiveDateTime>,
}

impl Contact {
    /// Validates `draft` and assigns a fresh identity.
    pub fn from_draft(draft: &ContactDraft) -> Result<Self, ContactValidationError> {
        Self::from_draft_with_id(Uuid::new_v4(), draft)
    }

    /// Validates `draft` and keeps a caller-provided identity.
    ///
    /// Used by update paths where the identity already exists.
    pub fn from_draft_with_id(
        id: ContactId,
        draft: &ContactDraft,
    ) -> Result<Self, ContactValidationError> {
        Ok(draft.validate()?.into_contact(id))
    }

    /// Re-checks invariants on an already-built contact.
    ///
    /// Write paths and storage reads call this so a hand-built or corrupted
    /// record is never accepted.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        let mut issues = Vec::new();
        check_stored_required(ContactField::Name, &self.name, NAME_MAX_CHARS, &mut issues);
        check_stored_required(ContactField::Phone, &self.phone, PHONE_MAX_CHARS, &mut issues);
        check_stored_optional(
            ContactField::Email,
            self.email.as_deref(),
            EMAIL_MAX_CHARS,
            &mut issues,
        );
        check_stored_optional(
            ContactField::Notes,
            self.notes.as_deref(),
            NOTES_MAX_CHARS,
            &mut issues,
        );

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ContactValidationError { issues })
        }
    }

    /// Last-contacted value formatted for table display.
    pub fn last_contacted_display(&self) -> String {
        self.last_contacted
            .map(|ts| ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ContactWire {
    id: ContactId,
    name: String,
    phone: String,
    email: Option<String>,
    notes: Option<String>,
    last_contacted: Option<NaiveDateTime>,
}

impl TryFrom<ContactWire> for Contact {
    type Error = ContactValidationError;

    fn try_from(value: ContactWire) -> Result<Self, Self::Error> {
        let contact = Contact {
            id: value.id,
            name: value.name,
            phone: value.phone,
            email: value.email,
            notes: value.notes,
            last_contacted: value.last_contacted,
        };
        contact.validate()?;
        Ok(contact)
    }
}

/// Parses user or storage timestamp text.
///
/// Accepts `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`,
/// `YYYY-MM-DD HH:MM` (either separator) and bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in TIMESTAMP_INPUT_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp);
        }
    }
    NaiveDate::parse_from_str(value, DATE_INPUT_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Formats a timestamp in canonical form; `parse_timestamp` reads it back.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_CANONICAL_FORMAT).to_string()
}

fn required_text(
    field: ContactField,
    raw: &str,
    max: usize,
    issues: &mut Vec<FieldIssue>,
) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        issues.push(FieldIssue {
            field,
            problem: FieldProblem::Missing,
        });
    } else {
        check_length(field, trimmed, max, issues);
    }
    trimmed.to_string()
}

fn optional_text(
    field: ContactField,
    raw: Option<&str>,
    max: usize,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    let trimmed = raw.map(str::trim).filter(|value| !value.is_empty())?;
    check_length(field, trimmed, max, issues);
    Some(trimmed.to_string())
}

fn check_stored_required(
    field: ContactField,
    value: &str,
    max: usize,
    issues: &mut Vec<FieldIssue>,
) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        issues.push(FieldIssue {
            field,
            problem: FieldProblem::Missing,
        });
    } else if trimmed != value {
        issues.push(FieldIssue {
            field,
            problem: FieldProblem::NotNormalized,
        });
    } else {
        check_length(field, value, max, issues);
    }
}

fn check_stored_optional(
    field: ContactField,
    value: Option<&str>,
    max: usize,
    issues: &mut Vec<FieldIssue>,
) {
    let Some(value) = value else {
        return;
    };
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed != value {
        issues.push(FieldIssue {
            field,
            problem: FieldProblem::NotNormalized,
        });
    } else {
        check_length(field, value, max, issues);
    }
}

fn check_length(field: ContactField, value: &str, max: usize, issues: &mut Vec<FieldIssue>) {
    let actual = value.chars().count();
    if actual > max {
        issues.push(FieldIssue {
            field,
            problem: FieldProblem::TooLong { max, actual },
        });
    }
}
