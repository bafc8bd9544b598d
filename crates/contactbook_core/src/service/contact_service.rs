//! Contact use-case service.
//!
//! # Responsibility
//! - Provide add/list/get/update/delete entry points for presentation callers.
//! - Turn drafts into validated contacts before any persistence call.
//! - Map repository errors onto the two user-facing failure kinds.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - `update_contact` replaces every field; identity and position are kept.
//! - Logged events carry ids and counts, never field values.

use crate::model::contact::{Contact, ContactDraft, ContactId, ContactValidationError};
use crate::repo::contact_repo::{ContactListQuery, ContactRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ContactServiceError>;

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// Submitted fields failed validation.
    Validation(ContactValidationError),
    /// Target contact does not exist.
    ContactNotFound(ContactId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back disagreed.
    InconsistentState(&'static str),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::Repo(err) => write!(f, "storage error: {err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent contact state: {details}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ContactNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ContactValidationError> for ContactServiceError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Contact store facade over a repository implementation.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates `draft` and stores it as a new contact.
    ///
    /// # Errors
    /// - `Validation` when a required field is missing or a field is malformed.
    pub fn add_contact(&self, draft: &ContactDraft) -> ServiceResult<Contact> {
        let contact = Contact::from_draft(draft).map_err(|err| {
            log_rejected("contact_add", &err);
            err
        })?;
        let id = self.repo.insert_contact(&contact)?;
        let stored = self
            .repo
            .get_contact(id)?
            .ok_or(ContactServiceError::InconsistentState(
                "created contact not found in read-back",
            ))?;

        info!("event=contact_add module=service status=ok id={id}");
        Ok(stored)
    }

    /// Lists every contact in insertion order.
    pub fn list_contacts(&self) -> ServiceResult<Vec<Contact>> {
        self.list_contacts_with(&ContactListQuery::default())
    }

    /// Lists contacts using ordering and name-filter options.
    pub fn list_contacts_with(&self, query: &ContactListQuery) -> ServiceResult<Vec<Contact>> {
        Ok(self.repo.list_contacts(query)?)
    }

    /// Gets one contact by id.
    ///
    /// # Errors
    /// - `ContactNotFound` when no contact has this id.
    pub fn get_contact(&self, id: ContactId) -> ServiceResult<Contact> {
        self.repo
            .get_contact(id)?
            .ok_or(ContactServiceError::ContactNotFound(id))
    }

    /// Finds the first contact (insertion order) whose name matches,
    /// ignoring case and surrounding whitespace.
    pub fn find_contact_by_name(&self, name: &str) -> ServiceResult<Option<Contact>> {
        Ok(self.repo.find_contact_by_name(name)?)
    }

    /// Replaces all fields of contact `id` with the validated `draft`.
    ///
    /// Validation runs before the existence check, so an invalid draft for an
    /// unknown id reports `Validation`.
    pub fn update_contact(&self, id: ContactId, draft: &ContactDraft) -> ServiceResult<Contact> {
        let contact = Contact::from_draft_with_id(id, draft).map_err(|err| {
            log_rejected("contact_update", &err);
            err
        })?;
        self.repo.update_contact(&contact)?;
        let stored = self
            .repo
            .get_contact(id)?
            .ok_or(ContactServiceError::InconsistentState(
                "updated contact not found in read-back",
            ))?;

        info!("event=contact_update module=service status=ok id={id}");
        Ok(stored)
    }

    /// Removes contact `id` permanently.
    pub fn delete_contact(&self, id: ContactId) -> ServiceResult<()> {
        self.repo.delete_contact(id)?;
        info!("event=contact_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Returns the number of stored contacts.
    pub fn count_contacts(&self) -> ServiceResult<usize> {
        Ok(self.repo.count_contacts()?)
    }
}

fn log_rejected(event: &str, err: &ContactValidationError) {
    let fields = err
        .issues()
        .iter()
        .map(|issue| issue.field.key())
        .collect::<Vec<_>>()
        .join(",");
    warn!("event={event} module=service status=rejected fields={fields}");
}
