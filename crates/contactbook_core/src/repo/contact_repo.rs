//! Contact repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `contacts` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Contact::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing defaults to insertion order (`seq ASC`); updates keep `seq`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::contact::{
    format_timestamp, parse_timestamp, Contact, ContactId, ContactValidationError,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CONTACT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    phone,
    email,
    notes,
    last_contacted
FROM contacts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    Db(DbError),
    NotFound(ContactId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Sort order for contact listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContactOrder {
    /// Order in which contacts were added.
    #[default]
    Inserted,
    /// Name ascending, case-insensitive; ties keep insertion order.
    Name,
}

impl ContactOrder {
    /// Returns the other ordering.
    pub fn toggled(self) -> Self {
        match self {
            Self::Inserted => Self::Name,
            Self::Name => Self::Inserted,
        }
    }
}

/// Query options for listing contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactListQuery {
    pub order: ContactOrder,
    /// Case-insensitive substring match on `name`.
    pub name_filter: Option<String>,
}

/// Repository interface for contact CRUD operations.
pub trait ContactRepository {
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId>;
    /// Replaces every field of an existing contact.
    fn update_contact(&self, contact: &Contact) -> RepoResult<()>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    /// First contact in insertion order whose name matches, ignoring case.
    fn find_contact_by_name(&self, name: &str) -> RepoResult<Option<Contact>>;
    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>>;
    fn delete_contact(&self, id: ContactId) -> RepoResult<()>;
    fn count_contacts(&self) -> RepoResult<usize>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `InvalidData` when the `contacts` table is missing.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
        contact.validate()?;

        self.conn.execute(
            "INSERT INTO contacts (
                uuid,
                name,
                phone,
                email,
                notes,
                last_contacted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                contact.id.to_string(),
                contact.name.as_str(),
                contact.phone.as_str(),
                contact.email.as_deref(),
                contact.notes.as_deref(),
                contact.last_contacted.map(format_timestamp),
            ],
        )?;

        debug!("event=contact_insert module=repo status=ok id={}", contact.id);
        Ok(contact.id)
    }

    fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;

        let changed = self.conn.execute(
            "UPDATE contacts
             SET
                name = ?2,
                phone = ?3,
                email = ?4,
                notes = ?5,
                last_contacted = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                contact.id.to_string(),
                contact.name.as_str(),
                contact.phone.as_str(),
                contact.email.as_deref(),
                contact.notes.as_deref(),
                contact.last_contacted.map(format_timestamp),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(contact.id));
        }

        Ok(())
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_contact_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_contact_by_name(&self, name: &str) -> RepoResult<Option<Contact>> {
        let wanted = fold_case(name.trim());
        Ok(self
            .contacts_in_insertion_order()?
            .into_iter()
            .find(|contact| fold_case(&contact.name) == wanted))
    }

    fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>> {
        let mut contacts = self.contacts_in_insertion_order()?;

        let filter = query
            .name_filter
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(fold_case);
        if let Some(filter) = filter {
            contacts.retain(|contact| fold_case(&contact.name).contains(&filter));
        }

        // Stable sort: equal names keep insertion order.
        if query.order == ContactOrder::Name {
            contacts.sort_by_cached_key(|contact| fold_case(&contact.name));
        }

        Ok(contacts)
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!("event=contact_delete module=repo status=ok id={id}");
        Ok(())
    }

    fn count_contacts(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative contact count `{count}`")))
    }
}

impl SqliteContactRepository<'_> {
    fn contacts_in_insertion_order(&self) -> RepoResult<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }
}

/// Unicode lowercase used for every name comparison.
fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in contacts.uuid"))
    })?;

    let last_contacted = match row.get::<_, Option<String>>("last_contacted")? {
        Some(value) => Some(parse_timestamp(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{value}` in contacts.last_contacted"
            ))
        })?),
        None => None,
    };

    let contact = Contact {
        id,
        name: row.get("name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        notes: row.get("notes")?,
        last_contacted,
    };
    contact.validate()?;
    Ok(contact)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table: Option<String> = conn
        .query_row(
            "SELECT name
             FROM sqlite_master
             WHERE type = 'table' AND name = 'contacts';",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if table.is_none() {
        return Err(RepoError::InvalidData(
            "required table `contacts` is missing".to_string(),
        ));
    }

    Ok(())
}
