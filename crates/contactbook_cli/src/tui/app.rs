//! Terminal application state machine.
//!
//! # Responsibility
//! - Keep the visible contact list, selection, and current mode.
//! - Translate key presses into store operations and status messages.
//!
//! # Invariants
//! - Contacts are only changed through `ContactService`.
//! - Store failures become status messages; none of them ends the app.
//! - `selected` is `None` exactly when the visible list is empty.

use super::form::{ContactForm, FormAction, FormTarget};
use chrono::{Local, NaiveDateTime};
use contactbook_core::{
    Contact, ContactId, ContactListQuery, ContactOrder, ContactRepository, ContactService,
    ContactServiceError, ServiceResult,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;

/// What a confirmation dialog will do on "yes".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    Delete { id: ContactId, name: String },
    Quit,
}

impl PendingConfirm {
    pub fn message(&self) -> String {
        match self {
            Self::Delete { name, .. } => {
                format!("Are you sure you want to delete contact '{name}'?")
            }
            Self::Quit => "Are you sure you want to quit?".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Typing a name filter; the list narrows on every key.
    Filter,
    Form(ContactForm),
    Confirm(PendingConfirm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

pub struct App<R: ContactRepository> {
    service: ContactService<R>,
    contacts: Vec<Contact>,
    query: ContactListQuery,
    selected: Option<usize>,
    mode: Mode,
    status: Option<StatusLine>,
    clock: fn() -> NaiveDateTime,
    should_quit: bool,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<R: ContactRepository> App<R> {
    pub fn new(service: ContactService<R>) -> ServiceResult<Self> {
        Self::with_clock(service, local_now)
    }

    /// Same as `new` with an injectable clock for the add-form prefill.
    pub fn with_clock(
        service: ContactService<R>,
        clock: fn() -> NaiveDateTime,
    ) -> ServiceResult<Self> {
        let mut app = Self {
            service,
            contacts: Vec::new(),
            query: ContactListQuery::default(),
            selected: None,
            mode: Mode::Browse,
            status: None,
            clock,
            should_quit: false,
        };
        app.reload(None)?;
        Ok(app)
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        self.selected.and_then(|index| self.contacts.get(index))
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn query(&self) -> &ContactListQuery {
        &self.query
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn service(&self) -> &ContactService<R> {
        &self.service
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            kind: StatusKind::Info,
            text: text.into(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            kind: StatusKind::Error,
            text: text.into(),
        });
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Filter => self.handle_filter_key(key),
            Mode::Form(_) => self.handle_form_key(key),
            Mode::Confirm(_) => self.handle_confirm_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('c') {
                self.should_quit = true;
            }
            return;
        }

        match key.code {
            KeyCode::Char('a') => {
                self.mode = Mode::Form(ContactForm::for_add((self.clock)()));
            }
            KeyCode::Char('e') => match self.selected_contact() {
                Some(contact) => {
                    self.mode = Mode::Form(ContactForm::for_edit(contact, (self.clock)()));
                }
                None => self.set_info("No contact selected"),
            },
            KeyCode::Char('d') => match self.selected_contact() {
                Some(contact) => {
                    self.mode = Mode::Confirm(PendingConfirm::Delete {
                        id: contact.id,
                        name: contact.name.clone(),
                    });
                }
                None => self.set_info("No contact selected"),
            },
            KeyCode::Char('q') => self.mode = Mode::Confirm(PendingConfirm::Quit),
            KeyCode::Char('s') => {
                self.query.order = self.query.order.toggled();
                let keep = self.selected_contact().map(|c| c.id);
                if self.reload_or_report(keep) {
                    match self.query.order {
                        ContactOrder::Inserted => self.set_info("Sorted by insertion order"),
                        ContactOrder::Name => self.set_info("Sorted by name"),
                    }
                }
            }
            KeyCode::Char('/') => {
                self.query.name_filter.get_or_insert_with(String::new);
                self.mode = Mode::Filter;
            }
            KeyCode::Esc if self.query.name_filter.is_some() => self.clear_filter(),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Home | KeyCode::Char('g') => {
                self.selected = (!self.contacts.is_empty()).then_some(0);
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = self.contacts.len().checked_sub(1);
            }
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Enter => {
                if self
                    .query
                    .name_filter
                    .as_deref()
                    .is_some_and(|f| f.trim().is_empty())
                {
                    self.query.name_filter = None;
                }
                self.mode = Mode::Browse;
            }
            KeyCode::Backspace => {
                if let Some(filter) = self.query.name_filter.as_mut() {
                    filter.pop();
                }
                self.reload_or_report(None);
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.query.name_filter.get_or_insert_with(String::new).push(ch);
                self.reload_or_report(None);
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Mode::Form(form) = &mut self.mode else {
            return;
        };

        match form.handle_key(key) {
            FormAction::None => {}
            FormAction::Cancel => self.mode = Mode::Browse,
            FormAction::Submit => self.submit_form(),
        }
    }

    fn submit_form(&mut self) {
        let Mode::Form(form) = &self.mode else {
            return;
        };
        let draft = form.to_draft();
        let target = form.target();

        let result = match target {
            FormTarget::Add => self.service.add_contact(&draft),
            FormTarget::Edit(id) => self.service.update_contact(id, &draft),
        };

        match result {
            Ok(contact) => {
                self.mode = Mode::Browse;
                let verb = match target {
                    FormTarget::Add => "Added",
                    FormTarget::Edit(_) => "Updated",
                };
                if self.reload_or_report(Some(contact.id)) {
                    self.set_info(format!("{verb} contact '{}'", contact.name));
                }
            }
            Err(ContactServiceError::Validation(err)) => {
                if let Mode::Form(form) = &mut self.mode {
                    form.apply_errors(&err);
                }
                self.set_error(err.to_string());
            }
            Err(ContactServiceError::ContactNotFound(_)) => {
                self.mode = Mode::Browse;
                if self.reload_or_report(None) {
                    self.set_error("Contact no longer exists");
                }
            }
            Err(err) => {
                warn!("event=form_submit module=tui status=error error={err}");
                self.set_error(err.to_string());
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Mode::Confirm(pending) = &self.mode else {
            return;
        };

        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let pending = pending.clone();
                self.mode = Mode::Browse;
                self.confirm(pending);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            _ => {}
        }
    }

    fn confirm(&mut self, pending: PendingConfirm) {
        match pending {
            PendingConfirm::Quit => self.should_quit = true,
            PendingConfirm::Delete { id, name } => {
                let keep_index = self.selected;
                let outcome = match self.service.delete_contact(id) {
                    Ok(()) => StatusLine {
                        kind: StatusKind::Info,
                        text: format!("Deleted contact '{name}'"),
                    },
                    Err(ContactServiceError::ContactNotFound(_)) => StatusLine {
                        kind: StatusKind::Error,
                        text: "Contact no longer exists".to_string(),
                    },
                    Err(err) => StatusLine {
                        kind: StatusKind::Error,
                        text: err.to_string(),
                    },
                };
                if self.reload_or_report(None) {
                    if let Some(index) = keep_index {
                        self.selected = clamp_index(index, self.contacts.len());
                    }
                    self.status = Some(outcome);
                }
            }
        }
    }

    fn clear_filter(&mut self) {
        self.query.name_filter = None;
        self.mode = Mode::Browse;
        let keep = self.selected_contact().map(|c| c.id);
        self.reload_or_report(keep);
    }

    fn move_selection(&mut self, delta: isize) {
        if self.contacts.is_empty() {
            self.selected = None;
            return;
        }
        let current = self.selected.unwrap_or(0);
        let next = current.saturating_add_signed(delta);
        self.selected = clamp_index(next, self.contacts.len());
    }

    /// Reloads the list; on failure shows the error and returns `false`.
    fn reload_or_report(&mut self, keep: Option<ContactId>) -> bool {
        match self.reload(keep) {
            Ok(()) => true,
            Err(err) => {
                warn!("event=contacts_reload module=tui status=error error={err}");
                self.set_error(format!("Could not reload contacts: {err}"));
                false
            }
        }
    }

    /// Re-reads the list and re-selects `keep` when it is still visible.
    fn reload(&mut self, keep: Option<ContactId>) -> ServiceResult<()> {
        self.contacts = self.service.list_contacts_with(&self.query)?;
        let kept = keep.and_then(|id| self.contacts.iter().position(|c| c.id == id));
        self.selected = match kept {
            Some(index) => Some(index),
            None => self
                .selected
                .and_then(|index| clamp_index(index, self.contacts.len()))
                .or_else(|| (!self.contacts.is_empty()).then_some(0)),
        };
        Ok(())
    }
}

fn clamp_index(index: usize, len: usize) -> Option<usize> {
    len.checked_sub(1).map(|last| index.min(last))
}

#[cfg(test)]
mod tests {
    use super::{App, Mode, PendingConfirm, StatusKind};
    use chrono::{NaiveDate, NaiveDateTime};
    use contactbook_core::db::{open_db_in_memory, Connection};
    use contactbook_core::{
        Contact, ContactDraft, ContactField, ContactId, ContactListQuery, ContactOrder,
        ContactRepository, ContactService, RepoError, RepoResult, SqliteContactRepository,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::cell::Cell;
    use std::rc::Rc;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|date| date.and_hms_opt(9, 15, 0))
            .unwrap()
    }

    /// Builds the app after `names` are already stored, in that order.
    fn app_with<'c>(conn: &'c Connection, names: &[&str]) -> App<SqliteContactRepository<'c>> {
        let service = ContactService::new(SqliteContactRepository::try_new(conn).unwrap());
        for name in names {
            service
                .add_contact(&ContactDraft::new(*name, "555"))
                .unwrap();
        }
        App::with_clock(service, fixed_clock).unwrap()
    }

    fn press<R: ContactRepository>(app: &mut App<R>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text<R: ContactRepository>(app: &mut App<R>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn names<R: ContactRepository>(app: &App<R>) -> Vec<&str> {
        app.contacts().iter().map(|c| c.name.as_str()).collect()
    }

    /// Repository whose listing can be switched to fail.
    struct FlakyListRepo<'c> {
        inner: SqliteContactRepository<'c>,
        fail_list: Rc<Cell<bool>>,
    }

    impl ContactRepository for FlakyListRepo<'_> {
        fn insert_contact(&self, contact: &Contact) -> RepoResult<ContactId> {
            self.inner.insert_contact(contact)
        }

        fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
            self.inner.update_contact(contact)
        }

        fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
            self.inner.get_contact(id)
        }

        fn find_contact_by_name(&self, name: &str) -> RepoResult<Option<Contact>> {
            self.inner.find_contact_by_name(name)
        }

        fn list_contacts(&self, query: &ContactListQuery) -> RepoResult<Vec<Contact>> {
            if self.fail_list.get() {
                return Err(RepoError::InvalidData("listing unavailable".to_string()));
            }
            self.inner.list_contacts(query)
        }

        fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
            self.inner.delete_contact(id)
        }

        fn count_contacts(&self) -> RepoResult<usize> {
            self.inner.count_contacts()
        }
    }

    #[test]
    fn add_flow_creates_contact_and_selects_it() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &[]);

        press(&mut app, KeyCode::Char('a'));
        assert!(matches!(app.mode(), Mode::Form(_)));
        type_text(&mut app, "Ann");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "555-0100");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode(), &Mode::Browse);
        assert_eq!(app.contacts().len(), 1);
        let contact = app.selected_contact().unwrap();
        assert_eq!(contact.name, "Ann");
        assert_eq!(contact.last_contacted, Some(fixed_clock()));
        assert_eq!(app.status().unwrap().kind, StatusKind::Info);
    }

    #[test]
    fn invalid_submit_keeps_form_open_with_field_errors() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &[]);

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Ann");
        press(&mut app, KeyCode::Enter);

        let Mode::Form(form) = app.mode() else {
            panic!("form should stay open");
        };
        assert_eq!(form.focused_field(), ContactField::Phone);
        assert_eq!(app.status().unwrap().kind, StatusKind::Error);
        assert!(app.contacts().is_empty());
    }

    #[test]
    fn edit_flow_updates_selected_contact_and_stamps_last_contacted() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &["Ann", "Bob"]);
        press(&mut app, KeyCode::Down);

        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Tab);
        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut app, "555-9999");
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));

        assert_eq!(app.mode(), &Mode::Browse);
        assert_eq!(names(&app), vec!["Ann", "Bob"]);
        assert_eq!(app.contacts()[1].phone, "555-9999");
        assert_eq!(app.contacts()[1].last_contacted, Some(fixed_clock()));
        assert_eq!(app.contacts()[0].phone, "555");
        assert_eq!(app.contacts()[0].last_contacted, None);
        assert_eq!(app.selected_index(), Some(1));
    }

    #[test]
    fn delete_requires_confirmation() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &["Ann", "Bob"]);

        press(&mut app, KeyCode::Char('d'));
        assert!(matches!(
            app.mode(),
            Mode::Confirm(PendingConfirm::Delete { name, .. }) if name == "Ann"
        ));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.contacts().len(), 2);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(names(&app), vec!["Bob"]);
        assert_eq!(app.selected_index(), Some(0));
        assert_eq!(app.status().unwrap().text, "Deleted contact 'Ann'");
    }

    #[test]
    fn quit_asks_first_and_ctrl_c_quits_immediately() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &[]);

        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.mode(), &Mode::Confirm(PendingConfirm::Quit));
        press(&mut app, KeyCode::Esc);
        assert!(!app.should_quit());

        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.should_quit());

        let mut other = app_with(&conn, &[]);
        other.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(other.should_quit());
    }

    #[test]
    fn edit_and_delete_without_selection_report_info() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &[]);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.mode(), &Mode::Browse);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode(), &Mode::Browse);
        assert_eq!(app.status().unwrap().text, "No contact selected");
    }

    #[test]
    fn sort_toggle_and_filter_narrow_the_list() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &["Zoe", "adam", "Zack"]);
        assert_eq!(names(&app), vec!["Zoe", "adam", "Zack"]);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.query().order, ContactOrder::Name);
        assert_eq!(names(&app), vec!["adam", "Zack", "Zoe"]);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "z");
        assert_eq!(app.mode(), &Mode::Filter);
        assert_eq!(app.contacts().len(), 2);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode(), &Mode::Browse);
        assert_eq!(app.query().name_filter.as_deref(), Some("z"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.query().name_filter, None);
        assert_eq!(app.contacts().len(), 3);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.query().order, ContactOrder::Inserted);
        assert_eq!(names(&app), vec!["Zoe", "adam", "Zack"]);
    }

    #[test]
    fn selection_stays_within_bounds() {
        let conn = open_db_in_memory().unwrap();
        let mut app = app_with(&conn, &["A", "B", "C"]);

        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_index(), Some(0));
        press(&mut app, KeyCode::Char('G'));
        assert_eq!(app.selected_index(), Some(2));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_index(), Some(2));
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.selected_index(), Some(0));
    }

    #[test]
    fn failed_reload_keeps_error_visible_after_actions() {
        let conn = open_db_in_memory().unwrap();
        let fail_list = Rc::new(Cell::new(false));
        let repo = FlakyListRepo {
            inner: SqliteContactRepository::try_new(&conn).unwrap(),
            fail_list: Rc::clone(&fail_list),
        };
        let mut app = App::with_clock(ContactService::new(repo), fixed_clock).unwrap();

        fail_list.set(true);
        press(&mut app, KeyCode::Char('s'));
        let status = app.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("listing unavailable"), "{}", status.text);

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Ann");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "555");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode(), &Mode::Browse);
        assert_eq!(app.status().unwrap().kind, StatusKind::Error);
        assert_eq!(app.service().count_contacts().unwrap(), 1);

        fail_list.set(false);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.status().unwrap().kind, StatusKind::Info);
        assert_eq!(names(&app), vec!["Ann"]);
    }
}
