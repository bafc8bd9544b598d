//! Add/edit form state.
//!
//! # Responsibility
//! - Hold the raw text of every contact field while the user types.
//! - Turn key presses into edits, focus moves, submit or cancel.
//! - Show validation issues next to the fields they belong to.
//!
//! # Invariants
//! - The form never validates on its own; the service decides.
//! - Field order always follows `ContactField::ALL`.

use chrono::NaiveDateTime;
use contactbook_core::{Contact, ContactDraft, ContactField, ContactId, ContactValidationError};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const PREFILL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Which store operation the form submits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Add,
    Edit(ContactId),
}

/// Result of feeding one key to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub field: ContactField,
    pub value: String,
    pub error: Option<String>,
}

impl FormField {
    fn new(field: ContactField, value: Option<&str>) -> Self {
        Self {
            field,
            value: value.unwrap_or_default().to_string(),
            error: None,
        }
    }

    /// Label shown in front of the input.
    pub fn label(&self) -> &'static str {
        match self.field {
            ContactField::Name => "Name",
            ContactField::Phone => "Phone",
            ContactField::Email => "Email (optional)",
            ContactField::Notes => "Notes (optional)",
            ContactField::LastContacted => "Last contacted (YYYY-MM-DD [HH:MM])",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    target: FormTarget,
    fields: Vec<FormField>,
    focus: usize,
}

impl ContactForm {
    /// Empty form with "last contacted" pre-filled to `now`.
    pub fn for_add(now: NaiveDateTime) -> Self {
        let draft = ContactDraft::default().with_last_contacted(prefill_timestamp(now));
        Self::from_draft(FormTarget::Add, &draft)
    }

    /// Form pre-filled with `contact`, with "last contacted" reset to `now`.
    pub fn for_edit(contact: &Contact, now: NaiveDateTime) -> Self {
        let draft = ContactDraft::from(contact).with_last_contacted(prefill_timestamp(now));
        Self::from_draft(FormTarget::Edit(contact.id), &draft)
    }

    fn from_draft(target: FormTarget, draft: &ContactDraft) -> Self {
        let fields = ContactField::ALL
            .iter()
            .map(|&field| {
                let value = match field {
                    ContactField::Name => Some(draft.name.as_str()),
                    ContactField::Phone => Some(draft.phone.as_str()),
                    ContactField::Email => draft.email.as_deref(),
                    ContactField::Notes => draft.notes.as_deref(),
                    ContactField::LastContacted => draft.last_contacted.as_deref(),
                };
                FormField::new(field, value)
            })
            .collect();

        Self {
            target,
            fields,
            focus: 0,
        }
    }

    pub fn target(&self) -> FormTarget {
        self.target
    }

    pub fn title(&self) -> &'static str {
        match self.target {
            FormTarget::Add => "Add New Contact",
            FormTarget::Edit(_) => "Edit Contact",
        }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_field(&self) -> ContactField {
        self.fields[self.focus].field
    }

    pub fn value(&self, field: ContactField) -> &str {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => FormAction::Cancel,
            KeyCode::Char('c') if ctrl => FormAction::Cancel,
            KeyCode::Char('s') if ctrl => FormAction::Submit,
            KeyCode::Char('u') if ctrl => {
                self.fields[self.focus].value.clear();
                FormAction::None
            }
            KeyCode::Enter => FormAction::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % self.fields.len();
                FormAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
                FormAction::None
            }
            KeyCode::Backspace => {
                self.fields[self.focus].value.pop();
                FormAction::None
            }
            KeyCode::Char(ch) if !ctrl => {
                self.fields[self.focus].value.push(ch);
                FormAction::None
            }
            _ => FormAction::None,
        }
    }

    /// Collects the typed values; blank optional fields become `None`.
    pub fn to_draft(&self) -> ContactDraft {
        let optional = |field| {
            let value = self.value(field);
            (!value.trim().is_empty()).then(|| value.to_string())
        };

        ContactDraft {
            name: self.value(ContactField::Name).to_string(),
            phone: self.value(ContactField::Phone).to_string(),
            email: optional(ContactField::Email),
            notes: optional(ContactField::Notes),
            last_contacted: optional(ContactField::LastContacted),
        }
    }

    /// Attaches issues to fields and moves focus to the first bad one.
    pub fn apply_errors(&mut self, err: &ContactValidationError) {
        for form_field in &mut self.fields {
            form_field.error = err
                .issue_for(form_field.field)
                .map(|issue| issue.to_string());
        }
        if let Some(index) = self.fields.iter().position(|f| f.error.is_some()) {
            self.focus = index;
        }
    }
}

fn prefill_timestamp(now: NaiveDateTime) -> String {
    now.format(PREFILL_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{ContactForm, FormAction, FormTarget};
    use chrono::NaiveDate;
    use contactbook_core::{Contact, ContactDraft, ContactField};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut ContactForm, text: &str) {
        for ch in text.chars() {
            assert_eq!(form.handle_key(key(KeyCode::Char(ch))), FormAction::None);
        }
    }

    fn noon() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|date| date.and_hms_opt(12, 30, 45))
            .unwrap()
    }

    #[test]
    fn add_form_prefills_last_contacted_to_the_minute() {
        let form = ContactForm::for_add(noon());
        assert_eq!(form.target(), FormTarget::Add);
        assert_eq!(form.value(ContactField::LastContacted), "2024-06-01 12:30");
        assert_eq!(form.value(ContactField::Name), "");
    }

    #[test]
    fn typing_and_tabbing_fill_fields_in_order() {
        let mut form = ContactForm::for_add(noon());
        type_text(&mut form, "Ann");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "555-0100");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "ann@example.com");

        let draft = form.to_draft();
        assert_eq!(draft.name, "Ann");
        assert_eq!(draft.phone, "555-0100");
        assert_eq!(draft.email.as_deref(), Some("ann@example.com"));
        assert_eq!(draft.notes, None);
        assert_eq!(draft.last_contacted.as_deref(), Some("2024-06-01 12:30"));
    }

    #[test]
    fn backtab_wraps_and_backspace_edits() {
        let mut form = ContactForm::for_add(noon());
        form.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert_eq!(form.focused_field(), ContactField::LastContacted);

        form.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(form.to_draft().last_contacted, None);

        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "Bo");
        form.handle_key(key(KeyCode::Backspace));
        assert_eq!(form.value(ContactField::Name), "B");
    }

    #[test]
    fn submit_and_cancel_keys() {
        let mut form = ContactForm::for_add(noon());
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Submit);
        assert_eq!(
            form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            FormAction::Submit
        );
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
        assert_eq!(
            form.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            FormAction::Cancel
        );
    }

    #[test]
    fn edit_form_prefills_contact_and_errors_move_focus() {
        let contact = Contact::from_draft(
            &ContactDraft::new("Cara", "555-0199")
                .with_notes("Neighbour")
                .with_last_contacted("2020-01-01"),
        )
        .unwrap();
        let mut form = ContactForm::for_edit(&contact, noon());
        assert_eq!(form.target(), FormTarget::Edit(contact.id));
        assert_eq!(form.value(ContactField::Notes), "Neighbour");
        assert_eq!(form.value(ContactField::LastContacted), "2024-06-01 12:30");

        let err = ContactDraft::new("Cara", "").validate().unwrap_err();
        form.apply_errors(&err);
        assert_eq!(form.focused_field(), ContactField::Phone);
        assert_eq!(
            form.fields()[1].error.as_deref(),
            Some("phone is required")
        );
        assert!(form.fields()[0].error.is_none());
    }
}
