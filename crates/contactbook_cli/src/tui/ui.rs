//! Rendering of the app state onto a ratatui frame.
//!
//! Drawing is a pure function of `App`; nothing here mutates the store.

use super::app::{App, Mode, StatusKind};
use super::form::ContactForm;
use contactbook_core::{ContactOrder, ContactRepository};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

const NOTES_PREVIEW_CHARS: usize = 40;

pub fn draw<R: ContactRepository>(f: &mut Frame, app: &App<R>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(3),    // Contact table
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Shortcuts
        ])
        .split(f.area());

    render_header(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_status(f, chunks[2], app);
    render_footer(f, chunks[3], app);

    match app.mode() {
        Mode::Form(form) => render_form(f, form),
        Mode::Confirm(pending) => render_confirm(f, &pending.message()),
        Mode::Browse | Mode::Filter => {}
    }
}

fn render_header<R: ContactRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
    let order = match app.query().order {
        ContactOrder::Inserted => "insertion order",
        ContactOrder::Name => "name",
    };
    let mut spans = vec![
        Span::styled(
            "Contacts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" | {} shown | sorted by {order}", app.contacts().len())),
    ];
    if let Some(filter) = app.query().name_filter.as_deref() {
        let style = if matches!(app.mode(), Mode::Filter) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(format!("filter: {filter}"), style));
        if matches!(app.mode(), Mode::Filter) {
            spans.push(Span::styled("_", style));
        }
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_table<R: ContactRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
    let block = Block::default().borders(Borders::ALL).title("Contact List");

    if app.contacts().is_empty() {
        let text = if app.query().name_filter.is_some() {
            "No contacts match the filter."
        } else {
            "No contacts yet. Press 'a' to add one."
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Name", "Phone", "Email", "Last Contacted", "Notes"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = app.contacts().iter().map(|contact| {
        Row::new(vec![
            Cell::from(contact.name.clone()),
            Cell::from(contact.phone.clone()),
            Cell::from(contact.email.clone().unwrap_or_default()),
            Cell::from(contact.last_contacted_display()),
            Cell::from(notes_preview(contact.notes.as_deref())),
        ])
    });
    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(15),
        Constraint::Percentage(22),
        Constraint::Length(16),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(app.selected_index());
    f.render_stateful_widget(table, area, &mut state);
}

fn render_status<R: ContactRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
    let Some(status) = app.status() else {
        return;
    };
    let color = match status.kind {
        StatusKind::Info => Color::Green,
        StatusKind::Error => Color::Red,
    };
    let line = Paragraph::new(status.text.as_str()).style(Style::default().fg(color));
    f.render_widget(line, area);
}

fn render_footer<R: ContactRepository>(f: &mut Frame, area: Rect, app: &App<R>) {
    let hints: &[(&str, &str)] = match app.mode() {
        Mode::Browse => &[
            ("a", "add"),
            ("e", "edit"),
            ("d", "delete"),
            ("s", "sort"),
            ("/", "filter"),
            ("q", "quit"),
        ],
        Mode::Filter => &[("type", "filter"), ("enter", "keep"), ("esc", "clear")],
        Mode::Form(_) => &[
            ("tab", "next field"),
            ("enter", "save"),
            ("ctrl-u", "clear field"),
            ("esc", "cancel"),
        ],
        Mode::Confirm(_) => &[("y", "yes"), ("n", "no")],
    };

    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (index, (key, action)) in hints.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {action}")));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_form(f: &mut Frame, form: &ContactForm) {
    let height = (form.fields().len() as u16) * 3 + 2;
    let area = centered_rect(70, height, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(form.title())
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(form.fields().iter().map(|_| Constraint::Length(3)))
        .split(inner);

    for (index, (field, row)) in form.fields().iter().zip(rows.iter()).enumerate() {
        let focused = index == form.focus();
        let border_style = match (&field.error, focused) {
            (Some(_), _) => Style::default().fg(Color::Red),
            (None, true) => Style::default().fg(Color::Yellow),
            (None, false) => Style::default().fg(Color::Gray),
        };
        let title = match &field.error {
            Some(error) => format!("{} - {error}", field.label()),
            None => field.label().to_string(),
        };
        let mut value = field.value.clone();
        if focused {
            value.push('_');
        }
        let input = Paragraph::new(value).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        );
        f.render_widget(input, *row);
    }
}

fn render_confirm(f: &mut Frame, message: &str) {
    let area = centered_rect(50, 5, f.area());
    f.render_widget(Clear, area);

    let text = vec![
        Line::from(message.to_string()),
        Line::from(Span::styled(
            "(y)es / (n)o",
            Style::default().fg(Color::Yellow),
        )),
    ];
    let dialog = Paragraph::new(text).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Confirm")
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(dialog, area);
}

/// Rect of `percent_x` width and `height` rows centered in `area`, clipped to it.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width.saturating_mul(percent_x) / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn notes_preview(notes: Option<&str>) -> String {
    let Some(notes) = notes else {
        return String::new();
    };
    let first_line = notes.lines().next().unwrap_or_default();
    let mut preview: String = first_line.chars().take(NOTES_PREVIEW_CHARS).collect();
    if first_line.chars().count() > NOTES_PREVIEW_CHARS || notes.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::{centered_rect, draw, notes_preview};
    use crate::tui::app::App;
    use chrono::NaiveDate;
    use contactbook_core::db::open_db_in_memory;
    use contactbook_core::{ContactDraft, ContactService, SqliteContactRepository};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, layout::Rect, Terminal};

    fn clock() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .unwrap()
    }

    fn render<R: contactbook_core::ContactRepository>(app: &App<R>) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn empty_list_shows_hint_and_shortcuts() {
        let conn = open_db_in_memory().unwrap();
        let service = ContactService::new(SqliteContactRepository::try_new(&conn).unwrap());
        let app = App::with_clock(service, clock).unwrap();

        let screen = render(&app);
        assert!(screen.contains("No contacts yet"));
        assert!(screen.contains("add"));
        assert!(screen.contains("quit"));
    }

    #[test]
    fn table_lists_contact_columns() {
        let conn = open_db_in_memory().unwrap();
        let service = ContactService::new(SqliteContactRepository::try_new(&conn).unwrap());
        service
            .add_contact(
                &ContactDraft::new("Ann Lee", "555-0100")
                    .with_email("ann@example.com")
                    .with_last_contacted("2023-05-17T10:00:00"),
            )
            .unwrap();
        let app = App::with_clock(service, clock).unwrap();

        let screen = render(&app);
        assert!(screen.contains("Last Contacted"));
        assert!(screen.contains("Ann Lee"));
        assert!(screen.contains("555-0100"));
        assert!(screen.contains("ann@example.com"));
        assert!(screen.contains("2023-05-17 10:00"));
    }

    #[test]
    fn form_and_confirm_popups_render() {
        let conn = open_db_in_memory().unwrap();
        let service = ContactService::new(SqliteContactRepository::try_new(&conn).unwrap());
        let mut app = App::with_clock(service, clock).unwrap();

        app.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        let screen = render(&app);
        assert!(screen.contains("Add New Contact"));
        assert!(screen.contains("2024-01-02 08:00"));

        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let screen = render(&app);
        assert!(screen.contains("name is required"));

        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        let screen = render(&app);
        assert!(screen.contains("Are you sure you want to quit?"));
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 20, 4);
        let popup = centered_rect(50, 10, area);
        assert_eq!(popup, Rect::new(5, 0, 10, 4));
    }

    #[test]
    fn notes_preview_truncates_long_or_multiline_notes() {
        assert_eq!(notes_preview(None), "");
        assert_eq!(notes_preview(Some("short")), "short");
        assert_eq!(notes_preview(Some("line one\nline two")), "line one...");
        let long = "x".repeat(50);
        assert_eq!(notes_preview(Some(&long)).chars().count(), 43);
    }
}
