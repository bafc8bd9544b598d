//! Terminal setup, teardown and the blocking event loop.
//!
//! # Invariants
//! - Raw mode and the alternate screen are left on every exit path,
//!   including panics.

use super::app::App;
use super::ui;
use contactbook_core::ContactRepository;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Once;

type Backend = CrosstermBackend<Stdout>;

static RESTORE_HOOK: Once = Once::new();

/// Owns the terminal while the UI runs and restores it on drop.
struct TerminalGuard {
    terminal: Terminal<Backend>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        install_restore_hook();
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                restore_terminal();
                return Err(err);
            }
        };
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
        let _ = self.terminal.show_cursor();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Leaves raw mode before the previous hook prints the panic message.
fn install_restore_hook() {
    RESTORE_HOOK.call_once(|| {
        let previous_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            restore_terminal();
            previous_hook(panic_info);
        }));
    });
}

/// Runs the UI until the user quits.
pub fn run<R: ContactRepository>(app: &mut App<R>) -> io::Result<()> {
    let mut guard = TerminalGuard::enter()?;
    info!("event=tui_start module=tui status=ok");

    while !app.should_quit() {
        guard.terminal.draw(|f| ui::draw(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
            Event::Resize(width, height) => {
                debug!("event=tui_resize module=tui width={width} height={height}");
            }
            _ => {}
        }
    }

    info!("event=tui_stop module=tui status=ok");
    Ok(())
}
