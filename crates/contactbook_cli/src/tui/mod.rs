//! Full-screen terminal interface.

pub mod app;
pub mod form;
mod terminal;
pub mod ui;

pub use app::{App, Mode, PendingConfirm, StatusKind, StatusLine};
pub use form::{ContactForm, FormAction, FormTarget};
pub use terminal::run;
