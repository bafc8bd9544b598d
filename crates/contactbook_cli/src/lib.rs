//! Terminal front end for the contact book.

pub mod batch;
pub mod cli;
pub mod config;
pub mod tui;
