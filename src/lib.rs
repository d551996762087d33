//! Bookshelf application library
//!
//! The books module and the startup wiring shared by the server binary and
//! the CLI.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::{migrate, serve, AppContext};
