//! Command-line interface module.
//!
//! This module provides the CLI functionality for:
//! - One-shot generation
//! - Interactive chat
//! - Logging configuration

pub mod commands;
pub mod handlers;
pub mod options;

pub use handlers::{handle_chat, handle_generate, open_session};
pub use options::{Cli, LoggingConfig};
