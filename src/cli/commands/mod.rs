//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod chat;
pub mod ingest;
pub mod init;
pub mod search;
