//! LMS CLI - submit course edits from the command line
//!
//! - `lms submit <edit.json>` persists a course tree and prints the result
//! - `lms plan <edit.json>` prints the calls a submission would make
//! - `lms check-config` prints the effective configuration

#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{build_cli, exit_code, read_edit, run, submit_edit};
pub use config::{AppConfig, ConfigError};
