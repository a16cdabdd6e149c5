//! Command-line interface module
//!
//! This module contains the command-line interface definitions and command
//! handlers for dashconf.

pub mod commands;

pub use commands::*;
