//! Utility functions module
//!
//! Output formatting shared by the command-line front end.

pub mod format;

pub use format::*;
