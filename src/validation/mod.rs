//! Diagnostics reported for lines that do not yield a position

pub mod error;

pub use error::{Diagnostic, Stage};
