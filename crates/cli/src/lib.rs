//! CLI utilities for apkforge
//!
//! Provides shared CLI functionality:
//! - Terminal output formatting
//! - Status and failure messages

#![warn(missing_docs)]

pub mod output;
