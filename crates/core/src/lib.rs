//! Core utilities for apkforge
//!
//! This crate provides shared functionality used by the descriptor pipeline and CLI:
//!
//! - **Error handling**: errors with codes, context, recovery suggestions and exit codes
//! - **Configuration**: TOML-based tool configuration with defaults
//! - **Validation**: ordered, short-circuiting rule checks
//!
//! # Example
//!
//! ```rust,no_run
//! use apkforge_core::config::Config;
//!
//! let config = Config::load(None).expect("config");
//! println!("default format: {}", config.schema.general.default_format);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::validation::{Validator, Violation};
}
