//! Configuration loading and schema definitions
//!
//! Tool settings shared by every apkforge command.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
