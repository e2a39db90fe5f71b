//! Android build descriptor resolution for apkforge
//!
//! This crate turns an application-module build descriptor into what a
//! packaging tool needs:
//! - Loading from TOML, JSON or Gradle DSL text
//! - Constraint validation (SDK bounds, ABIs, identifiers, coordinates)
//! - Packaging rules: native ABI directories and uncompressed assets
//! - A version-pinned dependency set honouring platform BOMs and catalogs

pub mod abi;
pub mod catalog;
pub mod dependencies;
pub mod descriptor;
pub mod error;
pub mod gradle;
pub mod loader;
pub mod packaging;
pub mod pipeline;
pub mod validate;

#[cfg(test)]
mod test_fixtures;

pub use abi::Abi;
pub use catalog::{TomlCatalog, VersionCatalog};
pub use dependencies::{resolve_dependencies, ResolvedDependency, VersionSource};
pub use descriptor::{BuildDescriptor, Coordinate, DependencyDeclaration, Scope, VersionSpec};
pub use error::{ResolveError, Result};
pub use gradle::import as import_gradle;
pub use loader::{load, DescriptorFormat};
pub use packaging::{resolve_packaging, AssetMatcher, PackagingManifest};
pub use pipeline::{Pipeline, Resolution};
pub use validate::{validate, ValidatedDescriptor};
