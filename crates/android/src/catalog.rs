//! Read-only version catalogs
//!
//! The TOML implementation reads the `libs.versions.toml` shape:
//!
//! ```toml
//! [versions]
//! tflite = "2.14.0"
//!
//! [libraries]
//! tflite = { module = "org.tensorflow:tensorflow-lite", version.ref = "tflite" }
//! kotlin-stdlib = "org.jetbrains.kotlin:kotlin-stdlib:1.9.10"
//! ```

use crate::descriptor::Coordinate;
use apkforge_core::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use toml::Value;

/// Coordinate to version lookup, consulted only for unpinned declarations
pub trait VersionCatalog: Send + Sync {
    /// Version the catalog assigns to a coordinate
    fn version_for(&self, coordinate: &Coordinate) -> Option<&str>;
}

impl VersionCatalog for HashMap<Coordinate, String> {
    fn version_for(&self, coordinate: &Coordinate) -> Option<&str> {
        self.get(coordinate).map(String::as_str)
    }
}

/// Version catalog backed by a `libs.versions.toml` document
#[derive(Debug, Clone, Default)]
pub struct TomlCatalog {
    entries: HashMap<Coordinate, String>,
}

impl TomlCatalog {
    /// Parse a catalog document
    pub fn parse(text: &str) -> Result<Self> {
        let doc: toml::Table = toml::from_str(text)?;

        let mut aliases = HashMap::new();
        if let Some(versions) = doc.get("versions") {
            let versions = versions
                .as_table()
                .ok_or_else(|| Error::catalog("[versions] must be a table"))?;
            for (alias, value) in versions {
                let version = version_value(value)
                    .ok_or_else(|| Error::catalog(format!("versions.{alias} has no usable version")))?;
                aliases.insert(alias.as_str(), version);
            }
        }

        let mut entries = HashMap::new();
        if let Some(libraries) = doc.get("libraries") {
            let libraries = libraries
                .as_table()
                .ok_or_else(|| Error::catalog("[libraries] must be a table"))?;
            for (alias, value) in libraries {
                if let Some((coordinate, version)) = library(alias, value, &aliases)? {
                    entries.insert(coordinate, version);
                }
            }
        }

        Ok(Self { entries })
    }

    /// Read and parse a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&text).map_err(|e| e.with_context(path.display().to_string()))?;
        tracing::debug!(path = %path.display(), entries = catalog.len(), "Version catalog loaded");
        Ok(catalog)
    }

    /// Number of coordinates with a version
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog pins nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VersionCatalog for TomlCatalog {
    fn version_for(&self, coordinate: &Coordinate) -> Option<&str> {
        self.entries.version_for(coordinate)
    }
}

/// A version written either as a string or as a rich version table
fn version_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Table(rich) => ["strictly", "require", "prefer"]
            .iter()
            .find_map(|key| rich.get(*key)?.as_str().map(str::to_string)),
        _ => None,
    }
}

/// One `[libraries]` entry; entries without any version are skipped
fn library(
    alias: &str,
    value: &Value,
    aliases: &HashMap<&str, String>,
) -> Result<Option<(Coordinate, String)>> {
    let malformed = |reason: &str| Error::catalog(format!("libraries.{alias}: {reason}"));

    match value {
        Value::String(notation) => {
            let mut parts = notation.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(g), Some(a), version) if !g.is_empty() && !a.is_empty() => {
                    Ok(version.map(|v| (Coordinate::new(g, a), v.to_string())))
                }
                _ => Err(malformed("expected `group:artifact:version`")),
            }
        }
        Value::Table(entry) => {
            let coordinate = match (entry.get("module"), entry.get("group"), entry.get("name")) {
                (Some(Value::String(module)), _, _) => match module.split_once(':') {
                    Some((g, a)) if !g.is_empty() && !a.is_empty() && !a.contains(':') => {
                        Coordinate::new(g, a)
                    }
                    _ => return Err(malformed("`module` must be `group:artifact`")),
                },
                (None, Some(Value::String(g)), Some(Value::String(a))) => Coordinate::new(g, a),
                _ => return Err(malformed("needs `module` or `group` and `name`")),
            };

            let version = match entry.get("version") {
                None => None,
                Some(Value::Table(v)) if v.contains_key("ref") => {
                    let name = v
                        .get("ref")
                        .and_then(Value::as_str)
                        .ok_or_else(|| malformed("`version.ref` must be a string"))?;
                    let pinned = aliases
                        .get(name)
                        .ok_or_else(|| malformed(&format!("unknown version alias `{name}`")))?;
                    Some(pinned.clone())
                }
                Some(v) => Some(version_value(v).ok_or_else(|| malformed("unusable version"))?),
            };

            Ok(version.map(|v| (coordinate, v)))
        }
        _ => Err(malformed("expected a string or a table")),
    }
}
