//! Descriptor loading
//!
//! Turns a parsed key/value/array tree into a [`BuildDescriptor`]. TOML and
//! JSON text both parse into the same tree; Gradle build files go through
//! [`crate::gradle::import`] first. Every failure names the offending field
//! path, e.g. `android.defaultConfig.minSdk` or `dependencies[2].coordinate`.

use crate::descriptor::{
    BuildDescriptor, BuildType, CompileOptions, Coordinate, DependencyDeclaration, Scope,
    SdkBounds, VersionSpec,
};
use crate::error::{ResolveError, Result};
use crate::gradle;
use apkforge_core::ResultExt;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Descriptor text formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Toml,
    Json,
    Gradle,
}

impl DescriptorFormat {
    /// Guess the format from a file name
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".gradle") || name.ends_with(".gradle.kts") {
            return Some(Self::Gradle);
        }
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl FromStr for DescriptorFormat {
    type Err = apkforge_core::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "gradle" | "groovy" | "kts" => Ok(Self::Gradle),
            other => Err(apkforge_core::Error::unsupported_format(other)),
        }
    }
}

impl fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "toml",
            Self::Json => "json",
            Self::Gradle => "gradle",
        })
    }
}

/// Parse descriptor text into the generic tree the loader consumes
pub fn parse_text(text: &str, format: DescriptorFormat) -> Result<Value> {
    match format {
        DescriptorFormat::Toml => toml::from_str::<Value>(text)
            .map_err(|e| ResolveError::malformed("<document>", e.message().to_string())),
        DescriptorFormat::Json => serde_json::from_str::<Value>(text)
            .map_err(|e| ResolveError::malformed("<document>", e.to_string())),
        DescriptorFormat::Gradle => gradle::import(text),
    }
}

/// Read a descriptor file into the generic tree
pub fn read_file(path: &Path, format: DescriptorFormat) -> apkforge_core::Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            apkforge_core::Error::file_not_found(path)
        } else {
            apkforge_core::Error::from(e)
        }
    })?;
    parse_text(&text, format)
        .map_err(apkforge_core::Error::from)
        .context(format!("While reading {}", path.display()))
}

/// Read and load a descriptor file
pub fn load_file(path: &Path, format: DescriptorFormat) -> apkforge_core::Result<BuildDescriptor> {
    let raw = read_file(path, format)?;
    load(&raw)
        .map_err(apkforge_core::Error::from)
        .context(format!("While loading {}", path.display()))
}

/// A value together with its path from the document root
#[derive(Clone, Copy)]
struct Node<'a> {
    path: &'a str,
    value: &'a Value,
}

/// A value with an owned path, built for child keys and array elements
struct Field<'a> {
    path: String,
    value: &'a Value,
}

impl<'a> Field<'a> {
    fn node(&self) -> Node<'_> {
        Node {
            path: &self.path,
            value: self.value,
        }
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

impl<'a> Node<'a> {
    fn table(&self) -> Result<&'a Map<String, Value>> {
        self.value.as_object().ok_or_else(|| {
            ResolveError::malformed(
                display_path(self.path),
                format!("expected a table, found {}", kind(self.value)),
            )
        })
    }

    fn child(&self, key: &str) -> Result<Option<Field<'a>>> {
        Ok(self.table()?.get(key).map(|value| Field {
            path: join(self.path, key),
            value,
        }))
    }

    fn required(&self, key: &str) -> Result<Field<'a>> {
        self.child(key)?.ok_or_else(|| {
            ResolveError::malformed(join(self.path, key), "required field is missing")
        })
    }

    fn string(&self) -> Result<String> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(ResolveError::malformed(
                self.path,
                format!("expected a string, found {}", kind(other)),
            )),
        }
    }

    fn integer(&self) -> Result<i64> {
        match self.value {
            Value::Number(n) => n.as_i64().ok_or_else(|| {
                ResolveError::malformed(self.path, format!("expected an integer, found `{}`", n))
            }),
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                ResolveError::malformed(self.path, format!("expected an integer, found `{}`", s))
            }),
            other => Err(ResolveError::malformed(
                self.path,
                format!("expected an integer, found {}", kind(other)),
            )),
        }
    }

    fn api_level(&self) -> Result<u32> {
        let level = self.integer()?;
        u32::try_from(level).map_err(|_| {
            ResolveError::malformed(
                self.path,
                format!("expected a non-negative API level, found `{}`", level),
            )
        })
    }

    fn boolean(&self) -> Result<bool> {
        match self.value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s == "true" || s == "false" => Ok(s == "true"),
            other => Err(ResolveError::malformed(
                self.path,
                format!("expected a boolean, found {}", kind(other)),
            )),
        }
    }

    fn elements(&self) -> Result<Vec<Field<'a>>> {
        let items = self.value.as_array().ok_or_else(|| {
            ResolveError::malformed(self.path, format!("expected an array, found {}", kind(self.value)))
        })?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, value)| Field {
                path: format!("{}[{}]", self.path, i),
                value,
            })
            .collect())
    }

    fn strings(&self) -> Result<Vec<String>> {
        self.elements()?
            .iter()
            .map(|field| field.node().string())
            .collect()
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<document>" } else { path }
}

fn optional<T>(
    parent: Node<'_>,
    key: &str,
    read: impl FnOnce(Node<'_>) -> Result<T>,
) -> Result<Option<T>> {
    match parent.child(key)? {
        Some(field) => read(field.node()).map(Some),
        None => Ok(None),
    }
}

/// Load a descriptor from its parsed tree
pub fn load(raw: &Value) -> Result<BuildDescriptor> {
    let root = Node { path: "", value: raw };
    root.table()?;

    let plugins = optional(root, "plugins", |n| n.strings())?.unwrap_or_default();

    let android_field = root.required("android")?;
    let android = android_field.node();
    let compile_sdk = android.required("compileSdk")?.node().api_level()?;
    let ndk_version = optional(android, "ndkVersion", |n| n.string())?;

    let default_field = android.required("defaultConfig")?;
    let default_config = default_field.node();
    let application_id = default_config.required("applicationId")?.node().string()?;
    let min_sdk = default_config.required("minSdk")?.node().api_level()?;
    let target_sdk = default_config.required("targetSdk")?.node().api_level()?;
    let version_code = optional(default_config, "versionCode", |n| n.integer())?.unwrap_or(1);
    let version_name =
        optional(default_config, "versionName", |n| n.string())?.unwrap_or_else(|| "1.0".into());

    let abi_field = default_config.required("abiFilters")?;
    let abi_filters = abi_field.node().strings()?;
    if abi_filters.is_empty() {
        return Err(ResolveError::malformed(
            abi_field.path,
            "at least one ABI is required",
        ));
    }

    let compile_options = load_compile_options(android)?;
    let no_compress = match android.child("packaging")? {
        Some(packaging) => optional(packaging.node(), "noCompress", |n| n.strings())?.unwrap_or_default(),
        None => Vec::new(),
    };
    let build_types = load_build_types(android)?;

    let dependencies = match root.child("dependencies")? {
        Some(field) => field
            .node()
            .elements()?
            .iter()
            .map(|item| load_dependency(item.node()))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let descriptor = BuildDescriptor {
        application_id,
        version_code,
        version_name,
        sdk: SdkBounds {
            min_sdk,
            target_sdk,
            compile_sdk,
        },
        ndk_version,
        abi_filters,
        compile_options,
        plugins,
        no_compress,
        build_types,
        dependencies,
    };

    tracing::debug!(
        application_id = %descriptor.application_id,
        abis = descriptor.abi_filters.len(),
        dependencies = descriptor.dependencies.len(),
        "Descriptor loaded"
    );

    Ok(descriptor)
}

fn load_compile_options(android: Node<'_>) -> Result<CompileOptions> {
    let mut options = CompileOptions::default();
    if let Some(field) = android.child("compileOptions")? {
        let node = field.node();
        options.source_compatibility = optional(node, "sourceCompatibility", |n| n.string())?;
        options.target_compatibility = optional(node, "targetCompatibility", |n| n.string())?;
    }
    if let Some(field) = android.child("kotlinOptions")? {
        options.jvm_target = optional(field.node(), "jvmTarget", |n| n.string())?;
    }
    Ok(options)
}

fn load_build_types(android: Node<'_>) -> Result<BTreeMap<String, BuildType>> {
    let Some(field) = android.child("buildTypes")? else {
        return Ok(BTreeMap::new());
    };
    let node = field.node();
    let mut build_types = BTreeMap::new();
    for name in node.table()?.keys() {
        let entry = node.required(name)?;
        let entry = entry.node();
        entry.table()?;
        build_types.insert(
            name.clone(),
            BuildType {
                signing_config: optional(entry, "signingConfig", |n| n.string())?,
                minify_enabled: optional(entry, "minifyEnabled", |n| n.boolean())?.unwrap_or(false),
            },
        );
    }
    Ok(build_types)
}

/// A blank version string means the version is left to a BOM or catalog
fn version_spec(version: &str) -> VersionSpec {
    match version.trim() {
        "" => VersionSpec::Inherited,
        v => VersionSpec::Explicit(v.to_string()),
    }
}

/// Split `group:artifact[:version]` notation
fn split_notation(notation: &str) -> (Coordinate, VersionSpec) {
    let mut parts = notation.trim().splitn(3, ':');
    let group = parts.next().unwrap_or_default();
    let artifact = parts.next().unwrap_or_default();
    let version = parts.next().map_or(VersionSpec::Inherited, version_spec);
    (Coordinate::new(group, artifact), version)
}

fn load_dependency(node: Node<'_>) -> Result<DependencyDeclaration> {
    if let Value::String(notation) = node.value {
        let (coordinate, version) = split_notation(notation);
        return Ok(DependencyDeclaration {
            coordinate,
            version,
            scope: Scope::Compile,
            platform: false,
        });
    }

    node.table()?;
    let (coordinate, notation_version) = match node.child("coordinate")? {
        Some(field) => split_notation(&field.node().string()?),
        None => {
            let group = node.required("group")?.node().string()?;
            let artifact = node.required("artifact")?.node().string()?;
            (Coordinate::new(group, artifact), VersionSpec::Inherited)
        }
    };

    let version = match optional(node, "version", |n| n.string())?.map(|v| version_spec(&v)) {
        Some(VersionSpec::Inherited) | None => notation_version,
        Some(explicit) => explicit,
    };

    let scope = match node.child("scope")? {
        Some(field) => {
            let name = field.node().string()?;
            Scope::from_configuration(&name).ok_or_else(|| {
                ResolveError::malformed(&field.path, format!("unknown dependency scope `{}`", name))
            })?
        }
        None => Scope::Compile,
    };

    let platform = optional(node, "platform", |n| n.boolean())?.unwrap_or(false);

    Ok(DependencyDeclaration {
        coordinate,
        version,
        scope,
        platform,
    })
}
