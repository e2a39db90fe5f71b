//! In-memory build descriptor model
//!
//! A [`BuildDescriptor`] is produced once per invocation by the loader and
//! never mutated afterwards; later stages only borrow it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// SDK API levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkBounds {
    pub min_sdk: u32,
    pub target_sdk: u32,
    pub compile_sdk: u32,
}

/// Java/Kotlin language compatibility levels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_compatibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_compatibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jvm_target: Option<String>,
}

/// A named build type (`debug`, `release`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_config: Option<String>,
    pub minify_enabled: bool,
}

/// Library coordinate (`group:artifact`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
}

impl Coordinate {
    /// Create a coordinate from its parts
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Where a declaration's version comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VersionSpec {
    /// Version written on the declaration
    Explicit(String),
    /// Version supplied by a platform/BOM (or a version catalog)
    Inherited,
}

impl VersionSpec {
    /// The explicit version, if any
    pub fn explicit(&self) -> Option<&str> {
        match self {
            Self::Explicit(v) => Some(v),
            Self::Inherited => None,
        }
    }
}

/// Dependency scope, widest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Compile,
    CompileOnly,
    Runtime,
    Test,
}

impl Scope {
    /// Map a Gradle configuration (or plain scope) name
    pub fn from_configuration(name: &str) -> Option<Self> {
        match name {
            "implementation" | "api" | "compile" => Some(Self::Compile),
            "compileOnly" | "compile-only" => Some(Self::CompileOnly),
            "runtimeOnly" | "runtime" => Some(Self::Runtime),
            "testImplementation" | "androidTestImplementation" | "testRuntimeOnly" | "test" => {
                Some(Self::Test)
            }
            _ => None,
        }
    }

    /// The wider of two scopes
    pub fn widest(self, other: Self) -> Self {
        self.min(other)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compile => "compile",
            Self::CompileOnly => "compile-only",
            Self::Runtime => "runtime",
            Self::Test => "test",
        })
    }
}

/// One library reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDeclaration {
    pub coordinate: Coordinate,
    pub version: VersionSpec,
    pub scope: Scope,
    /// Declared through `platform(...)`: pins versions for its group
    pub platform: bool,
}

impl DependencyDeclaration {
    /// Ordinary compile-scope declaration with an explicit version
    pub fn library(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            coordinate: Coordinate::new(group, artifact),
            version: VersionSpec::Explicit(version.to_string()),
            scope: Scope::Compile,
            platform: false,
        }
    }

    /// Ordinary compile-scope declaration whose version is inherited
    pub fn managed(group: &str, artifact: &str) -> Self {
        Self {
            coordinate: Coordinate::new(group, artifact),
            version: VersionSpec::Inherited,
            scope: Scope::Compile,
            platform: false,
        }
    }

    /// Platform (BOM) declaration
    pub fn bom(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            platform: true,
            ..Self::library(group, artifact, version)
        }
    }
}

/// The root build descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDescriptor {
    pub application_id: String,
    pub version_code: i64,
    pub version_name: String,
    pub sdk: SdkBounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndk_version: Option<String>,
    pub abi_filters: Vec<String>,
    pub compile_options: CompileOptions,
    pub plugins: Vec<String>,
    pub no_compress: Vec<String>,
    pub build_types: BTreeMap<String, BuildType>,
    pub dependencies: Vec<DependencyDeclaration>,
}

impl BuildDescriptor {
    /// Signing config used for release builds
    pub fn signing_config(&self) -> Option<&str> {
        self.build_types.get("release")?.signing_config.as_deref()
    }

    /// Whether a plugin is applied
    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.iter().any(|p| p == id)
    }
}
