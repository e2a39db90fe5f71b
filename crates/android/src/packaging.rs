//! Packaging rule resolution
//!
//! Turns the validated ABI filters and `noCompress` entries into the
//! [`PackagingManifest`] the archive assembler consumes.

use crate::abi::Abi;
use crate::validate::ValidatedDescriptor;
use glob::{MatchOptions, Pattern};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Concrete matcher for assets stored without compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetMatcher {
    /// Case-insensitive file-name suffix, e.g. `tflite`
    Suffix(String),
    /// Glob over the asset path, e.g. `models/*.bin`
    Glob(Pattern),
}

impl AssetMatcher {
    /// Expand a `noCompress` entry
    pub fn parse(pattern: &str) -> Self {
        let normalized = pattern.trim().trim_start_matches('.');
        if normalized.contains(['*', '?', '[']) {
            if let Ok(glob) = Pattern::new(normalized) {
                return Self::Glob(glob);
            }
        }
        Self::Suffix(normalized.to_lowercase())
    }

    /// Whether an asset path (`/`-separated, relative to the archive root) matches
    pub fn matches(&self, asset: &str) -> bool {
        match self {
            Self::Suffix(suffix) => asset.to_lowercase().ends_with(suffix.as_str()),
            Self::Glob(glob) => {
                let file_name = asset.rsplit('/').next().unwrap_or(asset);
                glob.matches_with(asset, MATCH_OPTIONS)
                    || (!glob.as_str().contains('/') && glob.matches_with(file_name, MATCH_OPTIONS))
            }
        }
    }

    /// The normalized pattern text
    pub fn as_str(&self) -> &str {
        match self {
            Self::Suffix(suffix) => suffix,
            Self::Glob(glob) => glob.as_str(),
        }
    }
}

impl Serialize for AssetMatcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AssetMatcher", 2)?;
        let kind = match self {
            Self::Suffix(_) => "suffix",
            Self::Glob(_) => "glob",
        };
        state.serialize_field("kind", kind)?;
        state.serialize_field("pattern", self.as_str())?;
        state.end()
    }
}

/// Derived packaging rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagingManifest {
    /// Native-library architectures to bundle, in declaration order
    pub abis: Vec<Abi>,
    /// Matchers for assets stored uncompressed, without duplicates
    pub uncompressed: Vec<AssetMatcher>,
}

impl PackagingManifest {
    /// `lib/<abi>` directories to package
    pub fn lib_dirs(&self) -> Vec<String> {
        self.abis.iter().map(Abi::lib_dir).collect()
    }

    /// Whether an asset is stored uncompressed
    pub fn is_uncompressed(&self, asset: &str) -> bool {
        self.uncompressed.iter().any(|m| m.matches(asset))
    }

    /// Assets exempted from compression, each listed once however many
    /// matchers it hits, in input order
    pub fn exempt_assets<'a, I>(&self, assets: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        assets
            .into_iter()
            .filter(|asset| self.is_uncompressed(asset))
            .filter(|asset| seen.insert(*asset))
            .collect()
    }
}

/// Resolve the packaging manifest for a validated descriptor
pub fn resolve_packaging(descriptor: &ValidatedDescriptor) -> PackagingManifest {
    let mut abis = Vec::new();
    for abi in descriptor
        .abi_filters
        .iter()
        .filter_map(|name| name.parse::<Abi>().ok())
    {
        if !abis.contains(&abi) {
            abis.push(abi);
        }
    }

    let mut uncompressed: Vec<AssetMatcher> = Vec::new();
    for matcher in descriptor.no_compress.iter().map(|p| AssetMatcher::parse(p)) {
        if !uncompressed.contains(&matcher) {
            uncompressed.push(matcher);
        }
    }

    tracing::debug!(
        abis = abis.len(),
        uncompressed = uncompressed.len(),
        "Packaging manifest resolved"
    );

    PackagingManifest { abis, uncompressed }
}
