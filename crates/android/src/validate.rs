//! Descriptor constraint validation
//!
//! Rules run in a fixed order and stop at the first failure:
//!
//! 1. `minSdk<=targetSdk`, `targetSdk<=compileSdk`, `minSdk>0`
//! 2. `abiFilters non-empty`, `abiFilters known`
//! 3. `versionCode>0`
//! 4. `dependency coordinate well-formed`
//! 5. `applicationId reverse-domain`
//! 6. `noCompress pattern well-formed`

use crate::abi::Abi;
use crate::descriptor::{BuildDescriptor, DependencyDeclaration};
use crate::error::Result;
use apkforge_core::validation::Validator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Deref;

static APPLICATION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").unwrap()
});

/// A descriptor that passed every rule
///
/// Only [`validate`] constructs one, so later stages can rely on the
/// invariants without re-checking them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDescriptor(BuildDescriptor);

impl ValidatedDescriptor {
    /// Unwrap the descriptor
    pub fn into_inner(self) -> BuildDescriptor {
        self.0
    }
}

impl Deref for ValidatedDescriptor {
    type Target = BuildDescriptor;

    fn deref(&self) -> &BuildDescriptor {
        &self.0
    }
}

fn segment_ok(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(':') && !segment.chars().any(char::is_whitespace)
}

/// Describe the first dependency whose coordinate or version is malformed
fn malformed_dependency(dependencies: &[DependencyDeclaration]) -> Option<String> {
    dependencies.iter().enumerate().find_map(|(i, dep)| {
        let coordinate = &dep.coordinate;
        if !segment_ok(&coordinate.group) || !segment_ok(&coordinate.artifact) {
            return Some(format!(
                "dependencies[{}]: `{}` needs a non-empty group and artifact",
                i, coordinate
            ));
        }
        match dep.version.explicit() {
            Some(version) if !segment_ok(version) => Some(format!(
                "dependencies[{}]: `{}` has malformed version `{}`",
                i, coordinate, version
            )),
            _ => None,
        }
    })
}

fn malformed_pattern(patterns: &[String]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let trimmed = pattern.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Some(format!("noCompress entry `{}` is empty", pattern));
        }
        glob::Pattern::new(trimmed)
            .err()
            .map(|e| format!("noCompress entry `{}` is not a valid pattern: {}", pattern, e))
    })
}

/// Check a loaded descriptor against every rule, in order
pub fn validate(descriptor: BuildDescriptor) -> Result<ValidatedDescriptor> {
    let sdk = descriptor.sdk;

    Validator::new()
        .ordered("minSdk<=targetSdk", ("minSdk", sdk.min_sdk), ("targetSdk", sdk.target_sdk))
        .ordered(
            "targetSdk<=compileSdk",
            ("targetSdk", sdk.target_sdk),
            ("compileSdk", sdk.compile_sdk),
        )
        .positive("minSdk>0", "minSdk", i64::from(sdk.min_sdk))
        .non_empty("abiFilters non-empty", "abiFilters", &descriptor.abi_filters)
        .all_one_of(
            "abiFilters known",
            "abiFilters",
            descriptor.abi_filters.iter().map(String::as_str),
            &Abi::NAMES,
        )
        .positive("versionCode>0", "versionCode", descriptor.version_code)
        .custom("dependency coordinate well-formed", || {
            malformed_dependency(&descriptor.dependencies)
        })
        .pattern(
            "applicationId reverse-domain",
            "applicationId",
            &descriptor.application_id,
            &APPLICATION_ID,
            "reverse-domain form such as com.example.app",
        )
        .custom("noCompress pattern well-formed", || {
            malformed_pattern(&descriptor.no_compress)
        })
        .validate()?;

    tracing::debug!(application_id = %descriptor.application_id, "Descriptor validated");
    Ok(ValidatedDescriptor(descriptor))
}
