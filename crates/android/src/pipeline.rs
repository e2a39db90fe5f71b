//! Descriptor pipeline: load, validate, then resolve packaging and
//! dependencies side by side.

use crate::catalog::VersionCatalog;
use crate::dependencies::{resolve_dependencies, ResolvedDependency};
use crate::descriptor::BuildDescriptor;
use crate::error::Result;
use crate::loader;
use crate::packaging::{resolve_packaging, PackagingManifest};
use crate::validate::{validate, ValidatedDescriptor};
use apkforge_telemetry::timed_span;
use serde::Serialize;
use serde_json::Value;

/// Everything the downstream packaging tool consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub descriptor: BuildDescriptor,
    pub manifest: PackagingManifest,
    pub dependencies: Vec<ResolvedDependency>,
}

/// Resolution pipeline, optionally backed by a version catalog
#[derive(Clone, Copy, Default)]
pub struct Pipeline<'c> {
    catalog: Option<&'c dyn VersionCatalog>,
}

impl<'c> Pipeline<'c> {
    /// Pipeline without a version catalog
    pub fn new() -> Self {
        Self { catalog: None }
    }

    /// Consult `catalog` for versions nothing else pins
    pub fn with_catalog(mut self, catalog: &'c dyn VersionCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Run every stage on a raw descriptor tree
    pub fn run(&self, raw: &Value) -> Result<Resolution> {
        let descriptor = timed_span!("load", loader::load(raw))?;
        self.run_descriptor(descriptor)
    }

    /// Run validation and resolution on an already loaded descriptor
    pub fn run_descriptor(&self, descriptor: BuildDescriptor) -> Result<Resolution> {
        let validated = timed_span!("validate", validate(descriptor))?;
        let (manifest, dependencies) = self.resolve(&validated);

        Ok(Resolution {
            manifest,
            dependencies: dependencies?,
            descriptor: validated.into_inner(),
        })
    }

    fn resolve(
        &self,
        validated: &ValidatedDescriptor,
    ) -> (PackagingManifest, Result<Vec<ResolvedDependency>>) {
        rayon::join(
            || timed_span!("packaging", resolve_packaging(validated)),
            || timed_span!("dependencies", resolve_dependencies(validated, self.catalog)),
        )
    }
}
