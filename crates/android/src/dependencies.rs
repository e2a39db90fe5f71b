//! Dependency set resolution
//!
//! Platform (BOM) declarations are read first into a group → version table,
//! so the position of a BOM in the list never changes the outcome. Ordinary
//! declarations are then merged per coordinate:
//!
//! - several distinct explicit versions: the BOM for the group wins, or the
//!   set is rejected
//! - one explicit version: that version
//! - no explicit version: the BOM, then the version catalog, or rejected
//!
//! Output follows first-declaration order, BOMs included.

use crate::catalog::VersionCatalog;
use crate::descriptor::{Coordinate, DependencyDeclaration, Scope};
use crate::error::{ResolveError, Result};
use crate::validate::ValidatedDescriptor;
use serde::Serialize;
use std::collections::HashMap;

/// Where a pinned version came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VersionSource {
    /// Written on the declaration
    Explicit,
    /// Pinned by a platform declaration
    Bom { bom: Coordinate },
    /// Looked up in the version catalog
    Catalog,
}

/// One entry of the resolved dependency sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub coordinate: Coordinate,
    pub version: String,
    pub scope: Scope,
    pub platform: bool,
    pub source: VersionSource,
}

impl ResolvedDependency {
    /// `group:artifact:version` notation
    pub fn notation(&self) -> String {
        format!("{}:{}", self.coordinate, self.version)
    }
}

type Key<'a> = (bool, &'a Coordinate);

/// Declarations grouped by (platform, coordinate), in first-declaration order
struct Grouped<'a> {
    order: Vec<Key<'a>>,
    members: HashMap<Key<'a>, Vec<&'a DependencyDeclaration>>,
}

impl<'a> Grouped<'a> {
    fn new(declarations: &'a [DependencyDeclaration]) -> Self {
        let mut order = Vec::new();
        let mut members: HashMap<Key<'a>, Vec<&'a DependencyDeclaration>> = HashMap::new();
        for dep in declarations {
            let key = (dep.platform, &dep.coordinate);
            members
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(dep);
        }
        Self { order, members }
    }

    fn get(&self, key: &Key<'a>) -> &[&'a DependencyDeclaration] {
        self.members.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Distinct explicit versions, in declaration order
fn explicit_versions<'a>(decls: &[&'a DependencyDeclaration]) -> Vec<&'a str> {
    let mut versions: Vec<&str> = Vec::new();
    for version in decls.iter().filter_map(|d| d.version.explicit()) {
        if !versions.contains(&version) {
            versions.push(version);
        }
    }
    versions
}

fn merged_scope(decls: &[&DependencyDeclaration]) -> Scope {
    decls
        .iter()
        .map(|d| d.scope)
        .reduce(Scope::widest)
        .unwrap_or(Scope::Compile)
}

struct Bom<'a> {
    coordinate: &'a Coordinate,
    version: String,
    source: VersionSource,
}

fn resolve_bom<'a>(
    coordinate: &'a Coordinate,
    decls: &[&DependencyDeclaration],
    catalog: Option<&dyn VersionCatalog>,
) -> Result<Bom<'a>> {
    let versions = explicit_versions(decls);
    let (version, source) = match versions.as_slice() {
        [version] => (version.to_string(), VersionSource::Explicit),
        [] => match catalog.and_then(|c| c.version_for(coordinate)) {
            Some(version) => (version.to_string(), VersionSource::Catalog),
            None => {
                return Err(ResolveError::conflict(
                    coordinate,
                    "platform declaration has no version",
                ));
            }
        },
        many => {
            return Err(ResolveError::conflict(
                coordinate,
                format!("platform declared with versions {}", many.join(", ")),
            ));
        }
    };
    Ok(Bom {
        coordinate,
        version,
        source,
    })
}

/// Pin one version per coordinate
pub fn resolve_dependencies(
    descriptor: &ValidatedDescriptor,
    catalog: Option<&dyn VersionCatalog>,
) -> Result<Vec<ResolvedDependency>> {
    let grouped = Grouped::new(&descriptor.dependencies);

    let mut platforms: HashMap<&Coordinate, Bom<'_>> = HashMap::new();
    let mut pinned_groups: HashMap<&str, &Coordinate> = HashMap::new();
    for key in grouped.order.iter().filter(|(platform, _)| *platform) {
        let bom = resolve_bom(key.1, grouped.get(key), catalog)?;
        let group = bom.coordinate.group.as_str();
        match pinned_groups.get(group).and_then(|owner| platforms.get(*owner)) {
            Some(existing) if existing.version != bom.version => {
                return Err(ResolveError::conflict(
                    bom.coordinate,
                    format!(
                        "group {} is pinned to {} by {} and to {} by {}",
                        group, existing.version, existing.coordinate, bom.version, bom.coordinate
                    ),
                ));
            }
            Some(_) => {}
            None => {
                pinned_groups.insert(group, bom.coordinate);
            }
        }
        platforms.insert(bom.coordinate, bom);
    }

    let mut resolved = Vec::with_capacity(grouped.order.len());
    for key in &grouped.order {
        let (platform, coordinate) = *key;
        let decls = grouped.get(key);
        let scope = merged_scope(decls);

        if let Some(bom) = platforms.get(coordinate).filter(|_| platform) {
            resolved.push(ResolvedDependency {
                coordinate: coordinate.clone(),
                version: bom.version.clone(),
                scope,
                platform,
                source: bom.source.clone(),
            });
            continue;
        }

        let bom = pinned_groups
            .get(coordinate.group.as_str())
            .and_then(|owner| platforms.get(*owner));
        let pinned_by_bom = |bom: &Bom<'_>| {
            (
                bom.version.clone(),
                VersionSource::Bom {
                    bom: bom.coordinate.clone(),
                },
            )
        };

        let (version, source) = match (explicit_versions(decls).as_slice(), bom) {
            ([version], _) => (version.to_string(), VersionSource::Explicit),
            ([], Some(bom)) => pinned_by_bom(bom),
            ([], None) => match catalog.and_then(|c| c.version_for(coordinate)) {
                Some(version) => (version.to_string(), VersionSource::Catalog),
                None => {
                    return Err(ResolveError::conflict(
                        coordinate,
                        "no version declared and no platform or catalog entry pins it",
                    ));
                }
            },
            (many, Some(bom)) => {
                tracing::warn!(
                    coordinate = %coordinate,
                    declared = %many.join(", "),
                    pinned = %bom.version,
                    "Conflicting versions settled by platform"
                );
                pinned_by_bom(bom)
            }
            (many, None) => {
                return Err(ResolveError::conflict(
                    coordinate,
                    format!("declared with versions {}", many.join(", ")),
                ));
            }
        };

        if decls.len() > 1 {
            tracing::debug!(
                coordinate = %coordinate,
                merged = decls.len(),
                "Duplicate declarations merged"
            );
        }

        resolved.push(ResolvedDependency {
            coordinate: coordinate.clone(),
            version,
            scope,
            platform,
            source,
        });
    }

    tracing::debug!(
        resolved = resolved.len(),
        platforms = platforms.len(),
        "Dependency set resolved"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::with_dependencies;
    use crate::validate::validate;
    use proptest::prelude::*;

    fn resolve(
        dependencies: Vec<DependencyDeclaration>,
        catalog: Option<&dyn VersionCatalog>,
    ) -> Result<Vec<ResolvedDependency>> {
        let validated = validate(with_dependencies(dependencies)).unwrap();
        resolve_dependencies(&validated, catalog)
    }

    fn conflict_on(result: Result<Vec<ResolvedDependency>>) -> String {
        match result.unwrap_err() {
            ResolveError::VersionConflict { coordinate, .. } => coordinate,
            other => panic!("expected VersionConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_conflicting_explicit_versions() {
        let result = resolve(
            vec![
                DependencyDeclaration::library("org.example", "widget", "1.0"),
                DependencyDeclaration::library("org.example", "widget", "2.0"),
            ],
            None,
        );
        assert_eq!(conflict_on(result), "org.example:widget");
    }

    #[test]
    fn test_bom_fills_missing_version() {
        let resolved = resolve(
            vec![
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "32.7.4"),
                DependencyDeclaration::managed("com.google.firebase", "firebase-auth"),
            ],
            None,
        )
        .unwrap();

        assert_eq!(resolved.len(), 2);
        assert!(resolved[0].platform);
        assert_eq!(resolved[1].version, "32.7.4");
        assert_eq!(
            resolved[1].source,
            VersionSource::Bom {
                bom: Coordinate::new("com.google.firebase", "firebase-bom")
            }
        );
    }

    #[test]
    fn test_bom_position_does_not_matter() {
        let resolved = resolve(
            vec![
                DependencyDeclaration::managed("com.google.firebase", "firebase-database"),
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "32.7.4"),
            ],
            None,
        )
        .unwrap();

        assert_eq!(resolved[0].coordinate.artifact, "firebase-database");
        assert_eq!(resolved[0].version, "32.7.4");
        assert_eq!(resolved[1].coordinate.artifact, "firebase-bom");
    }

    #[test]
    fn test_bom_settles_conflict() {
        let resolved = resolve(
            vec![
                DependencyDeclaration::library("com.google.firebase", "firebase-auth", "22.0.0"),
                DependencyDeclaration::library("com.google.firebase", "firebase-auth", "22.3.1"),
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "32.7.4"),
            ],
            None,
        )
        .unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].version, "32.7.4");
    }

    #[test]
    fn test_single_explicit_version_beats_bom() {
        let resolved = resolve(
            vec![
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "32.7.4"),
                DependencyDeclaration::library("com.google.firebase", "firebase-auth", "22.0.0"),
            ],
            None,
        )
        .unwrap();
        assert_eq!(resolved[1].version, "22.0.0");
        assert_eq!(resolved[1].source, VersionSource::Explicit);
    }

    #[test]
    fn test_conflicting_boms() {
        let result = resolve(
            vec![
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "32.7.4"),
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "33.0.0"),
            ],
            None,
        );
        assert_eq!(conflict_on(result), "com.google.firebase:firebase-bom");

        let result = resolve(
            vec![
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "32.7.4"),
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom-ktx", "33.0.0"),
            ],
            None,
        );
        assert_eq!(conflict_on(result), "com.google.firebase:firebase-bom-ktx");
    }

    #[test]
    fn test_catalog_fallback() {
        let mut catalog = HashMap::new();
        catalog.insert(
            Coordinate::new("org.tensorflow", "tensorflow-lite"),
            "2.14.0".to_string(),
        );

        let resolved = resolve(
            vec![DependencyDeclaration::managed("org.tensorflow", "tensorflow-lite")],
            Some(&catalog),
        )
        .unwrap();
        assert_eq!(resolved[0].version, "2.14.0");
        assert_eq!(resolved[0].source, VersionSource::Catalog);

        let result = resolve(
            vec![DependencyDeclaration::managed("org.tensorflow", "tensorflow-lite")],
            None,
        );
        assert_eq!(conflict_on(result), "org.tensorflow:tensorflow-lite");
    }

    #[test]
    fn test_duplicates_merge_to_widest_scope() {
        let mut test_scoped = DependencyDeclaration::library("junit", "junit", "4.13.2");
        test_scoped.scope = Scope::Test;
        let mut runtime = DependencyDeclaration::library("junit", "junit", "4.13.2");
        runtime.scope = Scope::Runtime;

        let resolved = resolve(vec![test_scoped, runtime], None).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].scope, Scope::Runtime);
        assert_eq!(resolved[0].notation(), "junit:junit:4.13.2");
    }

    #[test]
    fn test_versioned_and_managed_duplicates() {
        let resolved = resolve(
            vec![
                DependencyDeclaration::managed("org.example", "widget"),
                DependencyDeclaration::library("org.example", "widget", "1.0"),
            ],
            None,
        )
        .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].version, "1.0");
    }

    #[test]
    fn test_serialized_source() {
        let resolved = resolve(
            vec![
                DependencyDeclaration::bom("com.google.firebase", "firebase-bom", "32.7.4"),
                DependencyDeclaration::managed("com.google.firebase", "firebase-auth"),
            ],
            None,
        )
        .unwrap();
        let json = serde_json::to_value(&resolved[1]).unwrap();
        assert_eq!(json["coordinate"], "com.google.firebase:firebase-auth");
        assert_eq!(json["source"]["kind"], "bom");
        assert_eq!(json["source"]["bom"], "com.google.firebase:firebase-bom");
        assert_eq!(json["scope"], "compile");
    }

    fn declaration() -> impl Strategy<Value = DependencyDeclaration> {
        (
            prop::sample::select(vec!["org.alpha", "org.beta"]),
            prop::sample::select(vec!["core", "ktx", "extras"]),
            prop::option::of(prop::sample::select(vec!["1.0", "2.0"])),
        )
            .prop_map(|(group, artifact, version)| match version {
                Some(v) => DependencyDeclaration::library(group, artifact, v),
                None => DependencyDeclaration::managed(group, artifact),
            })
    }

    proptest! {
        #[test]
        fn prop_resolution_is_deterministic_and_ordered(
            mut decls in proptest::collection::vec(declaration(), 0..10),
            with_bom in any::<bool>(),
        ) {
            if with_bom {
                decls.push(DependencyDeclaration::bom("org.alpha", "alpha-bom", "3.0"));
            }
            let first = resolve(decls.clone(), None);
            let second = resolve(decls.clone(), None);
            prop_assert_eq!(&first, &second);

            if let Ok(resolved) = first {
                let mut expected: Vec<&Coordinate> = Vec::new();
                for d in &decls {
                    if !expected.contains(&&d.coordinate) {
                        expected.push(&d.coordinate);
                    }
                }
                let actual: Vec<&Coordinate> = resolved.iter().map(|r| &r.coordinate).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
