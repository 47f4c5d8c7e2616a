//! Version registry with gap filling.
//!
//! The registry turns a sparse [`SchemaCatalog`] into a dense map in which
//! every supported version owns a complete header schema, default flag set
//! and record schema. Each table inherits independently: a version missing
//! from a table receives a deep copy of that table's greatest declared
//! entry strictly before it. Only declared entries act as sources, so the
//! result does not depend on fill order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::error::SchemaError;
use crate::schema::{FlagSet, Schema, SchemaCatalog, SchemaTable, VersionKey};

/// The resolved schema triple for one version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSchemas {
    pub version: VersionKey,
    pub header: Schema,
    pub flags: FlagSet,
    pub record: Schema,
}

/// Immutable, fully populated map from version to [`VersionSchemas`].
///
/// Safe to share across threads once built; decoding never mutates it.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    min_version: VersionKey,
    max_version: VersionKey,
    entries: BTreeMap<VersionKey, VersionSchemas>,
}

static BUILTIN: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();

impl SchemaRegistry {
    /// Build a registry from a catalog.
    ///
    /// The domain is every declared version, the maximum version, and every
    /// version in the inclusive `[min_version, max_version]` range.
    ///
    /// # Errors
    /// `SchemaError::Incomplete` naming the first version (in ascending
    /// order, checking header, flags and record tables in turn) that has no
    /// declared predecessor in some table. `min_version` is part of the
    /// domain, so a catalog where any table starts above `min_version`
    /// fails with `Incomplete` naming `min_version`.
    pub fn new(catalog: &SchemaCatalog) -> Result<Self, SchemaError> {
        let mut domain: BTreeSet<VersionKey> = catalog.declared_versions();
        domain.insert(catalog.max_version);
        domain.extend(catalog.min_version.range_inclusive(catalog.max_version));

        let headers = fill_table(&catalog.header_schemas, &domain, SchemaTable::Header)?;
        let mut flags = fill_table(&catalog.default_flags, &domain, SchemaTable::Flags)?;
        let mut records = fill_table(&catalog.record_schemas, &domain, SchemaTable::Record)?;

        let mut entries = BTreeMap::new();
        for (version, header) in headers {
            // All three tables were filled over the same domain.
            let (Some(flag_set), Some(record_schema)) =
                (flags.remove(&version), records.remove(&version))
            else {
                return Err(SchemaError::UnknownVersion(version));
            };
            entries.insert(
                version,
                VersionSchemas {
                    version,
                    header,
                    flags: flag_set,
                    record: record_schema,
                },
            );
        }

        debug!(
            min = %catalog.min_version,
            max = %catalog.max_version,
            versions = entries.len(),
            "Built schema registry"
        );

        Ok(Self {
            min_version: catalog.min_version,
            max_version: catalog.max_version,
            entries,
        })
    }

    /// Shared registry built from the crate's built-in catalog.
    ///
    /// Built on first use and reused for the rest of the process.
    pub fn builtin() -> Result<Arc<Self>, SchemaError> {
        if let Some(registry) = BUILTIN.get() {
            return Ok(Arc::clone(registry));
        }
        let registry = Arc::new(Self::new(&SchemaCatalog::builtin()?)?);
        // A concurrent initializer may have won; either value is equivalent.
        Ok(Arc::clone(BUILTIN.get_or_init(|| registry)))
    }

    /// Resolve a version to an independently owned schema triple.
    ///
    /// # Errors
    /// `SchemaError::UnknownVersion` if the version is outside the populated
    /// domain.
    pub fn resolve(&self, version: VersionKey) -> Result<VersionSchemas, SchemaError> {
        self.get(version)
            .cloned()
            .ok_or(SchemaError::UnknownVersion(version))
    }

    /// Borrow the schema triple for a version.
    pub fn get(&self, version: VersionKey) -> Option<&VersionSchemas> {
        self.entries.get(&version)
    }

    pub fn contains(&self, version: VersionKey) -> bool {
        self.entries.contains_key(&version)
    }

    /// All populated versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = VersionKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn min_version(&self) -> VersionKey {
        self.min_version
    }

    pub fn max_version(&self) -> VersionKey {
        self.max_version
    }

    /// Whether `version` lies in the supported range.
    pub fn supports(&self, version: VersionKey) -> bool {
        self.min_version <= version && version <= self.max_version
    }
}

/// Fill one table over `domain` from its declared entries.
fn fill_table<T: Clone>(
    declared: &BTreeMap<VersionKey, T>,
    domain: &BTreeSet<VersionKey>,
    table: SchemaTable,
) -> Result<BTreeMap<VersionKey, T>, SchemaError> {
    let mut filled = BTreeMap::new();
    for &version in domain {
        let Some((&source, value)) = declared.range(..=version).next_back() else {
            return Err(SchemaError::Incomplete { version, table });
        };
        if source != version {
            trace!(%version, %source, %table, "Inherited schema");
        }
        filled.insert(version, value.clone());
    }
    Ok(filled)
}
