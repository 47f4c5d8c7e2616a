//! Version-keyed schema tables.
//!
//! A catalog holds the three sparse tables exactly as declared: only the
//! versions at which a header layout, default flag set or record layout
//! changed need an entry. Filling the gaps is the registry's job.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SchemaError;
use crate::schema::parser::parse_catalog;
use crate::schema::{FlagSet, Schema, VersionKey};

/// Catalog for the RT formats from 2.3 through 3.15.
pub const BUILTIN_CATALOG: &str = include_str!("../../catalog/rt_schemas.json");

/// Sparse, as-declared schema tables plus the supported version range.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCatalog {
    pub min_version: VersionKey,
    pub max_version: VersionKey,
    pub header_schemas: BTreeMap<VersionKey, Schema>,
    pub default_flags: BTreeMap<VersionKey, FlagSet>,
    pub record_schemas: BTreeMap<VersionKey, Schema>,
}

impl SchemaCatalog {
    /// Create an empty catalog for the given inclusive version range.
    pub fn new(min_version: VersionKey, max_version: VersionKey) -> Self {
        Self {
            min_version,
            max_version,
            header_schemas: BTreeMap::new(),
            default_flags: BTreeMap::new(),
            record_schemas: BTreeMap::new(),
        }
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// # Example
    /// ```
    /// use rtdata::schema::SchemaCatalog;
    ///
    /// let catalog = SchemaCatalog::from_json(r#"{
    ///     "min_version": [1, 0],
    ///     "max_version": [1, 2],
    ///     "header_schemas": {"0100": [["N_LOS", "i4", 1]]},
    ///     "default_flags": {"0100": {"flag_single": false}},
    ///     "record_schemas": {"0100": [["x", "f", "header.N_LOS"]]}
    /// }"#).unwrap();
    /// assert_eq!(catalog.max_version.to_string(), "1.2");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        parse_catalog(json)
    }

    /// The catalog shipped with this crate.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn with_header_schema(mut self, version: VersionKey, schema: Schema) -> Self {
        self.header_schemas.insert(version, schema);
        self
    }

    pub fn with_default_flags(mut self, version: VersionKey, flags: FlagSet) -> Self {
        self.default_flags.insert(version, flags);
        self
    }

    pub fn with_record_schema(mut self, version: VersionKey, schema: Schema) -> Self {
        self.record_schemas.insert(version, schema);
        self
    }

    /// Union of the versions declared in any of the three tables.
    pub fn declared_versions(&self) -> BTreeSet<VersionKey> {
        self.header_schemas
            .keys()
            .chain(self.default_flags.keys())
            .chain(self.record_schemas.keys())
            .copied()
            .collect()
    }

    /// Whether `version` lies in the supported range.
    pub fn supports(&self, version: VersionKey) -> bool {
        self.min_version <= version && version <= self.max_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CountSpec, FieldSpec, FlagSpec, NumericType, RefPath, WidthSpec};

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = SchemaCatalog::builtin().unwrap();
        assert_eq!(catalog.min_version, VersionKey::new(2, 3));
        assert_eq!(catalog.max_version, VersionKey::new(3, 15));

        let headers: Vec<_> = catalog.header_schemas.keys().map(|v| v.key()).collect();
        assert_eq!(headers, vec!["0203", "0309"]);
        let flags: Vec<_> = catalog.default_flags.keys().map(|v| v.key()).collect();
        assert_eq!(flags, vec!["0203", "0306", "0309"]);
        let records: Vec<_> = catalog.record_schemas.keys().map(|v| v.key()).collect();
        assert_eq!(records, vec!["0203", "0302", "0306", "0309"]);
    }

    #[test]
    fn test_builtin_headers_are_1024_bytes() {
        let catalog = SchemaCatalog::builtin().unwrap();
        for schema in catalog.header_schemas.values() {
            let size: usize = schema
                .iter()
                .map(|f| match (&f.width, &f.count) {
                    (WidthSpec::Fixed(t), CountSpec::Literal(n)) => t.width() * n,
                    _ => panic!("header fields must be fixed size"),
                })
                .sum();
            assert_eq!(size, 1024);
        }
    }

    #[test]
    fn test_builtin_v39_record_flags() {
        let catalog = SchemaCatalog::builtin().unwrap();
        let schema = &catalog.record_schemas[&VersionKey::new(3, 9)];

        let g = schema.field("G").unwrap();
        assert_eq!(g.width, WidthSpec::Deferred);
        assert_eq!(
            g.count,
            CountSpec::Path(RefPath::parse("N_cells").unwrap())
        );
        assert_eq!(
            g.flag,
            FlagSpec::Path(RefPath::parse("header.flag_rates").unwrap())
        );

        let n_cells = schema.field("N_cells").unwrap();
        assert_eq!(n_cells.width, WidthSpec::Fixed(NumericType::UInt64));
        assert_eq!(n_cells.flag, FlagSpec::Literal(true));
    }

    #[test]
    fn test_declared_versions_is_union() {
        let field = FieldSpec::new("a", WidthSpec::Fixed(NumericType::Int32), CountSpec::Literal(1));
        let catalog = SchemaCatalog::new(VersionKey::new(1, 0), VersionKey::new(1, 5))
            .with_header_schema(VersionKey::new(1, 0), Schema::new(vec![field.clone()]))
            .with_default_flags(VersionKey::new(1, 2), FlagSet::new())
            .with_record_schema(VersionKey::new(1, 4), Schema::new(vec![field]));

        let versions: Vec<_> = catalog.declared_versions().into_iter().collect();
        assert_eq!(
            versions,
            vec![
                VersionKey::new(1, 0),
                VersionKey::new(1, 2),
                VersionKey::new(1, 4)
            ]
        );
        assert!(catalog.supports(VersionKey::new(1, 5)));
        assert!(!catalog.supports(VersionKey::new(1, 6)));
    }
}
