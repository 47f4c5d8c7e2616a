//! JSON parser for schema catalogs.
//!
//! Parses the catalog document into [`SchemaCatalog`]. Field entries are
//! positional arrays, `[name, dtype, count]` or `[name, dtype, count, flag]`,
//! where `count` is a positive integer or a reference path and `flag` is a
//! boolean or a reference path.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::schema::{
    CountSpec, FieldSpec, FlagSet, FlagSpec, RefPath, Schema, SchemaCatalog, VersionKey, WidthSpec,
};

/// Parse a schema catalog from a JSON string.
pub fn parse_catalog(json: &str) -> Result<SchemaCatalog, SchemaError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| SchemaError::ParseError(format!("Invalid JSON: {}", e)))?;

    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::ParseError("Catalog must be a JSON object".to_string()))?;

    let min_version = parse_version_pair(required(obj, "min_version")?, "min_version")?;
    let max_version = parse_version_pair(required(obj, "max_version")?, "max_version")?;
    if min_version > max_version {
        return Err(SchemaError::InvalidCatalog(format!(
            "min_version {} is greater than max_version {}",
            min_version, max_version
        )));
    }

    let header_schemas = parse_table(obj, "header_schemas", parse_schema)?;
    let default_flags = parse_table(obj, "default_flags", parse_flags)?;
    let record_schemas = parse_table(obj, "record_schemas", parse_schema)?;

    Ok(SchemaCatalog {
        min_version,
        max_version,
        header_schemas,
        default_flags,
        record_schemas,
    })
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, SchemaError> {
    obj.get(key)
        .ok_or_else(|| SchemaError::ParseError(format!("Catalog is missing '{}'", key)))
}

fn parse_version_pair(value: &Value, what: &str) -> Result<VersionKey, SchemaError> {
    let invalid = || SchemaError::ParseError(format!("'{}' must be [major, minor]", what));
    let pair = value.as_array().ok_or_else(invalid)?;
    if pair.len() != 2 {
        return Err(invalid());
    }
    let part = |v: &Value| {
        v.as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(invalid)
    };
    Ok(VersionKey::new(part(&pair[0])?, part(&pair[1])?))
}

/// Parse one version-keyed table. A missing table is treated as empty.
fn parse_table<T>(
    obj: &Map<String, Value>,
    key: &str,
    parse_entry: fn(&Value, &str) -> Result<T, SchemaError>,
) -> Result<BTreeMap<VersionKey, T>, SchemaError> {
    let mut table = BTreeMap::new();
    let Some(value) = obj.get(key) else {
        return Ok(table);
    };
    let entries = value
        .as_object()
        .ok_or_else(|| SchemaError::ParseError(format!("'{}' must be an object", key)))?;

    for (version_key, entry) in entries {
        let version = VersionKey::from_key(version_key)?;
        let context = format!("{}[{}]", key, version_key);
        table.insert(version, parse_entry(entry, &context)?);
    }
    Ok(table)
}

fn parse_schema(value: &Value, context: &str) -> Result<Schema, SchemaError> {
    let entries = value
        .as_array()
        .ok_or_else(|| SchemaError::ParseError(format!("{} must be an array of fields", context)))?;

    let mut fields = Vec::with_capacity(entries.len());
    for entry in entries {
        let field = parse_field(entry, context)?;
        if fields.iter().any(|f: &FieldSpec| f.name == field.name) {
            return Err(SchemaError::InvalidCatalog(format!(
                "{} declares field '{}' twice",
                context, field.name
            )));
        }
        fields.push(field);
    }
    Ok(Schema::new(fields))
}

fn parse_field(value: &Value, context: &str) -> Result<FieldSpec, SchemaError> {
    let parts = value
        .as_array()
        .filter(|parts| parts.len() == 3 || parts.len() == 4)
        .ok_or_else(|| {
            SchemaError::ParseError(format!(
                "{}: field must be [name, dtype, count] or [name, dtype, count, flag], got {}",
                context, value
            ))
        })?;

    let name = parts[0]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SchemaError::ParseError(format!("{}: field name must be a string", context)))?;

    let width = parts[1]
        .as_str()
        .and_then(WidthSpec::from_code)
        .ok_or_else(|| {
            SchemaError::ParseError(format!(
                "{}: field '{}' has unknown dtype {}",
                context, name, parts[1]
            ))
        })?;

    let count = match &parts[2] {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .map(CountSpec::Literal)
            .ok_or_else(|| {
                SchemaError::ParseError(format!(
                    "{}: field '{}' count must be a positive integer",
                    context, name
                ))
            })?,
        Value::String(path) => CountSpec::Path(RefPath::parse(path)?),
        other => {
            return Err(SchemaError::ParseError(format!(
                "{}: field '{}' has invalid count {}",
                context, name, other
            )))
        }
    };

    let flag = match parts.get(3) {
        None => FlagSpec::default(),
        Some(Value::Bool(b)) => FlagSpec::Literal(*b),
        Some(Value::String(path)) => FlagSpec::Path(RefPath::parse(path)?),
        Some(other) => {
            return Err(SchemaError::ParseError(format!(
                "{}: field '{}' has invalid flag {}",
                context, name, other
            )))
        }
    };

    Ok(FieldSpec::new(name, width, count).with_flag(flag))
}

fn parse_flags(value: &Value, context: &str) -> Result<FlagSet, SchemaError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::ParseError(format!("{} must be an object of flags", context)))?;

    obj.iter()
        .map(|(name, v)| {
            v.as_bool().map(|b| (name.clone(), b)).ok_or_else(|| {
                SchemaError::ParseError(format!("{}: flag '{}' must be a boolean", context, name))
            })
        })
        .collect()
}
