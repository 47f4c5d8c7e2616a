//! Decode-time resolution of field widths, counts and presence flags.
//!
//! Reference paths are evaluated against a two-level context: the shared
//! header (paths starting with `header.`) and the region being decoded
//! (everything else, or paths starting with `self.`). Only values already
//! decoded are visible, so a path naming a later field fails to resolve.

use crate::error::DecodeError;
use crate::reader::value::{DecodedState, Value};
use crate::schema::{CountSpec, FieldSpec, FlagSpec, NumericType, RefPath, WidthSpec};

/// Root segment naming the shared header.
pub const HEADER_ROOT: &str = "header";

/// Root segment naming the region being decoded.
pub const SELF_ROOT: &str = "self";

/// Header flag selecting single precision for deferred widths.
pub const PRECISION_FLAG: &str = "flag_single";

/// Result of looking a name up in a scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Value(&'a Value),
    Flag(bool),
}

/// Something reference paths can be resolved against.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Lookup<'_>>;
}

impl Scope for DecodedState {
    fn lookup(&self, name: &str) -> Option<Lookup<'_>> {
        self.get(name).map(Lookup::Value)
    }
}

/// The header and the partially decoded region.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    header: Option<&'a dyn Scope>,
    record: &'a DecodedState,
}

impl<'a> ResolutionContext<'a> {
    /// Context for decoding the header itself: `header.` paths resolve
    /// against the header's own growing state.
    pub fn standalone(record: &'a DecodedState) -> Self {
        Self {
            header: None,
            record,
        }
    }

    /// Context for decoding a region that depends on a decoded header.
    pub fn with_header(header: &'a dyn Scope, record: &'a DecodedState) -> Self {
        Self {
            header: Some(header),
            record,
        }
    }

    /// Resolve a path to the value or flag it names.
    pub fn lookup(&self, path: &RefPath) -> Result<Lookup<'a>, String> {
        let segments = path.segments();
        let record: &'a dyn Scope = self.record;
        let (scope, rest) = match segments.split_first() {
            Some((root, rest)) if root == HEADER_ROOT => (self.header.unwrap_or(record), rest),
            Some((root, rest)) if root == SELF_ROOT => (record, rest),
            _ => (record, segments),
        };

        match rest {
            [name] => scope
                .lookup(name)
                .ok_or_else(|| format!("'{}' has not been decoded", name)),
            [] => Err("path names a scope, not a field".to_string()),
            _ => Err("decoded values have no nested fields".to_string()),
        }
    }
}

/// Concrete read instruction for a present field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedField {
    pub ty: NumericType,
    pub count: usize,
}

impl ResolvedField {
    /// Bytes the field occupies on disk.
    pub fn byte_len(&self) -> usize {
        self.ty.width() * self.count
    }
}

/// Turns [`FieldSpec`]s into [`ResolvedField`]s.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    precision_flag: RefPath,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self {
            precision_flag: RefPath::from_segments([HEADER_ROOT, PRECISION_FLAG]),
        }
    }
}

impl FieldResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different flag to pick deferred widths.
    pub fn with_precision_flag(mut self, path: RefPath) -> Self {
        self.precision_flag = path;
        self
    }

    pub fn precision_flag(&self) -> &RefPath {
        &self.precision_flag
    }

    /// Resolve a field against the current context.
    ///
    /// Presence is resolved first; an absent field resolves to `None`
    /// without evaluating its width or count.
    ///
    /// # Errors
    /// `DecodeError::Resolution` if any referenced path is missing or
    /// names a value of the wrong shape.
    pub fn resolve(
        &self,
        field: &FieldSpec,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<ResolvedField>, DecodeError> {
        if !self.presence(field, ctx)? {
            return Ok(None);
        }
        Ok(Some(ResolvedField {
            ty: self.width(field, ctx)?,
            count: self.count(field, ctx)?,
        }))
    }

    fn width(&self, field: &FieldSpec, ctx: &ResolutionContext<'_>) -> Result<NumericType, DecodeError> {
        match field.width {
            WidthSpec::Fixed(ty) => Ok(ty),
            WidthSpec::Deferred => {
                if resolve_flag(field, &self.precision_flag, ctx)? {
                    Ok(NumericType::Float32)
                } else {
                    Ok(NumericType::Float64)
                }
            }
        }
    }

    fn count(&self, field: &FieldSpec, ctx: &ResolutionContext<'_>) -> Result<usize, DecodeError> {
        let path = match &field.count {
            CountSpec::Literal(n) => return Ok(*n),
            CountSpec::Path(path) => path,
        };
        let lookup = ctx
            .lookup(path)
            .map_err(|message| resolution_error(field, path, message))?;
        match lookup {
            Lookup::Value(Value::Scalar(s)) => s.as_count().ok_or_else(|| {
                resolution_error(
                    field,
                    path,
                    format!("{:?} is not a non-negative integer count", s),
                )
            }),
            Lookup::Value(Value::Array(c)) => Err(resolution_error(
                field,
                path,
                format!("count must be a scalar, found {} elements", c.len()),
            )),
            Lookup::Flag(_) => Err(resolution_error(
                field,
                path,
                "count must be a scalar, found a flag".to_string(),
            )),
        }
    }

    fn presence(&self, field: &FieldSpec, ctx: &ResolutionContext<'_>) -> Result<bool, DecodeError> {
        match &field.flag {
            FlagSpec::Literal(b) => Ok(*b),
            FlagSpec::Path(path) => resolve_flag(field, path, ctx),
        }
    }
}

fn resolve_flag(
    field: &FieldSpec,
    path: &RefPath,
    ctx: &ResolutionContext<'_>,
) -> Result<bool, DecodeError> {
    match ctx
        .lookup(path)
        .map_err(|message| resolution_error(field, path, message))?
    {
        Lookup::Flag(b) => Ok(b),
        Lookup::Value(Value::Scalar(s)) => Ok(s.is_truthy()),
        Lookup::Value(Value::Array(c)) => Err(resolution_error(
            field,
            path,
            format!("flag must be a scalar, found {} elements", c.len()),
        )),
    }
}

fn resolution_error(field: &FieldSpec, path: &RefPath, message: String) -> DecodeError {
    DecodeError::Resolution {
        field: field.name.clone(),
        path: path.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::value::{Column, Scalar};
    use crate::schema::FlagSet;

    struct Flags(FlagSet);

    impl Scope for Flags {
        fn lookup(&self, name: &str) -> Option<Lookup<'_>> {
            self.0.get(name).copied().map(Lookup::Flag)
        }
    }

    fn path(p: &str) -> RefPath {
        RefPath::parse(p).unwrap()
    }

    fn deferred(name: &str, count: CountSpec) -> FieldSpec {
        FieldSpec::new(name, WidthSpec::Deferred, count)
    }

    fn header_with(pairs: &[(&str, bool)]) -> Flags {
        Flags(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    #[test]
    fn test_deferred_width_follows_precision_flag() {
        let record = DecodedState::new();
        let field = deferred("R", CountSpec::Literal(4));
        let resolver = FieldResolver::new();

        let single = header_with(&[("flag_single", true)]);
        let ctx = ResolutionContext::with_header(&single, &record);
        let resolved = resolver.resolve(&field, &ctx).unwrap().unwrap();
        assert_eq!(resolved.ty, NumericType::Float32);
        assert_eq!(resolved.byte_len(), 16);

        let double = header_with(&[("flag_single", false)]);
        let ctx = ResolutionContext::with_header(&double, &record);
        let resolved = resolver.resolve(&field, &ctx).unwrap().unwrap();
        assert_eq!(resolved.ty, NumericType::Float64);
        assert_eq!(resolved.byte_len(), 32);
    }

    #[test]
    fn test_fixed_width_ignores_precision_flag() {
        let record = DecodedState::new();
        let field = FieldSpec::new(
            "cell_buffer_index",
            WidthSpec::Fixed(NumericType::Int64),
            CountSpec::Literal(2),
        );
        let header = header_with(&[("flag_single", true)]);
        let ctx = ResolutionContext::with_header(&header, &record);
        let resolved = FieldResolver::new().resolve(&field, &ctx).unwrap().unwrap();
        assert_eq!(resolved.ty, NumericType::Int64);
    }

    #[test]
    fn test_count_from_own_state_and_header() {
        let mut record = DecodedState::new();
        record.insert("N_cells", Value::Scalar(Scalar::U64(5)));
        let mut header = DecodedState::new();
        header.insert("N_cells", Value::Scalar(Scalar::I32(9)));
        header.insert("flag_single", Value::Scalar(Scalar::I32(1)));
        let ctx = ResolutionContext::with_header(&header, &record);
        let resolver = FieldResolver::new();

        let own = deferred("R", CountSpec::Path(path("N_cells")));
        assert_eq!(resolver.resolve(&own, &ctx).unwrap().unwrap().count, 5);

        let explicit_self = deferred("R", CountSpec::Path(path("self.N_cells")));
        assert_eq!(resolver.resolve(&explicit_self, &ctx).unwrap().unwrap().count, 5);

        let shared = deferred("R", CountSpec::Path(path("header.N_cells")));
        assert_eq!(resolver.resolve(&shared, &ctx).unwrap().unwrap().count, 9);
    }

    #[test]
    fn test_absent_field_skips_count_resolution() {
        let record = DecodedState::new();
        let header = header_with(&[("flag_rates", false), ("flag_single", false)]);
        let ctx = ResolutionContext::with_header(&header, &record);

        let field = deferred("G", CountSpec::Path(path("N_cells")))
            .with_flag(FlagSpec::Path(path("header.flag_rates")));
        assert_eq!(FieldResolver::new().resolve(&field, &ctx).unwrap(), None);

        let off = deferred("G", CountSpec::Path(path("N_cells"))).with_flag(FlagSpec::Literal(false));
        assert_eq!(FieldResolver::new().resolve(&off, &ctx).unwrap(), None);
    }

    #[test]
    fn test_missing_path_is_resolution_error() {
        let record = DecodedState::new();
        let header = header_with(&[("flag_single", false)]);
        let ctx = ResolutionContext::with_header(&header, &record);
        let field = deferred("R", CountSpec::Path(path("N_cells")));

        match FieldResolver::new().resolve(&field, &ctx) {
            Err(DecodeError::Resolution { field, path, .. }) => {
                assert_eq!(field, "R");
                assert_eq!(path, "N_cells");
            }
            other => panic!("expected Resolution error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_count_shapes() {
        let mut record = DecodedState::new();
        record.insert("floaty", Value::Scalar(Scalar::F32(2.0)));
        record.insert("many", Value::Array(Column::I32(vec![1, 2])));
        record.insert("negative", Value::Scalar(Scalar::I32(-3)));
        let header = header_with(&[("flag_single", true)]);
        let ctx = ResolutionContext::with_header(&header, &record);
        let resolver = FieldResolver::new();

        for name in ["floaty", "many", "negative", "header.flag_single", "header", "a.b.c"] {
            let field = deferred("x", CountSpec::Path(path(name)));
            assert!(
                matches!(
                    resolver.resolve(&field, &ctx),
                    Err(DecodeError::Resolution { .. })
                ),
                "count path {} should not resolve",
                name
            );
        }
    }

    #[test]
    fn test_standalone_header_root_is_self() {
        let mut record = DecodedState::new();
        record.insert("N_cells", Value::Scalar(Scalar::I32(3)));
        let ctx = ResolutionContext::standalone(&record);
        let field = FieldSpec::new(
            "_cells",
            WidthSpec::Fixed(NumericType::Int32),
            CountSpec::Path(path("header.N_cells")),
        );
        assert_eq!(
            FieldResolver::new().resolve(&field, &ctx).unwrap().unwrap().count,
            3
        );
    }

    #[test]
    fn test_custom_precision_flag() {
        let record = DecodedState::new();
        let header = header_with(&[("flag_single", false), ("flag_f32", true)]);
        let ctx = ResolutionContext::with_header(&header, &record);
        let resolver = FieldResolver::new().with_precision_flag(path("header.flag_f32"));
        let field = deferred("R", CountSpec::Literal(1));
        assert_eq!(
            resolver.resolve(&field, &ctx).unwrap().unwrap().ty,
            NumericType::Float32
        );
    }
}
