//! Generic schema-driven record decoder.
//!
//! [`RecordDecoder`] walks a [`Schema`] in declared order, resolves each
//! field against the state decoded so far, and reads the resolved number of
//! elements. Region-specific decoders wrap it and implement [`RecordDecode`].

use tracing::trace;

use crate::error::DecodeError;
use crate::reader::cursor::ByteCursor;
use crate::reader::resolve::{FieldResolver, ResolutionContext, Scope};
use crate::reader::value::{DecodedState, Value};
use crate::schema::Schema;

/// A decoder for one region of a file.
///
/// Implementations read from the cursor's current position and leave it
/// just past the region on success.
pub trait RecordDecode {
    type Output;

    fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<Self::Output, DecodeError>;
}

/// Schema walker shared by the header and line-of-sight decoders.
#[derive(Debug, Clone, Default)]
pub struct RecordDecoder {
    resolver: FieldResolver,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(resolver: FieldResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    /// Decode every field of `schema` from `cursor`.
    ///
    /// Paths rooted at `header` resolve against `header` when given,
    /// otherwise against the state being built. Absent fields consume no
    /// bytes and do not appear in the result. Internal fields are decoded
    /// and visible to later fields, then dropped from the returned state.
    ///
    /// # Errors
    /// - `DecodeError::Resolution` when a count or flag path cannot be
    ///   resolved
    /// - `DecodeError::Truncated` when the data ends inside a field
    pub fn decode(
        &self,
        schema: &Schema,
        cursor: &mut ByteCursor<'_>,
        header: Option<&dyn Scope>,
    ) -> Result<DecodedState, DecodeError> {
        let mut state = DecodedState::new();

        for field in schema {
            let resolved = {
                let ctx = match header {
                    Some(header) => ResolutionContext::with_header(header, &state),
                    None => ResolutionContext::standalone(&state),
                };
                self.resolver.resolve(field, &ctx)?
            };

            let Some(resolved) = resolved else {
                trace!(field = %field.name, "Skipping absent field");
                continue;
            };

            let offset = cursor.position();
            let column = cursor.read_column(&field.name, resolved.ty, resolved.count)?;
            trace!(
                field = %field.name,
                ty = %resolved.ty,
                count = resolved.count,
                offset,
                "Decoded field"
            );
            state.insert(field.name.clone(), Value::from_column(column));
        }

        Ok(state.into_exposed())
    }
}
