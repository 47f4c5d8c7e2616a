//! Reader configuration

use std::sync::Arc;

use crate::error::SchemaError;
use crate::reader::record_decoder::RecordDecoder;
use crate::reader::resolve::{FieldResolver, HEADER_ROOT, PRECISION_FLAG};
use crate::schema::{RefPath, SchemaRegistry};

/// Header field holding the number of lines of sight.
pub const DEFAULT_RECORD_COUNT_FIELD: &str = "N_LOS";

/// What to do with bytes left over after the last line of sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingData {
    /// Log a warning and keep the decoded data.
    #[default]
    Ignore,
    /// Fail the load with `ReaderError::TrailingData`.
    Reject,
}

/// Configuration for loading RT files.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Schema registry to resolve versions against (default: the built-in
    /// registry).
    pub registry: Option<Arc<SchemaRegistry>>,
    /// Header field giving the number of lines of sight (default: `N_LOS`).
    pub record_count_field: String,
    /// Trailing byte policy (default: ignore).
    pub trailing_data: TrailingData,
    /// Flag that selects f4 over f8 for deferred widths (default:
    /// `header.flag_single`).
    pub precision_flag: RefPath,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            registry: None,
            record_count_field: DEFAULT_RECORD_COUNT_FIELD.to_string(),
            trailing_data: TrailingData::Ignore,
            precision_flag: RefPath::from_segments([HEADER_ROOT, PRECISION_FLAG]),
        }
    }
}

impl ReaderConfig {
    /// Create a new ReaderConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom schema registry.
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the header field that counts lines of sight.
    pub fn with_record_count_field(mut self, name: impl Into<String>) -> Self {
        self.record_count_field = name.into();
        self
    }

    /// Set the trailing data policy.
    pub fn with_trailing_data(mut self, policy: TrailingData) -> Self {
        self.trailing_data = policy;
        self
    }

    /// Fail loads that leave unread bytes.
    pub fn reject_trailing_data(mut self) -> Self {
        self.trailing_data = TrailingData::Reject;
        self
    }

    /// Pick deferred widths from a different flag.
    pub fn with_precision_flag(mut self, path: RefPath) -> Self {
        self.precision_flag = path;
        self
    }

    /// A record decoder honoring this configuration.
    pub(crate) fn record_decoder(&self) -> RecordDecoder {
        RecordDecoder::with_resolver(
            FieldResolver::new().with_precision_flag(self.precision_flag.clone()),
        )
    }

    /// The configured registry, or the shared built-in one.
    pub fn registry(&self) -> Result<Arc<SchemaRegistry>, SchemaError> {
        match &self.registry {
            Some(registry) => Ok(Arc::clone(registry)),
            None => SchemaRegistry::builtin(),
        }
    }
}
