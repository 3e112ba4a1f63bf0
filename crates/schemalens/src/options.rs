use std::sync::Arc;

use schemalens_referencing::{
    Draft, JsonType, SchemaRegistry, SchemaService, DEFAULT_ROOT_URI,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Validator};

/// How strictly instances are checked. Hosts usually load this from their settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplianceOptions {
    /// Compare string enum values ignoring ASCII case.
    pub case_insensitive_enum: bool,
    /// Stop at the first reported error.
    pub stop_after_first_error: bool,
    /// Report only missing properties.
    pub collect_missing_props_only: bool,
    /// Also report properties declared in `properties` but absent and not required.
    pub report_missing_optional_properties: bool,
}

impl ComplianceOptions {
    #[must_use]
    pub const fn new() -> Self {
        ComplianceOptions {
            case_insensitive_enum: false,
            stop_after_first_error: false,
            collect_missing_props_only: false,
            report_missing_optional_properties: false,
        }
    }

    #[must_use]
    pub const fn with_case_insensitive_enum(mut self, yes: bool) -> Self {
        self.case_insensitive_enum = yes;
        self
    }

    #[must_use]
    pub const fn with_stop_after_first_error(mut self, yes: bool) -> Self {
        self.stop_after_first_error = yes;
        self
    }

    #[must_use]
    pub const fn with_collect_missing_props_only(mut self, yes: bool) -> Self {
        self.collect_missing_props_only = yes;
        self
    }

    #[must_use]
    pub const fn with_report_missing_optional_properties(mut self, yes: bool) -> Self {
        self.report_missing_optional_properties = yes;
        self
    }
}

/// Regular expression engine used for `pattern` and `patternProperties`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternEngine {
    /// Supports lookaround and backreferences.
    #[default]
    FancyRegex,
    /// Linear time, no backtracking features.
    Regex,
}

/// Configuration for building a [`Validator`].
#[derive(Clone)]
pub struct ValidationOptions {
    pub(crate) draft: Option<Draft>,
    pub(crate) pattern_engine: PatternEngine,
    pub(crate) compliance: ComplianceOptions,
    pub(crate) lenient_conditionals: bool,
    registry: Option<Arc<SchemaRegistry>>,
    service: Option<Arc<dyn SchemaService>>,
    base_uri: Option<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            draft: None,
            pattern_engine: PatternEngine::default(),
            compliance: ComplianceOptions::new(),
            lenient_conditionals: false,
            registry: None,
            service: None,
            base_uri: None,
        }
    }
}

impl core::fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("draft", &self.draft)
            .field("pattern_engine", &self.pattern_engine)
            .field("compliance", &self.compliance)
            .field("lenient_conditionals", &self.lenient_conditionals)
            .field("base_uri", &self.base_uri)
            .finish_non_exhaustive()
    }
}

impl ValidationOptions {
    /// Draft for schemas without a recognized `$schema`.
    ///
    /// Only applies when the validator creates its own registry.
    #[must_use]
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    #[must_use]
    pub fn with_pattern_engine(mut self, engine: PatternEngine) -> Self {
        self.pattern_engine = engine;
        self
    }

    #[must_use]
    pub fn with_compliance(mut self, compliance: ComplianceOptions) -> Self {
        self.compliance = compliance;
        self
    }

    /// Treat `if` as unknown: both `then` and `else` contribute alternatives instead of
    /// evaluating the condition.
    #[must_use]
    pub fn with_lenient_conditionals(mut self, yes: bool) -> Self {
        self.lenient_conditionals = yes;
        self
    }

    /// Share documents and fetched schemas with other validators.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Fetch remote references through `service`. Ignored when a registry is given.
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn SchemaService>) -> Self {
        self.service = Some(service);
        self
    }

    /// URI the schema is registered under, used to resolve its relative references.
    #[must_use]
    pub fn with_base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Build a validator for `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is neither an object nor a boolean, or if the base URI
    /// is not an absolute URI.
    pub fn build(&self, schema: &Value) -> Result<Validator, Error> {
        if !matches!(schema, Value::Object(_) | Value::Bool(_)) {
            return Err(Error::InvalidSchema(JsonType::from(schema)));
        }
        let registry = match &self.registry {
            Some(registry) => Arc::clone(registry),
            None => {
                let mut options = SchemaRegistry::options();
                if let Some(draft) = self.draft {
                    options = options.draft(draft);
                }
                if let Some(service) = &self.service {
                    options = options.service(Arc::clone(service));
                }
                Arc::new(options.build())
            }
        };
        let uri = self.base_uri.as_deref().unwrap_or(DEFAULT_ROOT_URI);
        let root = registry.load(uri, schema.clone())?;
        Ok(Validator::new(root, registry, self.clone()))
    }
}
