//! # schemalens
//!
//! JSON Schema resolution and validation for schema-aware tooling.
//!
//! Schemas are never compiled into a fixed validator tree. Every position of an instance is
//! expanded on demand into the groups of constraints that apply there, which is what editors
//! need for diagnostics and completion alike.
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "integer", "minimum": 0, "maximum": 10});
//! let validator = schemalens::validator_for(&schema)?;
//!
//! assert!(validator.is_valid_json(&json!(7)));
//! let errors = validator.validate_json(&json!(-1));
//! assert_eq!(errors.len(), 1);
//! # Ok::<(), schemalens::Error>(())
//! ```
mod cancel;
mod checker;
mod error;
mod ext;
pub mod inspect;
mod instance;
mod keywords;
mod merge;
mod options;
pub mod position;
mod regex;
mod schema;
pub mod tree;

use core::cell::RefCell;
use std::sync::Arc;

pub use cancel::Cancellation;
pub use error::{Error, FixableIssueKind, IssueData, Priority, ValidationError};
pub use instance::{InstanceLocation, InstanceNode, InstanceProperty, InstanceValue, ScalarKind};
pub use merge::merge;
pub use options::{ComplianceOptions, PatternEngine, ValidationOptions};
pub use schema::{Applicators, Schema};
pub use schemalens_referencing as referencing;
pub use tree::{Alternative, IfThenElseMode, Resolution};

use schemalens_referencing::{resolver::enter_scope, RootSchema, SchemaRegistry, Scopes};
use serde_json::Value;

use crate::{
    checker::{Checker, ErrorSink},
    position::PathSegment,
    regex::PatternCache,
};

/// Build a validator with default options.
///
/// # Errors
///
/// Returns an error if `schema` is neither an object nor a boolean.
pub fn validator_for(schema: &Value) -> Result<Validator, Error> {
    options().build(schema)
}

/// Options for building a [`Validator`].
#[must_use]
pub fn options() -> ValidationOptions {
    ValidationOptions::default()
}

/// Validate `instance` against `schema` with default options.
///
/// # Errors
///
/// Returns an error if `schema` is not a valid schema document.
pub fn is_valid(schema: &Value, instance: &Value) -> Result<bool, Error> {
    Ok(validator_for(schema)?.is_valid_json(instance))
}

/// A loaded schema document ready to check instances.
#[derive(Debug)]
pub struct Validator {
    root: RootSchema,
    registry: Arc<SchemaRegistry>,
    options: ValidationOptions,
    patterns: PatternCache,
}

impl Validator {
    pub(crate) fn new(
        root: RootSchema,
        registry: Arc<SchemaRegistry>,
        options: ValidationOptions,
    ) -> Self {
        let patterns = PatternCache::new(options.pattern_engine);
        Validator {
            root,
            registry,
            options,
            patterns,
        }
    }

    #[must_use]
    pub fn root(&self) -> &RootSchema {
        &self.root
    }

    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// The root schema view and the scope it is evaluated in.
    #[must_use]
    pub fn entry(&self) -> Option<Alternative> {
        let node = self.root.node()?;
        let scopes = enter_scope(&Scopes::new(), &node);
        Some(Alternative::new(Schema::Node(node), scopes))
    }

    fn checker<'a>(&'a self, cancellation: Option<&'a Cancellation>) -> Checker<'a> {
        Checker {
            registry: &self.registry,
            patterns: &self.patterns,
            compliance: self.options.compliance,
            lenient_conditionals: self.options.lenient_conditionals,
            cancellation,
            active: RefCell::default(),
        }
    }

    fn run(&self, instance: &InstanceNode, cancellation: Option<&Cancellation>) -> Vec<ValidationError> {
        let Some(entry) = self.entry() else {
            return Vec::new();
        };
        let mut sink = ErrorSink::new(&self.options.compliance);
        self.checker(cancellation)
            .validate(instance, entry.schema, entry.scopes, &mut sink);
        if cancellation.is_some_and(Cancellation::is_cancelled) {
            tracing::debug!("Validation cancelled, returning partial results");
        }
        sink.into_errors()
    }

    /// Every error of `instance`, in the order they were found.
    #[must_use]
    pub fn validate(&self, instance: &InstanceNode) -> Vec<ValidationError> {
        self.run(instance, None)
    }

    /// Like [`Validator::validate`], stopping early once `cancellation` fires.
    #[must_use]
    pub fn validate_with_cancellation(
        &self,
        instance: &InstanceNode,
        cancellation: &Cancellation,
    ) -> Vec<ValidationError> {
        self.run(instance, Some(cancellation))
    }

    #[must_use]
    pub fn is_valid(&self, instance: &InstanceNode) -> bool {
        let Some(entry) = self.entry() else {
            return true;
        };
        let mut sink = ErrorSink::probe();
        self.checker(None)
            .validate(instance, entry.schema, entry.scopes, &mut sink);
        sink.is_empty()
    }

    #[must_use]
    pub fn validate_json(&self, instance: &Value) -> Vec<ValidationError> {
        self.validate(&InstanceNode::from_json(instance))
    }

    #[must_use]
    pub fn is_valid_json(&self, instance: &Value) -> bool {
        self.is_valid(&InstanceNode::from_json(instance))
    }

    /// Schema variants that apply at `path` inside an instance.
    #[must_use]
    pub fn schemas_at(&self, path: &[PathSegment]) -> Vec<Alternative> {
        self.entry()
            .map(|entry| position::resolve_at(entry, path, &self.registry))
            .unwrap_or_default()
    }

    /// Property names the schema declares for an object at `path`.
    #[must_use]
    pub fn property_names_at(&self, path: &[PathSegment]) -> Vec<String> {
        position::property_names(&self.schemas_at(path))
    }

    /// Deprecated properties present in `instance`.
    #[must_use]
    pub fn deprecations(&self, instance: &InstanceNode) -> Vec<ValidationError> {
        self.entry()
            .map(|entry| inspect::deprecations(instance, entry, &self.registry))
            .unwrap_or_default()
    }
}
