//! Validation of instances against expanded schema positions.
//!
//! Every position is expanded into a [`Resolution`] first; the keyword checkers then run
//! against one alternative at a time and recurse into child positions with fresh passes.
use core::cell::RefCell;

use ahash::AHashSet;
use schemalens_referencing::{
    JsonType, JsonTypeSet, SchemaNode, SchemaRegistry, Scopes, ValidationKind,
};

use crate::{
    cancel::Cancellation,
    error::{IssueData, ValidationError},
    instance::{InstanceLocation, InstanceNode},
    keywords,
    options::ComplianceOptions,
    regex::PatternCache,
    schema::Schema,
    tree::{self, Alternative, Condition, IfThenElseMode, Resolution, TreeContext},
};

/// Collects errors and applies the compliance filters.
#[derive(Debug, Default)]
pub(crate) struct ErrorSink {
    errors: Vec<ValidationError>,
    stop_after_first: bool,
    missing_only: bool,
}

impl ErrorSink {
    pub(crate) fn new(compliance: &ComplianceOptions) -> Self {
        ErrorSink {
            errors: Vec::new(),
            stop_after_first: compliance.stop_after_first_error,
            missing_only: compliance.collect_missing_props_only,
        }
    }

    /// Keeps everything, used to compare alternatives.
    pub(crate) fn collecting() -> Self {
        ErrorSink::default()
    }

    /// Stops at the first error, used when only validity matters.
    pub(crate) fn probe() -> Self {
        ErrorSink {
            stop_after_first: true,
            ..ErrorSink::default()
        }
    }

    pub(crate) fn push(&mut self, error: ValidationError) {
        if self.is_full() || (self.missing_only && !error.is_missing_property()) {
            return;
        }
        self.errors.push(error);
    }

    pub(crate) fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        for error in errors {
            self.push(error);
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.stop_after_first && !self.errors.is_empty()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Shared state of one validation request.
pub(crate) struct Checker<'a> {
    pub(crate) registry: &'a SchemaRegistry,
    pub(crate) patterns: &'a PatternCache,
    pub(crate) compliance: ComplianceOptions,
    pub(crate) lenient_conditionals: bool,
    pub(crate) cancellation: Option<&'a Cancellation>,
    /// Schema nodes being validated at an instance location. `not`, `if` and
    /// `dependentSchemas` revisit the same location, so a repeat here is a cycle.
    pub(crate) active: RefCell<AHashSet<(SchemaNode, InstanceLocation)>>,
}

/// Evaluates `if` against the instance being validated.
struct InstanceCondition<'c, 'a> {
    checker: &'c Checker<'a>,
    instance: &'c InstanceNode,
}

impl Condition for InstanceCondition<'_, '_> {
    fn holds(&self, schema: &Schema, scopes: &Scopes) -> bool {
        self.checker
            .is_valid(self.instance, schema.clone(), scopes.clone())
    }
}

impl<'a> Checker<'a> {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.is_some_and(Cancellation::is_cancelled)
    }

    pub(crate) fn is_valid(&self, instance: &InstanceNode, schema: Schema, scopes: Scopes) -> bool {
        let mut sink = ErrorSink::probe();
        self.validate(instance, schema, scopes, &mut sink);
        sink.is_empty()
    }

    /// Expand `schema` at the position of `instance` and check every constraint group.
    pub(crate) fn validate(
        &self,
        instance: &InstanceNode,
        schema: Schema,
        scopes: Scopes,
        sink: &mut ErrorSink,
    ) {
        if sink.is_full() || self.is_cancelled() {
            return;
        }
        let key = (schema.primary_node().clone(), instance.location.clone());
        if !self.active.borrow_mut().insert(key.clone()) {
            tracing::trace!(
                schema = key.0.pointer(),
                location = instance.location.as_str(),
                "Schema re-entered at the same instance location"
            );
            return;
        }
        let resolution = self.resolve(instance, schema, scopes);
        self.check_resolution(instance, &resolution, sink);
        self.active.borrow_mut().remove(&key);
    }

    pub(crate) fn resolve(&self, instance: &InstanceNode, schema: Schema, scopes: Scopes) -> Resolution {
        let condition = InstanceCondition {
            checker: self,
            instance,
        };
        let mode = if self.lenient_conditionals {
            IfThenElseMode::Lenient
        } else {
            IfThenElseMode::Strict(&condition)
        };
        let mut ctx = TreeContext::new(self.registry, mode);
        if let Some(cancellation) = self.cancellation {
            ctx = ctx.with_cancellation(cancellation);
        }
        tree::resolve(schema, scopes, &ctx)
    }

    fn check_resolution(&self, instance: &InstanceNode, resolution: &Resolution, sink: &mut ErrorSink) {
        match resolution.and_group.as_slice() {
            [] => {}
            [alternative] => self.check(instance, alternative, sink),
            alternatives => {
                let mut candidates = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    let errors = self.collect(instance, alternative);
                    if errors.is_empty() {
                        candidates.clear();
                        break;
                    }
                    candidates.push(errors);
                }
                if !candidates.is_empty() {
                    self.report_best(instance, candidates, sink);
                }
            }
        }
        self.check_exclusive(instance, &resolution.or_groups, sink);
    }

    /// Exactly one member of each group must hold.
    fn check_exclusive(&self, instance: &InstanceNode, groups: &[Vec<Resolution>], sink: &mut ErrorSink) {
        for group in groups {
            if sink.is_full() || self.is_cancelled() {
                return;
            }
            let mut valid = 0;
            let mut candidates = Vec::with_capacity(group.len());
            for member in group {
                let mut collected = ErrorSink::collecting();
                self.check_resolution(instance, member, &mut collected);
                let errors = collected.into_errors();
                if errors.is_empty() {
                    valid += 1;
                } else {
                    candidates.push(errors);
                }
            }
            match valid {
                0 if !candidates.is_empty() => self.report_best(instance, candidates, sink),
                0 | 1 => {}
                _ => sink.push(ValidationError::new(
                    "Validates to more than one variant",
                    &instance.location,
                )),
            }
        }
    }

    fn collect(&self, instance: &InstanceNode, alternative: &Alternative) -> Vec<ValidationError> {
        let mut sink = ErrorSink::collecting();
        self.check(instance, alternative, &mut sink);
        sink.into_errors()
    }

    /// Report the errors of the closest failing variant, or one combined type error when
    /// every variant failed on its type alone.
    fn report_best(
        &self,
        instance: &InstanceNode,
        candidates: Vec<Vec<ValidationError>>,
        sink: &mut ErrorSink,
    ) {
        let at_instance = |error: &ValidationError| error.location == instance.location;
        let only_types = candidates
            .iter()
            .all(|errors| errors.iter().all(|e| e.is_type_mismatch() && at_instance(e)));
        if only_types {
            let mut expected = JsonTypeSet::empty();
            let mut actual = None;
            for error in candidates.iter().flatten() {
                if let Some(IssueData::TypeMismatch {
                    expected: declared,
                    actual: found,
                }) = &error.issue_data
                {
                    expected = declared.iter().fold(expected, JsonTypeSet::insert);
                    actual = Some(*found);
                }
            }
            if let Some(actual) = actual {
                sink.push(ValidationError::type_mismatch(
                    &instance.location,
                    expected,
                    actual,
                ));
                return;
            }
        }
        let best = candidates.into_iter().min_by_key(|errors| {
            let type_failure = errors
                .iter()
                .any(|e| e.is_type_mismatch() && at_instance(e));
            (type_failure, errors.len())
        });
        if let Some(errors) = best {
            sink.extend(errors);
        }
    }

    /// Run the keyword checkers of one merged view, then the exclusive groups it carries.
    pub(crate) fn check(&self, instance: &InstanceNode, alternative: &Alternative, sink: &mut ErrorSink) {
        self.check_keywords(instance, alternative, sink);
        if !alternative.exclusive.is_empty() && !sink.is_full() {
            self.check_exclusive(instance, &alternative.exclusive, sink);
        }
    }

    fn check_keywords(&self, instance: &InstanceNode, alternative: &Alternative, sink: &mut ErrorSink) {
        let schema = &alternative.schema;
        match schema.as_bool() {
            Some(true) => return,
            Some(false) => {
                sink.push(ValidationError::new("Value is not allowed", &instance.location));
                return;
            }
            None => {}
        }
        let draft = schema.draft();
        let inferred = instance.json_type(draft);
        for validation in draft.validations(schema, inferred, schema.vocabularies()) {
            if sink.is_full() || self.is_cancelled() {
                return;
            }
            match validation {
                ValidationKind::Const => keywords::const_::validate(self, instance, alternative, sink),
                ValidationKind::Type => keywords::type_::validate(self, instance, alternative, sink),
                ValidationKind::Enum => keywords::enum_::validate(self, instance, alternative, sink),
                ValidationKind::Numeric => keywords::numeric::validate(self, instance, alternative, sink),
                ValidationKind::String => keywords::string::validate(self, instance, alternative, sink),
                ValidationKind::Array => keywords::array::validate(self, instance, alternative, sink),
                ValidationKind::Object => keywords::object::validate(self, instance, alternative, sink),
                ValidationKind::Not => keywords::not::validate(self, instance, alternative, sink),
            }
        }
    }

    /// Type of `instance` as seen by the draft of `schema`.
    pub(crate) fn inferred_type(instance: &InstanceNode, schema: &Schema) -> JsonType {
        instance.json_type(schema.draft())
    }
}
