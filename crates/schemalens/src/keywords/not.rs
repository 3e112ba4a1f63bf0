use crate::{
    checker::{Checker, ErrorSink},
    error::{Priority, ValidationError},
    instance::InstanceNode,
    tree::Alternative,
};

/// Every `not` of the view must fail. Checked last, so a probe here never hides other errors.
pub(crate) fn validate(
    checker: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    for negation in alternative.schema.negations() {
        if checker.is_valid(instance, negation, alternative.scopes.clone()) {
            sink.push(
                ValidationError::new("Validates against 'not' schema", &instance.location)
                    .with_priority(Priority::NotSchema),
            );
            return;
        }
    }
}
