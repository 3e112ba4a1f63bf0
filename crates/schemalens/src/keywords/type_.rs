use crate::{
    checker::{Checker, ErrorSink},
    error::ValidationError,
    instance::InstanceNode,
    tree::Alternative,
};

pub(crate) fn validate(
    _: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    let Some(expected) = alternative.schema.types() else {
        return;
    };
    let actual = Checker::inferred_type(instance, &alternative.schema);
    if !expected.accepts(actual) {
        sink.push(ValidationError::type_mismatch(
            &instance.location,
            expected,
            actual,
        ));
    }
}
