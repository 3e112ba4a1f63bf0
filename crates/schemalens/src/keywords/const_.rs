use crate::{
    checker::{Checker, ErrorSink},
    error::ValidationError,
    ext::cmp,
    instance::InstanceNode,
    keywords::display,
    tree::Alternative,
};

pub(crate) fn validate(
    _: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    let Some(expected) = alternative.schema.const_value() else {
        return;
    };
    if !cmp::equal(&instance.to_json(), expected) {
        sink.push(ValidationError::new(
            format!("Value must be {}", display(expected)),
            &instance.location,
        ));
    }
}
