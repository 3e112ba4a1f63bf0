use serde_json::Value;

use crate::{
    checker::{Checker, ErrorSink},
    error::ValidationError,
    ext::cmp,
    instance::InstanceNode,
    keywords::display,
    tree::Alternative,
};

pub(crate) fn validate(
    checker: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    let Some(options) = alternative.schema.enum_values() else {
        return;
    };
    let value = instance.to_json();
    let matches = |option: &Value| match (&value, option) {
        (Value::String(actual), Value::String(expected))
            if checker.compliance.case_insensitive_enum =>
        {
            actual.eq_ignore_ascii_case(expected)
        }
        _ => cmp::equal(&value, option),
    };
    if !options.iter().any(matches) {
        let rendered = options.iter().map(display).collect::<Vec<_>>().join(", ");
        sink.push(ValidationError::new(
            format!("Value should be one of: {rendered}"),
            &instance.location,
        ));
    }
}
