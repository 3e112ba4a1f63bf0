use crate::{
    checker::{Checker, ErrorSink},
    error::{Priority, ValidationError},
    instance::InstanceNode,
    tree::Alternative,
};

pub(crate) fn validate(
    checker: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    let Some(value) = instance.string_value() else {
        return;
    };
    let schema = &alternative.schema;
    let location = &instance.location;
    let length = bytecount::num_chars(value.as_bytes()) as u64;

    if let Some(limit) = schema.get_u64("minLength") {
        if length < limit {
            sink.push(ValidationError::new(
                format!("String is shorter than the minimum length of {limit}"),
                location,
            ));
        }
    }
    if let Some(limit) = schema.get_u64("maxLength") {
        if length > limit {
            sink.push(ValidationError::new(
                format!("String is longer than the maximum length of {limit}"),
                location,
            ));
        }
    }
    if let Some(pattern) = schema.get_str("pattern") {
        match checker.patterns.get(pattern) {
            Ok(compiled) => {
                if !compiled.is_match(&value) {
                    sink.push(ValidationError::new(
                        format!("String violates the pattern: '{}'", compiled.as_str()),
                        location,
                    ));
                }
            }
            Err(error) => sink.push(
                ValidationError::new(
                    format!("Invalid regular expression '{pattern}': {error}"),
                    location,
                )
                .with_priority(Priority::Low),
            ),
        }
    }
}
