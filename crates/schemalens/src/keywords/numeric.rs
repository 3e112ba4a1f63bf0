use core::cmp::Ordering;

use schemalens_referencing::ExclusiveBounds;
use serde_json::{Number, Value};

use crate::{
    checker::{Checker, ErrorSink},
    error::ValidationError,
    ext::cmp,
    instance::InstanceNode,
    tree::Alternative,
};

/// Remainders closer than this to zero or to the divisor count as exact.
const MULTIPLE_OF_TOLERANCE: f64 = 1e-6;

pub(crate) fn validate(
    _: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    let Some(value) = instance.number() else {
        return;
    };
    let schema = &alternative.schema;
    let location = &instance.location;

    if let Some(divisor) = schema.get_number("multipleOf").and_then(Number::as_f64) {
        if !is_multiple_of(&value, divisor) {
            sink.push(ValidationError::new(
                format!("Is not multiple of {divisor}"),
                location,
            ));
        }
    }

    let exclusive = |keyword: &str| schema.get_value(keyword).and_then(number);
    let (exclusive_minimum, exclusive_maximum, minimum_is_exclusive, maximum_is_exclusive) =
        match schema.draft().exclusive_bounds() {
            ExclusiveBounds::Flags => (
                None,
                None,
                schema.flag("exclusiveMinimum"),
                schema.flag("exclusiveMaximum"),
            ),
            ExclusiveBounds::Values => (
                exclusive("exclusiveMinimum"),
                exclusive("exclusiveMaximum"),
                false,
                false,
            ),
        };

    if let Some(minimum) = schema.get_number("minimum") {
        match cmp::compare(&value, minimum) {
            Some(Ordering::Less) => sink.push(ValidationError::new(
                format!("Less than the minimum of {minimum}"),
                location,
            )),
            Some(Ordering::Equal) if minimum_is_exclusive => sink.push(ValidationError::new(
                format!("Less than or equal to the exclusive minimum of {minimum}"),
                location,
            )),
            _ => {}
        }
    }
    if let Some(maximum) = schema.get_number("maximum") {
        match cmp::compare(&value, maximum) {
            Some(Ordering::Greater) => sink.push(ValidationError::new(
                format!("Greater than the maximum of {maximum}"),
                location,
            )),
            Some(Ordering::Equal) if maximum_is_exclusive => sink.push(ValidationError::new(
                format!("Greater than or equal to the exclusive maximum of {maximum}"),
                location,
            )),
            _ => {}
        }
    }
    if let Some(limit) = exclusive_minimum {
        if matches!(cmp::compare(&value, limit), Some(Ordering::Less | Ordering::Equal)) {
            sink.push(ValidationError::new(
                format!("Less than or equal to the exclusive minimum of {limit}"),
                location,
            ));
        }
    }
    if let Some(limit) = exclusive_maximum {
        if matches!(cmp::compare(&value, limit), Some(Ordering::Greater | Ordering::Equal)) {
            sink.push(ValidationError::new(
                format!("Greater than or equal to the exclusive maximum of {limit}"),
                location,
            ));
        }
    }
}

fn number(value: &Value) -> Option<&Number> {
    match value {
        Value::Number(number) => Some(number),
        _ => None,
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn is_multiple_of(value: &Number, divisor: f64) -> bool {
    if divisor <= 0.0 {
        return true;
    }
    if let (Some(value), true) = (value.as_u64(), divisor.fract() == 0.0) {
        if divisor <= u64::MAX as f64 {
            return value % (divisor as u64) == 0;
        }
    }
    let Some(value) = value.as_f64() else {
        return true;
    };
    let remainder = (value % divisor).abs();
    remainder < MULTIPLE_OF_TOLERANCE || divisor - remainder < MULTIPLE_OF_TOLERANCE
}
