use serde_json::Value;

use crate::{
    checker::{Checker, ErrorSink},
    error::ValidationError,
    ext::cmp,
    instance::InstanceNode,
    tree::Alternative,
};

pub(crate) fn validate(
    checker: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    let Some(items) = instance.as_array() else {
        return;
    };
    let schema = &alternative.schema;
    let location = &instance.location;

    let prefix = schema.prefix_items();
    let rest = schema.rest_items();
    for (item, item_schema) in items.iter().zip(&prefix) {
        if sink.is_full() || checker.is_cancelled() {
            return;
        }
        checker.validate(item, item_schema.clone(), alternative.scopes.clone(), sink);
    }
    if items.len() > prefix.len() {
        let extra = &items[prefix.len()..];
        match &rest {
            Some(rest) if rest.as_bool() == Some(false) => sink.push(ValidationError::new(
                "Additional items are not allowed",
                location,
            )),
            Some(rest) => {
                for item in extra {
                    if sink.is_full() || checker.is_cancelled() {
                        return;
                    }
                    checker.validate(item, rest.clone(), alternative.scopes.clone(), sink);
                }
            }
            None => {
                if let Some(unevaluated) = schema.unevaluated_items() {
                    if unevaluated.as_bool() == Some(false) {
                        sink.push(ValidationError::new(
                            "Unevaluated items are not allowed",
                            location,
                        ));
                    } else {
                        for item in extra {
                            if sink.is_full() || checker.is_cancelled() {
                                return;
                            }
                            checker.validate(
                                item,
                                unevaluated.clone(),
                                alternative.scopes.clone(),
                                sink,
                            );
                        }
                    }
                }
            }
        }
    }

    let count = items.len() as u64;
    if let Some(limit) = schema.get_u64("minItems") {
        if count < limit {
            sink.push(ValidationError::new(
                format!("Array has too few items. Expected {limit} or more"),
                location,
            ));
        }
    }
    if let Some(limit) = schema.get_u64("maxItems") {
        if count > limit {
            sink.push(ValidationError::new(
                format!("Array has too many items. Expected {limit} or fewer"),
                location,
            ));
        }
    }

    if schema.flag("uniqueItems") {
        let duplicates = duplicate_indices(items);
        if !duplicates.is_empty() {
            sink.push(ValidationError::duplicate_items(location, duplicates));
        }
    }

    if let Some(contains) = schema.contains() {
        let bounded = schema.draft().supports_contains_bounds();
        let minimum = if bounded {
            schema.get_u64("minContains").unwrap_or(1)
        } else {
            1
        };
        let maximum = if bounded {
            schema.get_u64("maxContains")
        } else {
            None
        };
        let mut matching = 0_u64;
        for item in items {
            if checker.is_cancelled() {
                return;
            }
            if checker.is_valid(item, contains.clone(), alternative.scopes.clone()) {
                matching += 1;
            }
        }
        if matching < minimum {
            let message = if minimum == 1 {
                "Array does not contain a required item".to_string()
            } else {
                format!("Array contains fewer than {minimum} matching items")
            };
            sink.push(ValidationError::new(message, location));
        }
        if let Some(maximum) = maximum {
            if matching > maximum {
                sink.push(ValidationError::new(
                    format!("Array contains more than {maximum} matching items"),
                    location,
                ));
            }
        }
    }
}

/// Indices of every item equal to another item of the array.
fn duplicate_indices(items: &[InstanceNode]) -> Vec<usize> {
    let values: Vec<Value> = items.iter().map(InstanceNode::to_json).collect();
    let mut duplicates = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        if values
            .iter()
            .enumerate()
            .any(|(other, candidate)| other != idx && cmp::equal(value, candidate))
        {
            duplicates.push(idx);
        }
    }
    duplicates
}
