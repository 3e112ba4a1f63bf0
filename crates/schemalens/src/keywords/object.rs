use std::sync::Arc;

use crate::{
    checker::{Checker, ErrorSink},
    error::{Priority, ValidationError},
    instance::{InstanceLocation, InstanceNode, InstanceProperty},
    regex::Pattern,
    schema::Schema,
    tree::Alternative,
};

pub(crate) fn validate(
    checker: &Checker<'_>,
    instance: &InstanceNode,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    let Some(properties) = instance.as_object() else {
        return;
    };
    let schema = &alternative.schema;
    let location = &instance.location;

    let required = schema.required();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !instance.has_property(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        sink.push(ValidationError::missing_properties(location, missing));
    }

    for (trigger, names) in schema.dependent_required() {
        if !instance.has_property(&trigger) {
            continue;
        }
        let missing: Vec<String> = names
            .into_iter()
            .filter(|name| !instance.has_property(name))
            .collect();
        if !missing.is_empty() {
            sink.push(ValidationError::missing_properties(location, missing));
        }
    }
    for (trigger, dependency) in schema.dependent_schemas() {
        if sink.is_full() || checker.is_cancelled() {
            return;
        }
        if instance.has_property(&trigger) {
            checker.validate(instance, dependency, alternative.scopes.clone(), sink);
        }
    }

    if let Some(names) = schema.property_names() {
        for property in properties {
            if sink.is_full() || checker.is_cancelled() {
                return;
            }
            let name = InstanceNode::string(&property.name, property.location.clone());
            checker.validate(&name, names.clone(), alternative.scopes.clone(), sink);
        }
    }

    let declared = schema.properties();
    let patterns = compile_patterns(checker, schema, location, sink);
    let additional = schema.additional_properties();
    let unevaluated = if additional.is_none() {
        schema.unevaluated_properties()
    } else {
        None
    };
    for property in properties {
        if sink.is_full() || checker.is_cancelled() {
            return;
        }
        let mut evaluated = false;
        if let Some((_, property_schema)) = declared.iter().find(|(name, _)| *name == property.name)
        {
            evaluated = true;
            descend(checker, property, property_schema, alternative, sink);
        }
        for (pattern, pattern_schema) in &patterns {
            if pattern.is_match(&property.name) {
                evaluated = true;
                descend(checker, property, pattern_schema, alternative, sink);
            }
        }
        if evaluated {
            continue;
        }
        let Some(fallback) = additional.as_ref().or(unevaluated.as_ref()) else {
            continue;
        };
        if fallback.as_bool() == Some(false) {
            sink.push(ValidationError::prohibited_property(
                &property.location,
                &property.name,
            ));
        } else {
            descend(checker, property, fallback, alternative, sink);
        }
    }

    let count = properties.len() as u64;
    if let Some(limit) = schema.get_u64("minProperties") {
        if count < limit {
            sink.push(ValidationError::new(
                format!("Object has fewer properties than the required number of {limit}"),
                location,
            ));
        }
    }
    if let Some(limit) = schema.get_u64("maxProperties") {
        if count > limit {
            sink.push(ValidationError::new(
                format!("Object has more properties than the limit of {limit}"),
                location,
            ));
        }
    }

    if checker.compliance.report_missing_optional_properties {
        let absent: Vec<String> = declared
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !required.contains(name) && !instance.has_property(name))
            .cloned()
            .collect();
        if !absent.is_empty() {
            sink.push(ValidationError::missing_optional_properties(location, absent));
        }
    }
}

fn descend(
    checker: &Checker<'_>,
    property: &InstanceProperty,
    schema: &Schema,
    alternative: &Alternative,
    sink: &mut ErrorSink,
) {
    if let Some(value) = &property.value {
        checker.validate(value, schema.clone(), alternative.scopes.clone(), sink);
    }
}

/// Compiled `patternProperties`. Invalid expressions are reported once and skipped.
fn compile_patterns(
    checker: &Checker<'_>,
    schema: &Schema,
    location: &InstanceLocation,
    sink: &mut ErrorSink,
) -> Vec<(Arc<Pattern>, Schema)> {
    let mut compiled = Vec::new();
    for (pattern, pattern_schema) in schema.pattern_properties() {
        match checker.patterns.get(&pattern) {
            Ok(matcher) => compiled.push((matcher, pattern_schema)),
            Err(error) => sink.push(
                ValidationError::new(
                    format!("Invalid regular expression '{pattern}': {error}"),
                    location,
                )
                .with_priority(Priority::Low),
            ),
        }
    }
    compiled
}
