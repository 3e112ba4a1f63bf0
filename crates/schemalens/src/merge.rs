//! Schema combination rules.
//!
//! [`merge`] layers one view over another without touching either. The accessors in
//! [`crate::schema`] decide per keyword how the two sides combine:
//!
//! - scalars: `other` wins,
//! - permissive flags: AND, exclusivity flags: OR,
//! - maps and `required`: union, collisions merged recursively,
//! - `type`: intersection,
//! - applicators: `other` only,
//! - single subschemas: merged when both sides have one.
use std::sync::Arc;

use serde_json::Value;

use crate::schema::{Merged, Schema};

/// Layer `other` over `base`.
///
/// `true` is the identity and `false` absorbs everything. `ref_target` marks the view as the
/// result of inlining a reference, whose own references are followed next.
#[must_use]
pub fn merge(base: &Schema, other: &Schema, ref_target: Option<&Schema>) -> Schema {
    match (base.as_bool(), other.as_bool()) {
        (Some(false), _) => return base.clone(),
        (_, Some(false)) => return other.clone(),
        (Some(true), _) => return other.clone(),
        (_, Some(true)) => return base.clone(),
        _ => {}
    }
    if base == other {
        return base.clone();
    }
    Schema::Merged(Arc::new(Merged {
        base: base.clone(),
        other: other.clone(),
        ref_target: ref_target.cloned(),
    }))
}

pub(crate) fn merge_optional(base: Option<Schema>, other: Option<Schema>) -> Option<Schema> {
    match (base, other) {
        (Some(base), Some(other)) => Some(merge(&base, &other, None)),
        (base, other) => other.or(base),
    }
}

/// Union of two keyed schema lists in first-seen order.
pub(crate) fn union_maps(
    base: Vec<(String, Schema)>,
    other: Vec<(String, Schema)>,
) -> Vec<(String, Schema)> {
    let mut result = base;
    for (name, schema) in other {
        if let Some((_, existing)) = result.iter_mut().find(|(key, _)| *key == name) {
            *existing = merge(existing, &schema, None);
        } else {
            result.push((name, schema));
        }
    }
    result
}

pub(crate) fn union_strings(base: Vec<String>, other: Vec<String>) -> Vec<String> {
    let mut result = base;
    for value in other {
        if !result.contains(&value) {
            result.push(value);
        }
    }
    result
}

pub(crate) fn union_dependencies(
    base: Vec<(String, Vec<String>)>,
    other: Vec<(String, Vec<String>)>,
) -> Vec<(String, Vec<String>)> {
    let mut result = base;
    for (name, names) in other {
        if let Some((_, existing)) = result.iter_mut().find(|(key, _)| *key == name) {
            *existing = union_strings(core::mem::take(existing), names);
        } else {
            result.push((name, names));
        }
    }
    result
}

/// Merge positional lists element-wise; the longer list keeps its tail.
pub(crate) fn zip_lists(base: Vec<Schema>, other: Vec<Schema>) -> Vec<Schema> {
    let len = base.len().max(other.len());
    let mut base = base.into_iter();
    let mut other = other.into_iter();
    (0..len)
        .filter_map(|_| merge_optional(base.next(), other.next()))
        .collect()
}

/// A non-negative integer; integral floats such as `2.0` are accepted.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn non_negative(value: &Value) -> Option<u64> {
    let number = match value {
        Value::Number(number) => number,
        _ => return None,
    };
    if let Some(value) = number.as_u64() {
        return Some(value);
    }
    number
        .as_f64()
        .filter(|value| value.fract() == 0.0 && *value >= 0.0 && *value <= u64::MAX as f64)
        .map(|value| value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_referencing::{JsonType, JsonTypeSet, RootSchema};
    use serde_json::json;

    fn schemas(document: Value) -> Vec<Schema> {
        let root = RootSchema::new("https://example.com/merge.json", document).expect("valid uri");
        root.node()
            .and_then(|node| node.child_list("schemas"))
            .expect("schemas")
            .into_iter()
            .map(Schema::Node)
            .collect()
    }

    #[test]
    fn booleans() {
        let list = schemas(json!({"schemas": [true, false, {"type": "string"}]}));
        let (yes, no, string) = (&list[0], &list[1], &list[2]);
        assert_eq!(&merge(yes, string, None), string);
        assert_eq!(&merge(string, yes, None), string);
        assert_eq!(merge(string, no, None).as_bool(), Some(false));
        assert_eq!(merge(no, string, None).as_bool(), Some(false));
        assert!(merge(string, no, None).is_impossible());
    }

    #[test]
    fn scalars_prefer_other() {
        let list = schemas(json!({"schemas": [
            {"minLength": 1, "title": "base", "pattern": "a"},
            {"minLength": 3, "description": "other"}
        ]}));
        let merged = merge(&list[0], &list[1], None);
        assert_eq!(merged.get_u64("minLength"), Some(3));
        assert_eq!(merged.title(), Some("base"));
        assert_eq!(merged.description(), Some("other"));
        assert_eq!(merged.get_str("pattern"), Some("a"));
    }

    #[test]
    fn types_intersect() {
        let list = schemas(json!({"schemas": [
            {"type": ["number", "string"]},
            {"type": "integer"},
            {"type": "boolean"}
        ]}));
        let merged = merge(&list[0], &list[1], None);
        assert_eq!(merged.types(), Some(JsonTypeSet::empty().insert(JsonType::Integer)));
        assert!(merge(&list[1], &list[2], None).is_impossible());
    }

    #[test]
    fn maps_union_and_collisions_merge() {
        let list = schemas(json!({"schemas": [
            {"properties": {"a": {"type": "string"}, "b": {}}, "required": ["a"]},
            {"properties": {"a": {"minLength": 2}, "c": {}}, "required": ["c", "a"]}
        ]}));
        let merged = merge(&list[0], &list[1], None);
        let names: Vec<_> = merged.properties().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let a = merged.property("a").expect("merged property");
        assert_eq!(a.types(), Some(JsonTypeSet::empty().insert(JsonType::String)));
        assert_eq!(a.get_u64("minLength"), Some(2));
        assert_eq!(merged.required(), vec!["a", "c"]);
    }

    #[test]
    fn flags() {
        let list = schemas(json!({"schemas": [
            {"uniqueItems": true, "additionalProperties": false},
            {"uniqueItems": false, "additionalProperties": {"type": "string"}}
        ]}));
        let merged = merge(&list[0], &list[1], None);
        assert!(merged.flag("uniqueItems"));
        assert!(!merged.additional_properties_allowed());
        assert_eq!(merged.additional_properties().and_then(|s| s.as_bool()), Some(false));
    }

    #[test]
    fn applicators_come_from_other() {
        let list = schemas(json!({"schemas": [
            {"anyOf": [{}, {}], "not": {"type": "null"}},
            {"oneOf": [{}]}
        ]}));
        let merged = merge(&list[0], &list[1], None);
        assert!(merged.any_of().is_none());
        assert!(merged.not().is_none());
        assert_eq!(merged.one_of().map(|list| list.len()), Some(1));
    }

    #[test]
    fn references_follow_the_target() {
        let list = schemas(json!({"schemas": [
            {"$ref": "#/schemas/2", "minLength": 1},
            {"$ref": "#/schemas/2"},
            {"maxLength": 4}
        ]}));
        let plain = merge(&list[0], &list[2], None);
        assert_eq!(plain.reference_owner(), Some(list[0].primary_node()));
        let inlined = merge(&list[0], &list[2], Some(&list[2]));
        assert!(inlined.reference_owner().is_none());
        let chained = merge(&list[2], &list[0], Some(&list[1]));
        assert_eq!(chained.reference_owner(), Some(list[1].primary_node()));
    }

    #[test]
    fn dependencies_union() {
        let merged = union_dependencies(
            vec![("a".into(), vec!["b".into()])],
            vec![("a".into(), vec!["c".into(), "b".into()]), ("d".into(), vec![])],
        );
        assert_eq!(
            merged,
            vec![
                ("a".to_string(), vec!["b".to_string(), "c".to_string()]),
                ("d".to_string(), vec![]),
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn keyword() -> impl Strategy<Value = (String, Value)> {
            prop_oneof![
                (0u64..10).prop_map(|n| ("minLength".to_string(), json!(n))),
                (0u64..10).prop_map(|n| ("maximum".to_string(), json!(n))),
                prop::sample::select(vec!["string", "number", "integer", "object"])
                    .prop_map(|t| ("type".to_string(), json!(t))),
                any::<bool>().prop_map(|b| ("uniqueItems".to_string(), json!(b))),
                prop::collection::vec("[a-c]", 0..3)
                    .prop_map(|names| ("required".to_string(), json!(names))),
                "[a-c]".prop_map(|name| (
                    "properties".to_string(),
                    json!({name: {"type": "string"}})
                )),
            ]
        }

        proptest! {
            #[test]
            fn merge_with_itself_is_identity(keywords in prop::collection::vec(keyword(), 0..6)) {
                let document: serde_json::Map<String, Value> = keywords.into_iter().collect();
                let list = schemas(json!({"schemas": [Value::Object(document.clone())]}));
                let schema = &list[0];
                // Two distinct handles to the same content, so the structural shortcut is bypassed.
                let twin = schemas(json!({"schemas": [Value::Object(document)]})).remove(0);
                let merged = merge(schema, &twin, None);
                prop_assert_eq!(merged.types(), schema.types());
                prop_assert_eq!(merged.required(), schema.required());
                prop_assert_eq!(merged.get_u64("minLength"), schema.get_u64("minLength"));
                prop_assert_eq!(merged.get_value("maximum"), schema.get_value("maximum"));
                prop_assert_eq!(merged.flag("uniqueItems"), schema.flag("uniqueItems"));
                let names = |s: &Schema| s.properties().into_iter().map(|(n, _)| n).collect::<Vec<_>>();
                prop_assert_eq!(names(&merged), names(schema));
                prop_assert_eq!(&merge(schema, schema, None), schema);
            }
        }
    }
}
