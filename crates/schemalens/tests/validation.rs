use schemalens::{FixableIssueKind, IssueData, Priority, ValidationError};
use serde_json::{json, Value};
use test_case::test_case;

fn errors(schema: &Value, instance: &Value) -> Vec<ValidationError> {
    schemalens::validator_for(schema)
        .expect("Valid schema")
        .validate_json(instance)
}

fn messages(schema: &Value, instance: &Value) -> Vec<String> {
    errors(schema, instance)
        .into_iter()
        .map(|error| error.message)
        .collect()
}

#[test_case(&json!({"multipleOf": 0.01}), &json!(0.29); "decimal multiple")]
#[test_case(&json!({"type": "integer", "minimum": 0, "maximum": 10}), &json!(7); "integer in range")]
#[test_case(&json!({"type": ["string", "null"]}), &json!(null); "type list")]
#[test_case(&json!({"enum": [1, "a", {"b": [true]}]}), &json!({"b": [true]}); "structured enum")]
#[test_case(&json!({"const": 1}), &json!(1.0); "const compares numbers by value")]
#[test_case(&json!({"properties": {"a": {"type": "string"}}, "required": ["a"]}), &json!({"a": "x"}); "required property")]
#[test_case(&json!({"prefixItems": [{"type": "string"}], "items": {"type": "number"}}), &json!(["a", 1, 2.5]); "prefix and rest items")]
#[test_case(&json!({"contains": {"type": "string"}, "minContains": 2}), &json!([1, "a", "b"]); "contains bounds")]
#[test_case(&json!({"patternProperties": {"^x-": {"type": "string"}}, "additionalProperties": false}), &json!({"x-a": "1"}); "pattern properties")]
#[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!({"abc": 1}); "property names")]
#[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"a": 1, "b": 2}); "dependent required")]
#[test_case(&json!({"not": {"type": "string"}}), &json!(1); "negation")]
#[test_case(&json!(true), &json!({"anything": [1, 2]}); "true schema")]
#[test_case(&json!({"anyOf": [{"type": "null"}, {"oneOf": [{"type": "string"}, {"type": "number"}]}]}), &json!(null); "one of inside an unused any of branch")]
#[test_case(&json!({"oneOf": [{"type": "string"}, {"anyOf": [{"type": "number"}, {"minimum": 0}]}]}), &json!(5); "any of counts as one variant")]
#[test_case(&json!({"allOf": [{"anyOf": [{"type": "null"}, {"oneOf": [{"minimum": 1}, {"maximum": 0}]}]}]}), &json!(3); "one of nested two levels deep")]
fn conforming_instances_are_valid(schema: &Value, instance: &Value) {
    assert_eq!(errors(schema, instance), vec![]);
}

#[test]
fn multiple_of_reports_once() {
    let schema = json!({"multipleOf": 0.01});
    assert_eq!(messages(&schema, &json!(0.291)), vec!["Is not multiple of 0.01"]);
}

#[test]
fn integer_bounds() {
    let schema = json!({"type": "integer", "minimum": 0, "maximum": 10});
    assert_eq!(
        messages(&schema, &json!(-1)),
        vec!["Less than the minimum of 0"]
    );
    let found = errors(&schema, &json!("7"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fixable_issue_kind, FixableIssueKind::TypeMismatch);
    assert_eq!(found[0].priority, Priority::TypeMismatch);
}

#[test]
fn one_of_type_errors_are_combined() {
    let schema = json!({"oneOf": [{"type": "string"}, {"type": "number"}]});
    let found = errors(&schema, &json!(true));
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].message,
        "Incompatible types. Required: number or string. Actual: boolean."
    );
    assert!(matches!(
        &found[0].issue_data,
        Some(IssueData::TypeMismatch { expected, .. }) if expected.len() == 2
    ));
}

#[test]
fn one_of_rejects_several_matches() {
    let schema = json!({"oneOf": [{"type": "number"}, {"minimum": 0}]});
    assert_eq!(
        messages(&schema, &json!(5)),
        vec!["Validates to more than one variant"]
    );
    assert!(errors(&schema, &json!(-5)).is_empty());
}

#[test]
fn nested_exclusive_groups() {
    let schema = json!({"anyOf": [{"type": "null"}, {"oneOf": [{"type": "string"}, {"type": "number"}]}]});
    let found = errors(&schema, &json!(true));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fixable_issue_kind, FixableIssueKind::TypeMismatch);

    // `minimum` ignores strings, so both variants accept "a".
    let schema = json!({"oneOf": [{"type": "string"}, {"anyOf": [{"type": "number"}, {"minimum": 0}]}]});
    assert_eq!(
        messages(&schema, &json!("a")),
        vec!["Validates to more than one variant"]
    );
    assert!(errors(&schema, &json!(-1)).is_empty());
}

#[test]
fn any_of_reports_closest_branch() {
    let schema = json!({"anyOf": [{"type": "string", "minLength": 3}, {"type": "number"}]});
    assert_eq!(
        messages(&schema, &json!("ab")),
        vec!["String is shorter than the minimum length of 3"]
    );
    assert!(errors(&schema, &json!(4)).is_empty());
}

#[test]
fn all_of_conjoins_branches() {
    let schema = json!({"allOf": [{"type": "string"}, {"maxLength": 2}], "minLength": 1});
    assert_eq!(
        messages(&schema, &json!("abc")),
        vec!["String is longer than the maximum length of 2"]
    );
    assert_eq!(
        messages(&schema, &json!("")),
        vec!["String is shorter than the minimum length of 1"]
    );
}

#[test]
fn conditionals_select_one_branch() {
    let schema = json!({
        "if": {"properties": {"kind": {"const": "a"}}, "required": ["kind"]},
        "then": {"required": ["a"]},
        "else": {"required": ["b"]}
    });
    assert_eq!(
        messages(&schema, &json!({"kind": "a"})),
        vec!["Missing required property 'a'"]
    );
    assert_eq!(
        messages(&schema, &json!({"kind": "x"})),
        vec!["Missing required property 'b'"]
    );
    assert!(errors(&schema, &json!({"kind": "a", "a": 1})).is_empty());

    let lenient = schemalens::options()
        .with_lenient_conditionals(true)
        .build(&schema)
        .expect("Valid schema");
    assert!(lenient.is_valid_json(&json!({"kind": "a", "b": 1})));
}

#[test]
fn missing_properties_are_grouped() {
    let found = errors(&json!({"required": ["a", "b"]}), &json!({}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "Missing required properties 'a', 'b'");
    assert_eq!(
        found[0].issue_data,
        Some(IssueData::MissingMultipleProps {
            names: vec!["a".to_string(), "b".to_string()]
        })
    );
}

#[test]
fn prohibited_properties_point_at_the_property() {
    let schema = json!({"properties": {"a": {}}, "additionalProperties": false});
    let found = errors(&schema, &json!({"a": 1, "b": 2}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "Property 'b' is not allowed");
    assert_eq!(found[0].location.as_str(), "/b");
}

#[test]
fn nested_errors_carry_instance_locations() {
    let schema = json!({
        "properties": {
            "items": {"type": "array", "items": {"type": "integer"}}
        }
    });
    let found = errors(&schema, &json!({"items": [1, "two", 3]}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].location.as_str(), "/items/1");
}

#[test]
fn duplicate_items_report_indices() {
    let found = errors(&json!({"uniqueItems": true}), &json!([1, 2, 1]));
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].issue_data,
        Some(IssueData::DuplicateArrayItems {
            indices: vec![0, 2]
        })
    );
}

#[test]
fn false_schemas() {
    assert_eq!(messages(&json!(false), &json!(1)), vec!["Value is not allowed"]);
    let found = errors(&json!({"properties": {"a": false}}), &json!({"a": 1}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].location.as_str(), "/a");
}

#[test]
fn patterns() {
    let schema = json!({"pattern": "^[a-z]+$"});
    assert_eq!(
        messages(&schema, &json!("ABC")),
        vec!["String violates the pattern: '^[a-z]+$'"]
    );
    let found = errors(&json!({"pattern": "(", "minLength": 5}), &json!("abc"));
    assert_eq!(found.len(), 2);
    assert!(found
        .iter()
        .any(|e| e.priority == Priority::Low && e.message.starts_with("Invalid regular expression")));
}

#[test]
fn string_length_counts_characters() {
    let schema = json!({"maxLength": 2});
    assert!(errors(&schema, &json!("日本")).is_empty());
    assert_eq!(errors(&schema, &json!("日本語")).len(), 1);
}

#[test]
fn negation_has_its_own_priority() {
    let found = errors(&json!({"not": {"type": "string"}}), &json!("a"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "Validates against 'not' schema");
    assert_eq!(found[0].priority, Priority::NotSchema);
}

#[test]
fn const_suppresses_other_checks() {
    assert_eq!(
        messages(&json!({"const": "a", "type": "integer"}), &json!("b")),
        vec!["Value must be \"a\""]
    );
}

#[test]
fn contains_bounds() {
    let schema = json!({"contains": {"type": "string"}, "maxContains": 1});
    assert_eq!(
        messages(&schema, &json!(["a", "b"])),
        vec!["Array contains more than 1 matching items"]
    );
    assert_eq!(
        messages(&schema, &json!([1])),
        vec!["Array does not contain a required item"]
    );
}

#[test]
fn unevaluated_properties_apply_to_leftovers() {
    let schema = json!({
        "properties": {"a": {}},
        "unevaluatedProperties": {"type": "string"}
    });
    assert!(errors(&schema, &json!({"a": 1, "b": "x"})).is_empty());
    let found = errors(&schema, &json!({"a": 1, "b": 2}));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].location.as_str(), "/b");
}
