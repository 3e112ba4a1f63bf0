//! Per-dialect interpretation strategy.
//!
//! [`Draft`] is the only place where dialect differences are expressed: keyword aliases,
//! the reference resolver order and the validation set selection.
use serde_json::Value;

use crate::{
    pointer::{self, Segment},
    resolver::ResolverKind,
    types::JsonType,
    Vocabulary, VocabularySet,
};

mod draft201909;
mod draft202012;
mod draft4;
mod draft6;
mod draft7;

/// JSON Schema specification versions.
#[non_exhaustive]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Draft {
    /// JSON Schema Draft 4
    Draft4,
    /// JSON Schema Draft 6
    Draft6,
    /// JSON Schema Draft 7
    Draft7,
    /// JSON Schema Draft 2019-09
    Draft201909,
    /// JSON Schema Draft 2020-12
    #[default]
    Draft202012,
}

/// How sibling keywords of `$ref` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSiblings {
    /// Siblings are ignored, the reference target replaces the schema.
    Ignore,
    /// Siblings are merged with the reference target.
    Merge,
}

/// How exclusive numeric bounds are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusiveBounds {
    /// `exclusiveMinimum: true` modifies `minimum`.
    Flags,
    /// `exclusiveMinimum: 5` is a standalone bound.
    Values,
}

/// Checks selected for one schema and instance pair, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    Const,
    Type,
    Enum,
    Numeric,
    String,
    Array,
    Object,
    Not,
}

/// Keyword presence queries used for validation set selection.
pub trait KeywordLookup {
    fn has_keyword(&self, keyword: &str) -> bool;
}

/// Keywords under which subschemas live, grouped by the shape of their values.
pub(crate) struct SubschemaKeywords {
    /// The value itself is a subschema.
    pub(crate) in_value: &'static [&'static str],
    /// The value is an array of subschemas.
    pub(crate) in_array: &'static [&'static str],
    /// The value is a map of subschemas.
    pub(crate) in_map: &'static [&'static str],
    /// Either a single subschema or an array of them.
    pub(crate) in_value_or_array: &'static [&'static str],
    /// A map whose values are subschemas only when they are objects.
    pub(crate) in_map_if_schema: &'static [&'static str],
}

const NUMERIC_KEYWORDS: &[&str] = &[
    "multipleOf",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
];
const STRING_KEYWORDS: &[&str] = &["minLength", "maxLength", "pattern"];
const ARRAY_KEYWORDS: &[&str] = &[
    "items",
    "additionalItems",
    "prefixItems",
    "contains",
    "minContains",
    "maxContains",
    "minItems",
    "maxItems",
    "uniqueItems",
    "unevaluatedItems",
];
const OBJECT_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
    "required",
    "dependencies",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
    "minProperties",
    "maxProperties",
];

impl Draft {
    /// Detect the draft from the `$schema` keyword of a document.
    #[must_use]
    pub fn detect(contents: &Value) -> Option<Draft> {
        let schema = contents.as_object()?.get("$schema")?.as_str()?;
        Draft::from_meta_schema_uri(schema)
    }

    /// Detect the draft, falling back to `default` for unknown or missing `$schema`.
    #[must_use]
    pub fn detect_or(contents: &Value, default: Draft) -> Draft {
        Draft::detect(contents).unwrap_or(default)
    }

    /// Map a meta-schema URI to its draft.
    #[must_use]
    pub fn from_meta_schema_uri(uri: &str) -> Option<Draft> {
        let uri = uri.trim_end_matches('#');
        let uri = uri
            .strip_prefix("https://")
            .or_else(|| uri.strip_prefix("http://"))
            .unwrap_or(uri);
        match uri {
            "json-schema.org/draft/2020-12/schema" => Some(Draft::Draft202012),
            "json-schema.org/draft/2019-09/schema" => Some(Draft::Draft201909),
            "json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            "json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            "json-schema.org/draft-04/schema" => Some(Draft::Draft4),
            _ => None,
        }
    }

    /// The canonical meta-schema URI.
    #[must_use]
    pub const fn meta_schema_uri(self) -> &'static str {
        match self {
            Draft::Draft4 => "http://json-schema.org/draft-04/schema#",
            Draft::Draft6 => "http://json-schema.org/draft-06/schema#",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema#",
            Draft::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Draft::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    #[must_use]
    pub const fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft4 => "id",
            _ => "$id",
        }
    }

    #[must_use]
    pub const fn definitions_keyword(self) -> &'static str {
        match self {
            Draft::Draft4 | Draft::Draft6 | Draft::Draft7 => "definitions",
            Draft::Draft201909 | Draft::Draft202012 => "$defs",
        }
    }

    /// Keyword holding per-position item schemas.
    #[must_use]
    pub const fn positional_items_keyword(self) -> &'static str {
        match self {
            Draft::Draft202012 => "prefixItems",
            _ => "items",
        }
    }

    /// Keyword holding the schema for items not covered positionally.
    #[must_use]
    pub const fn non_positional_items_keyword(self) -> &'static str {
        match self {
            Draft::Draft202012 => "items",
            _ => "additionalItems",
        }
    }

    #[must_use]
    pub const fn dynamic_ref_keyword(self) -> Option<&'static str> {
        match self {
            Draft::Draft201909 => Some("$recursiveRef"),
            Draft::Draft202012 => Some("$dynamicRef"),
            _ => None,
        }
    }

    #[must_use]
    pub const fn dynamic_anchor_keyword(self) -> Option<&'static str> {
        match self {
            Draft::Draft201909 => Some("$recursiveAnchor"),
            Draft::Draft202012 => Some("$dynamicAnchor"),
            _ => None,
        }
    }

    /// Keyword declaring plain-name anchors.
    #[must_use]
    pub const fn anchor_keyword(self) -> Option<&'static str> {
        match self {
            Draft::Draft201909 | Draft::Draft202012 => Some("$anchor"),
            _ => None,
        }
    }

    #[must_use]
    pub const fn dependency_schemas_keyword(self) -> &'static str {
        match self {
            Draft::Draft201909 | Draft::Draft202012 => "dependentSchemas",
            _ => "dependencies",
        }
    }

    #[must_use]
    pub const fn property_dependencies_keyword(self) -> &'static str {
        match self {
            Draft::Draft201909 | Draft::Draft202012 => "dependentRequired",
            _ => "dependencies",
        }
    }

    #[must_use]
    pub const fn unevaluated_items_keyword(self) -> Option<&'static str> {
        match self {
            Draft::Draft201909 | Draft::Draft202012 => Some("unevaluatedItems"),
            _ => None,
        }
    }

    #[must_use]
    pub const fn unevaluated_properties_keyword(self) -> Option<&'static str> {
        match self {
            Draft::Draft201909 | Draft::Draft202012 => Some("unevaluatedProperties"),
            _ => None,
        }
    }

    /// Whether `minContains` / `maxContains` are understood.
    #[must_use]
    pub const fn supports_contains_bounds(self) -> bool {
        matches!(self, Draft::Draft201909 | Draft::Draft202012)
    }

    /// Whether `contains`, `const` and `propertyNames` exist.
    #[must_use]
    pub const fn supports_draft6_keywords(self) -> bool {
        !matches!(self, Draft::Draft4)
    }

    /// Whether `if` / `then` / `else` exist.
    #[must_use]
    pub const fn supports_conditionals(self) -> bool {
        !matches!(self, Draft::Draft4 | Draft::Draft6)
    }

    /// Whether numbers with a zero fractional part (`1.0`) count as integers.
    #[must_use]
    pub const fn integer_valued_numbers(self) -> bool {
        !matches!(self, Draft::Draft4)
    }

    #[must_use]
    pub const fn exclusive_bounds(self) -> ExclusiveBounds {
        match self {
            Draft::Draft4 => ExclusiveBounds::Flags,
            _ => ExclusiveBounds::Values,
        }
    }

    #[must_use]
    pub const fn ref_siblings(self) -> RefSiblings {
        match self {
            Draft::Draft4 | Draft::Draft6 | Draft::Draft7 => RefSiblings::Ignore,
            Draft::Draft201909 | Draft::Draft202012 => RefSiblings::Merge,
        }
    }

    /// Reference resolvers in the order they are tried.
    #[must_use]
    pub const fn reference_resolvers(self) -> &'static [ResolverKind] {
        match self {
            Draft::Draft4 | Draft::Draft6 | Draft::Draft7 => {
                &[ResolverKind::Local, ResolverKind::Remote]
            }
            Draft::Draft201909 | Draft::Draft202012 => &[
                ResolverKind::Dynamic,
                ResolverKind::Local,
                ResolverKind::Vocabulary,
                ResolverKind::Remote,
            ],
        }
    }

    /// Vocabularies active when a document does not declare any.
    #[must_use]
    pub fn default_vocabularies(self) -> VocabularySet {
        match self {
            Draft::Draft201909 => VocabularySet::from_known(&[
                Vocabulary::Core,
                Vocabulary::Applicator,
                Vocabulary::Validation,
                Vocabulary::Metadata,
                Vocabulary::Format,
                Vocabulary::Content,
            ]),
            Draft::Draft202012 => VocabularySet::from_known(&[
                Vocabulary::Core,
                Vocabulary::Applicator,
                Vocabulary::Unevaluated,
                Vocabulary::Validation,
                Vocabulary::Metadata,
                Vocabulary::FormatAnnotation,
                Vocabulary::Content,
            ]),
            _ => VocabularySet::all(),
        }
    }

    /// Select the ordered validation set for `schema` and an instance of type `inferred`.
    ///
    /// `const` suppresses every other check. Shape-specific families run only when the schema
    /// declares one of their keywords and the instance has the matching shape.
    ///
    /// The instance is only consulted through `inferred`. `vocabularies` is the vocabulary set
    /// of the schema's dialect, which gates assertion and applicator families from 2019-09 on.
    #[must_use]
    pub fn validations(
        self,
        schema: &impl KeywordLookup,
        inferred: JsonType,
        vocabularies: &VocabularySet,
    ) -> Vec<ValidationKind> {
        let assertions = !self.has_vocabularies() || vocabularies.contains(Vocabulary::Validation);
        let applicators = !self.has_vocabularies() || vocabularies.contains(Vocabulary::Applicator);
        let declares = |keywords: &[&str]| keywords.iter().any(|kw| schema.has_keyword(kw));

        if assertions && self.supports_draft6_keywords() && schema.has_keyword("const") {
            return vec![ValidationKind::Const];
        }
        let mut validations = Vec::with_capacity(4);
        if assertions {
            if schema.has_keyword("type") {
                validations.push(ValidationKind::Type);
            }
            if schema.has_keyword("enum") {
                validations.push(ValidationKind::Enum);
            }
        }
        match inferred {
            JsonType::Integer | JsonType::Number if assertions && declares(NUMERIC_KEYWORDS) => {
                validations.push(ValidationKind::Numeric);
            }
            JsonType::String if assertions && declares(STRING_KEYWORDS) => {
                validations.push(ValidationKind::String);
            }
            JsonType::Array if declares(ARRAY_KEYWORDS) => {
                validations.push(ValidationKind::Array);
            }
            JsonType::Object if declares(OBJECT_KEYWORDS) => {
                validations.push(ValidationKind::Object);
            }
            _ => {}
        }
        if applicators && schema.has_keyword("not") {
            validations.push(ValidationKind::Not);
        }
        validations
    }

    /// Whether the dialect knows about `$vocabulary`.
    #[must_use]
    pub const fn has_vocabularies(self) -> bool {
        matches!(self, Draft::Draft201909 | Draft::Draft202012)
    }

    pub(crate) const fn subschema_keywords(self) -> &'static SubschemaKeywords {
        match self {
            Draft::Draft4 => &draft4::KEYWORDS,
            Draft::Draft6 => &draft6::KEYWORDS,
            Draft::Draft7 => &draft7::KEYWORDS,
            Draft::Draft201909 => &draft201909::KEYWORDS,
            Draft::Draft202012 => &draft202012::KEYWORDS,
        }
    }

    /// Direct subschemas of `contents`, paired with their pointers relative to `contents`.
    pub(crate) fn subresources_of(self, contents: &Value) -> Vec<(String, &Value)> {
        let Some(object) = contents.as_object() else {
            return Vec::new();
        };
        let keywords = self.subschema_keywords();
        let mut found = Vec::new();
        for (key, value) in object {
            let key = key.as_str();
            if keywords.in_value.contains(&key) {
                found.push((pointer::join("", key), value));
            } else if keywords.in_array.contains(&key)
                || keywords.in_value_or_array.contains(&key)
            {
                match value {
                    Value::Array(items) => {
                        for (idx, item) in items.iter().enumerate() {
                            found.push((pointer::join_all("", [Segment::from(key), Segment::from(idx)]), item));
                        }
                    }
                    Value::Object(_) | Value::Bool(_)
                        if keywords.in_value_or_array.contains(&key) =>
                    {
                        found.push((pointer::join("", key), value));
                    }
                    _ => {}
                }
            } else if keywords.in_map.contains(&key) || keywords.in_map_if_schema.contains(&key) {
                if let Some(map) = value.as_object() {
                    let only_objects = keywords.in_map_if_schema.contains(&key);
                    for (name, item) in map {
                        if only_objects && !item.is_object() {
                            continue;
                        }
                        found.push((
                            pointer::join_all("", [Segment::from(key), Segment::from(name.as_str())]),
                            item,
                        ));
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    struct Keys(&'static [&'static str]);

    impl KeywordLookup for Keys {
        fn has_keyword(&self, keyword: &str) -> bool {
            self.0.contains(&keyword)
        }
    }

    #[test_case(&json!({"$schema": "https://json-schema.org/draft/2020-12/schema"}), Some(Draft::Draft202012))]
    #[test_case(&json!({"$schema": "https://json-schema.org/draft/2019-09/schema#"}), Some(Draft::Draft201909))]
    #[test_case(&json!({"$schema": "http://json-schema.org/draft-07/schema#"}), Some(Draft::Draft7))]
    #[test_case(&json!({"$schema": "http://json-schema.org/draft-06/schema#"}), Some(Draft::Draft6))]
    #[test_case(&json!({"$schema": "http://json-schema.org/draft-04/schema#"}), Some(Draft::Draft4))]
    #[test_case(&json!({"$schema": "http://example.com/custom"}), None)]
    #[test_case(&json!({}), None)]
    fn detection(contents: &Value, expected: Option<Draft>) {
        assert_eq!(Draft::detect(contents), expected);
    }

    #[test]
    fn item_keywords_rename() {
        assert_eq!(Draft::Draft7.positional_items_keyword(), "items");
        assert_eq!(Draft::Draft7.non_positional_items_keyword(), "additionalItems");
        assert_eq!(Draft::Draft202012.positional_items_keyword(), "prefixItems");
        assert_eq!(Draft::Draft202012.non_positional_items_keyword(), "items");
        assert_eq!(Draft::Draft4.dynamic_ref_keyword(), None);
        assert_eq!(Draft::Draft201909.dynamic_ref_keyword(), Some("$recursiveRef"));
    }

    #[test]
    fn const_suppresses_other_checks() {
        let schema = Keys(&["const", "type", "minimum"]);
        let validations =
            Draft::Draft7.validations(&schema, JsonType::Integer, &VocabularySet::all());
        assert_eq!(validations, vec![ValidationKind::Const]);
    }

    #[test]
    fn draft4_has_no_const() {
        let schema = Keys(&["const", "type"]);
        let validations =
            Draft::Draft4.validations(&schema, JsonType::Integer, &VocabularySet::all());
        assert_eq!(validations, vec![ValidationKind::Type]);
    }

    #[test_case(JsonType::String, &[ValidationKind::String, ValidationKind::Not])]
    #[test_case(JsonType::Array, &[ValidationKind::Array, ValidationKind::Not])]
    #[test_case(JsonType::Integer, &[ValidationKind::Not])]
    fn families_follow_instance_shape(inferred: JsonType, expected: &[ValidationKind]) {
        let schema = Keys(&["minLength", "minItems", "not"]);
        let validations =
            Draft::Draft202012.validations(&schema, inferred, &VocabularySet::all());
        assert_eq!(validations, expected);
    }

    #[test]
    fn disabled_validation_vocabulary() {
        let schema = Keys(&["type", "minLength", "properties"]);
        let vocabularies = VocabularySet::from_known(&[Vocabulary::Core, Vocabulary::Applicator]);
        assert!(Draft::Draft202012
            .validations(&schema, JsonType::String, &vocabularies)
            .is_empty());
        assert_eq!(
            Draft::Draft202012.validations(&schema, JsonType::Object, &vocabularies),
            vec![ValidationKind::Object]
        );
    }

    #[test]
    fn subresources() {
        let contents = json!({
            "items": [{"type": "string"}, true],
            "properties": {"a/b": {}},
            "dependencies": {"x": ["y"], "z": {}},
            "not": {}
        });
        let mut found: Vec<_> = Draft::Draft7
            .subresources_of(&contents)
            .into_iter()
            .map(|(pointer, _)| pointer)
            .collect();
        found.sort();
        assert_eq!(
            found,
            vec!["/dependencies/z", "/items/0", "/items/1", "/not", "/properties/a~1b"]
        );
    }
}
