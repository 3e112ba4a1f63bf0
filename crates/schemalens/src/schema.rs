//! Read-only schema views.
//!
//! A [`Schema`] is either a plain node of a loaded document, a merge of two views, or a view
//! with some applicators hidden. Every accessor applies the per-keyword combination rules from
//! [`crate::merge`]; nothing is ever copied or mutated.
use core::fmt;
use std::sync::Arc;

use schemalens_referencing::{
    pointer::Segment, Draft, JsonTypeSet, KeywordLookup, SchemaNode, VocabularySet,
};
use serde_json::{Number, Value};

use crate::merge;

/// Applicator families that a [`Schema::restrict`] view can hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Applicators(u8);

impl Applicators {
    pub const NONE: Applicators = Applicators(0);
    pub const ALL_OF: Applicators = Applicators(1);
    pub const ANY_OF: Applicators = Applicators(1 << 1);
    pub const ONE_OF: Applicators = Applicators(1 << 2);
    pub const CONDITIONAL: Applicators = Applicators(1 << 3);
    pub const REF: Applicators = Applicators(1 << 4);
    /// Every combinator family, references excluded.
    pub const COMBINATORS: Applicators = Applicators(0b1111);

    #[must_use]
    pub const fn union(self, other: Applicators) -> Applicators {
        Applicators(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Applicators) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn of_keyword(keyword: &str) -> Applicators {
        match keyword {
            "allOf" => Applicators::ALL_OF,
            "anyOf" => Applicators::ANY_OF,
            "oneOf" => Applicators::ONE_OF,
            "if" | "then" | "else" => Applicators::CONDITIONAL,
            "$ref" | "$dynamicRef" | "$recursiveRef" => Applicators::REF,
            _ => Applicators::NONE,
        }
    }
}

/// A schema as seen by the resolution tree and the checkers.
#[derive(Clone, PartialEq)]
pub enum Schema {
    Node(SchemaNode),
    Merged(Arc<Merged>),
    Restricted(Arc<Restricted>),
}

/// `other` layered over `base`.
#[derive(PartialEq)]
pub struct Merged {
    pub(crate) base: Schema,
    pub(crate) other: Schema,
    /// The reference target this merge was produced for; its references are followed next.
    pub(crate) ref_target: Option<Schema>,
}

/// `inner` with some applicator families hidden.
#[derive(PartialEq)]
pub struct Restricted {
    pub(crate) inner: Schema,
    pub(crate) hidden: Applicators,
}

impl From<SchemaNode> for Schema {
    fn from(node: SchemaNode) -> Self {
        Schema::Node(node)
    }
}

impl Schema {
    /// Hide the given applicator families.
    #[must_use]
    pub fn restrict(&self, hidden: Applicators) -> Schema {
        if hidden.is_empty() || self.as_bool().is_some() {
            return self.clone();
        }
        match self {
            Schema::Restricted(restricted) => Schema::Restricted(Arc::new(Restricted {
                inner: restricted.inner.clone(),
                hidden: restricted.hidden.union(hidden),
            })),
            _ => Schema::Restricted(Arc::new(Restricted {
                inner: self.clone(),
                hidden,
            })),
        }
    }

    /// The document node that best identifies this view.
    #[must_use]
    pub fn primary_node(&self) -> &SchemaNode {
        match self {
            Schema::Node(node) => node,
            Schema::Merged(merged) => merged
                .ref_target
                .as_ref()
                .unwrap_or(&merged.other)
                .primary_node(),
            Schema::Restricted(restricted) => restricted.inner.primary_node(),
        }
    }

    #[must_use]
    pub fn draft(&self) -> Draft {
        self.primary_node().draft()
    }

    #[must_use]
    pub fn vocabularies(&self) -> &VocabularySet {
        self.primary_node().vocabularies()
    }

    /// `Some` for `true` and `false` schemas.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Schema::Node(node) => node.as_bool(),
            Schema::Merged(_) => None,
            Schema::Restricted(restricted) => restricted.inner.as_bool(),
        }
    }

    /// No instance can satisfy this schema.
    #[must_use]
    pub fn is_impossible(&self) -> bool {
        self.as_bool() == Some(false) || self.types().is_some_and(JsonTypeSet::is_empty)
    }

    fn hides(&self, keyword: &str) -> bool {
        match self {
            Schema::Restricted(restricted) => {
                restricted.hidden.contains(Applicators::of_keyword(keyword))
                    || restricted.inner.hides(keyword)
            }
            _ => false,
        }
    }

    /// Raw value of `keyword` after applying the combination rules.
    #[must_use]
    pub fn get_value(&self, keyword: &str) -> Option<&Value> {
        match self {
            Schema::Node(node) => node.get_value(keyword),
            Schema::Merged(merged) => match Applicators::of_keyword(keyword) {
                Applicators::REF => self
                    .reference_owner()
                    .and_then(|owner| owner.get_value(keyword)),
                Applicators::NONE if keyword != "not" => merged
                    .other
                    .get_value(keyword)
                    .or_else(|| merged.base.get_value(keyword)),
                _ => merged.other.get_value(keyword),
            },
            Schema::Restricted(restricted) => {
                if self.hides(keyword) {
                    None
                } else {
                    restricted.inner.get_value(keyword)
                }
            }
        }
    }

    #[must_use]
    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get_value(keyword)?.as_str()
    }

    #[must_use]
    pub fn get_number(&self, keyword: &str) -> Option<&Number> {
        match self.get_value(keyword)? {
            Value::Number(number) => Some(number),
            _ => None,
        }
    }

    /// A non-negative integer keyword such as `minLength`.
    #[must_use]
    pub fn get_u64(&self, keyword: &str) -> Option<u64> {
        merge::non_negative(self.get_value(keyword)?)
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    /// Deprecation notice if the schema is deprecated.
    #[must_use]
    pub fn deprecation(&self) -> Option<String> {
        if let Some(message) = self.get_str("deprecationMessage") {
            return Some(message.to_string());
        }
        (self.get_value("deprecated").and_then(Value::as_bool) == Some(true))
            .then(|| "Property is deprecated".to_string())
    }

    #[must_use]
    pub fn const_value(&self) -> Option<&Value> {
        if self.draft().supports_draft6_keywords() {
            self.get_value("const")
        } else {
            None
        }
    }

    #[must_use]
    pub fn enum_values(&self) -> Option<&[Value]> {
        self.get_value("enum")?.as_array().map(Vec::as_slice)
    }

    /// Declared types. Merged views intersect both sides.
    #[must_use]
    pub fn types(&self) -> Option<JsonTypeSet> {
        match self {
            Schema::Node(node) => node.get_value("type").and_then(JsonTypeSet::from_keyword),
            Schema::Merged(merged) => match (merged.base.types(), merged.other.types()) {
                (Some(base), Some(other)) => Some(base.intersect(other)),
                (base, other) => other.or(base),
            },
            Schema::Restricted(restricted) => restricted.inner.types(),
        }
    }

    /// A boolean flag where merged views are `true` if either side is.
    #[must_use]
    pub fn flag(&self, keyword: &str) -> bool {
        match self {
            Schema::Node(node) => node.get_bool(keyword) == Some(true),
            Schema::Merged(merged) => merged.base.flag(keyword) || merged.other.flag(keyword),
            Schema::Restricted(restricted) => restricted.inner.flag(keyword),
        }
    }

    /// `false` only if some side forbids additional properties outright.
    #[must_use]
    pub fn additional_properties_allowed(&self) -> bool {
        self.permits("additionalProperties")
    }

    #[must_use]
    pub fn additional_items_allowed(&self) -> bool {
        let keyword = self.draft().non_positional_items_keyword();
        self.permits(keyword)
    }

    fn permits(&self, keyword: &str) -> bool {
        match self {
            Schema::Node(node) => node.get_value(keyword) != Some(&Value::Bool(false)),
            Schema::Merged(merged) => merged.base.permits(keyword) && merged.other.permits(keyword),
            Schema::Restricted(restricted) => restricted.inner.permits(keyword),
        }
    }

    /// `required`, unioned across merged views.
    #[must_use]
    pub fn required(&self) -> Vec<String> {
        match self {
            Schema::Node(node) => node
                .get_strings("required")
                .map(|names| names.into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
            Schema::Merged(merged) => {
                merge::union_strings(merged.base.required(), merged.other.required())
            }
            Schema::Restricted(restricted) => restricted.inner.required(),
        }
    }

    /// Property dependencies: `dependentRequired`, or array-valued `dependencies`.
    #[must_use]
    pub fn dependent_required(&self) -> Vec<(String, Vec<String>)> {
        match self {
            Schema::Node(node) => {
                let keyword = node.draft().property_dependencies_keyword();
                node.get_value(keyword)
                    .and_then(Value::as_object)
                    .map(|map| {
                        map.iter()
                            .filter_map(|(name, value)| {
                                let names = value.as_array()?;
                                Some((
                                    name.clone(),
                                    names
                                        .iter()
                                        .filter_map(Value::as_str)
                                        .map(str::to_string)
                                        .collect(),
                                ))
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            Schema::Merged(merged) => merge::union_dependencies(
                merged.base.dependent_required(),
                merged.other.dependent_required(),
            ),
            Schema::Restricted(restricted) => restricted.inner.dependent_required(),
        }
    }

    fn schema_map(&self, keyword: &str) -> Vec<(String, Schema)> {
        match self {
            Schema::Node(node) => node
                .child_map(keyword)
                .map(|children| {
                    children
                        .into_iter()
                        .map(|(name, child)| (name, Schema::Node(child)))
                        .collect()
                })
                .unwrap_or_default(),
            Schema::Merged(merged) => merge::union_maps(
                merged.base.schema_map(keyword),
                merged.other.schema_map(keyword),
            ),
            Schema::Restricted(restricted) => restricted.inner.schema_map(keyword),
        }
    }

    #[must_use]
    pub fn properties(&self) -> Vec<(String, Schema)> {
        self.schema_map("properties")
    }

    #[must_use]
    pub fn pattern_properties(&self) -> Vec<(String, Schema)> {
        self.schema_map("patternProperties")
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<(String, Schema)> {
        self.schema_map(self.draft().definitions_keyword())
    }

    /// Schema dependencies: `dependentSchemas`, or schema-valued `dependencies`.
    #[must_use]
    pub fn dependent_schemas(&self) -> Vec<(String, Schema)> {
        self.schema_map(self.draft().dependency_schemas_keyword())
    }

    /// The schema declared for one property under `properties`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Schema> {
        match self {
            Schema::Node(node) => node
                .child_at([Segment::from("properties"), Segment::from(name)])
                .map(Schema::Node),
            Schema::Merged(merged) => {
                merge::merge_optional(merged.base.property(name), merged.other.property(name))
            }
            Schema::Restricted(restricted) => restricted.inner.property(name),
        }
    }

    /// A single-schema keyword where merged views merge both sides.
    fn subschema(&self, keyword: &str) -> Option<Schema> {
        match self {
            Schema::Node(node) => node.child(keyword).map(Schema::Node),
            Schema::Merged(merged) => {
                merge::merge_optional(merged.base.subschema(keyword), merged.other.subschema(keyword))
            }
            Schema::Restricted(restricted) => restricted.inner.subschema(keyword),
        }
    }

    #[must_use]
    pub fn additional_properties(&self) -> Option<Schema> {
        self.subschema("additionalProperties")
    }

    #[must_use]
    pub fn property_names(&self) -> Option<Schema> {
        if self.draft().supports_draft6_keywords() {
            self.subschema("propertyNames")
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self) -> Option<Schema> {
        if self.draft().supports_draft6_keywords() {
            self.subschema("contains")
        } else {
            None
        }
    }

    #[must_use]
    pub fn unevaluated_properties(&self) -> Option<Schema> {
        self.subschema(self.draft().unevaluated_properties_keyword()?)
    }

    #[must_use]
    pub fn unevaluated_items(&self) -> Option<Schema> {
        self.subschema(self.draft().unevaluated_items_keyword()?)
    }

    /// Per-position item schemas (`prefixItems`, or array-valued `items`).
    #[must_use]
    pub fn prefix_items(&self) -> Vec<Schema> {
        match self {
            Schema::Node(node) => {
                let keyword = node.draft().positional_items_keyword();
                if node.get_value(keyword).is_some_and(Value::is_array) {
                    node.child_list(keyword)
                        .map(|items| items.into_iter().map(Schema::Node).collect())
                        .unwrap_or_default()
                } else {
                    Vec::new()
                }
            }
            Schema::Merged(merged) => {
                merge::zip_lists(merged.base.prefix_items(), merged.other.prefix_items())
            }
            Schema::Restricted(restricted) => restricted.inner.prefix_items(),
        }
    }

    /// Schema for items not covered by [`Schema::prefix_items`].
    ///
    /// Before 2020-12 `additionalItems` only counts when `items` is an array.
    #[must_use]
    pub fn rest_items(&self) -> Option<Schema> {
        match self {
            Schema::Node(node) => {
                let draft = node.draft();
                if draft == Draft::Draft202012 {
                    return node.child("items").map(Schema::Node);
                }
                match node.get_value("items") {
                    Some(Value::Array(_)) => node.child("additionalItems").map(Schema::Node),
                    Some(_) => node.child("items").map(Schema::Node),
                    None => None,
                }
            }
            Schema::Merged(merged) => {
                merge::merge_optional(merged.base.rest_items(), merged.other.rest_items())
            }
            Schema::Restricted(restricted) => restricted.inner.rest_items(),
        }
    }

    /// An applicator list: `other` only for merged views.
    fn applicator_list(&self, keyword: &str) -> Option<Vec<Schema>> {
        match self {
            Schema::Node(node) => node
                .child_list(keyword)
                .filter(|_| node.get_value(keyword).is_some_and(Value::is_array))
                .map(|items| items.into_iter().map(Schema::Node).collect()),
            Schema::Merged(merged) => merged.other.applicator_list(keyword),
            Schema::Restricted(restricted) => {
                if self.hides(keyword) {
                    None
                } else {
                    restricted.inner.applicator_list(keyword)
                }
            }
        }
    }

    /// A single-schema applicator: `other` only for merged views.
    fn applicator(&self, keyword: &str) -> Option<Schema> {
        match self {
            Schema::Node(node) => node.child(keyword).map(Schema::Node),
            Schema::Merged(merged) => merged.other.applicator(keyword),
            Schema::Restricted(restricted) => {
                if self.hides(keyword) {
                    None
                } else {
                    restricted.inner.applicator(keyword)
                }
            }
        }
    }

    #[must_use]
    pub fn all_of(&self) -> Option<Vec<Schema>> {
        self.applicator_list("allOf")
    }

    #[must_use]
    pub fn any_of(&self) -> Option<Vec<Schema>> {
        self.applicator_list("anyOf")
    }

    #[must_use]
    pub fn one_of(&self) -> Option<Vec<Schema>> {
        self.applicator_list("oneOf")
    }

    #[must_use]
    pub fn not(&self) -> Option<Schema> {
        self.applicator("not")
    }

    #[must_use]
    pub fn if_(&self) -> Option<Schema> {
        self.conditional("if")
    }

    #[must_use]
    pub fn then_(&self) -> Option<Schema> {
        self.conditional("then")
    }

    #[must_use]
    pub fn else_(&self) -> Option<Schema> {
        self.conditional("else")
    }

    fn conditional(&self, keyword: &str) -> Option<Schema> {
        if self.draft().supports_conditionals() {
            self.applicator(keyword)
        } else {
            None
        }
    }

    /// Every `not` of a merged view. Merged views are conjunctions, so all of them apply even
    /// though [`Schema::not`] follows the `other`-only rule.
    #[must_use]
    pub fn negations(&self) -> Vec<Schema> {
        match self {
            Schema::Node(node) => node.child("not").map(Schema::Node).into_iter().collect(),
            Schema::Merged(merged) => {
                let mut found = merged.base.negations();
                for negation in merged.other.negations() {
                    if !found.contains(&negation) {
                        found.push(negation);
                    }
                }
                found
            }
            Schema::Restricted(restricted) => restricted.inner.negations(),
        }
    }

    /// Combinator families present on this view.
    #[must_use]
    pub fn combinators(&self) -> Applicators {
        let mut found = Applicators::NONE;
        if self.all_of().is_some() {
            found = found.union(Applicators::ALL_OF);
        }
        if self.any_of().is_some() {
            found = found.union(Applicators::ANY_OF);
        }
        if self.one_of().is_some() {
            found = found.union(Applicators::ONE_OF);
        }
        if self.if_().is_some() {
            found = found.union(Applicators::CONDITIONAL);
        }
        found
    }

    /// The node whose `$ref` and dynamic references apply to this view, if it has any.
    #[must_use]
    pub fn reference_owner(&self) -> Option<&SchemaNode> {
        match self {
            Schema::Node(node) => {
                let dynamic = node.draft().dynamic_ref_keyword();
                (node.has_keyword("$ref") || dynamic.is_some_and(|kw| node.has_keyword(kw)))
                    .then_some(node)
            }
            Schema::Merged(merged) => match &merged.ref_target {
                Some(target) => target.reference_owner(),
                None => merged
                    .other
                    .reference_owner()
                    .or_else(|| merged.base.reference_owner()),
            },
            Schema::Restricted(restricted) => {
                if restricted.hidden.contains(Applicators::REF) {
                    None
                } else {
                    restricted.inner.reference_owner()
                }
            }
        }
    }
}

impl KeywordLookup for Schema {
    fn has_keyword(&self, keyword: &str) -> bool {
        if keyword == "not" {
            return !self.negations().is_empty();
        }
        self.get_value(keyword).is_some()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Node(node) => fmt::Debug::fmt(node, f),
            Schema::Merged(merged) => f
                .debug_struct("Merged")
                .field("base", &merged.base)
                .field("other", &merged.other)
                .field("ref_target", &merged.ref_target)
                .finish(),
            Schema::Restricted(restricted) => f
                .debug_struct("Restricted")
                .field("inner", &restricted.inner)
                .field("hidden", &restricted.hidden)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_referencing::{JsonType, RootSchema};
    use serde_json::json;

    fn schema(document: Value) -> Schema {
        let root = RootSchema::new("https://example.com/schema.json", document).expect("valid uri");
        Schema::Node(root.node().expect("schema"))
    }

    #[test]
    fn items_by_draft() {
        let legacy = schema(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "items": [{"type": "string"}],
            "additionalItems": false
        }));
        assert_eq!(legacy.prefix_items().len(), 1);
        assert_eq!(legacy.rest_items().and_then(|s| s.as_bool()), Some(false));
        assert!(!legacy.additional_items_allowed());

        let modern = schema(json!({
            "prefixItems": [{"type": "string"}, {"type": "number"}],
            "items": {"type": "null"}
        }));
        assert_eq!(modern.prefix_items().len(), 2);
        assert_eq!(
            modern.rest_items().and_then(|s| s.types()),
            Some(JsonTypeSet::empty().insert(JsonType::Null))
        );
    }

    #[test]
    fn restricted_hides_applicators() {
        let original = schema(json!({
            "$ref": "#/$defs/a",
            "anyOf": [{}],
            "oneOf": [{}],
            "minLength": 1,
            "$defs": {"a": {}}
        }));
        let restricted = original.restrict(Applicators::ANY_OF.union(Applicators::REF));
        assert!(restricted.any_of().is_none());
        assert!(restricted.one_of().is_some());
        assert!(restricted.reference_owner().is_none());
        assert!(!restricted.has_keyword("$ref"));
        assert_eq!(restricted.get_u64("minLength"), Some(1));
        assert_eq!(restricted.combinators(), Applicators::ONE_OF);
    }

    #[test]
    fn legacy_dependencies_split_by_shape() {
        let node = schema(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "dependencies": {"a": ["b"], "c": {"required": ["d"]}}
        }));
        assert_eq!(node.dependent_required(), vec![("a".to_string(), vec!["b".to_string()])]);
        let schemas = node.dependent_schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].0, "c");
    }

    #[test]
    fn deprecation_notice() {
        assert_eq!(
            schema(json!({"deprecated": true})).deprecation().as_deref(),
            Some("Property is deprecated")
        );
        assert_eq!(
            schema(json!({"deprecationMessage": "use b"})).deprecation().as_deref(),
            Some("use b")
        );
        assert!(schema(json!({})).deprecation().is_none());
    }

    #[test]
    fn draft4_has_no_const_or_conditionals() {
        let node = schema(json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "const": 1,
            "if": {}
        }));
        assert!(node.const_value().is_none());
        assert!(node.if_().is_none());
    }
}
