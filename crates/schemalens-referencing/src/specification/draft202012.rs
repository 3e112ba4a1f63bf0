use super::SubschemaKeywords;

// `items` is always a single schema here; positional schemas moved to `prefixItems`.
pub(super) const KEYWORDS: SubschemaKeywords = SubschemaKeywords {
    in_value: &[
        "additionalProperties",
        "contains",
        "contentSchema",
        "else",
        "if",
        "items",
        "not",
        "propertyNames",
        "then",
        "unevaluatedItems",
        "unevaluatedProperties",
    ],
    in_array: &["allOf", "anyOf", "oneOf", "prefixItems"],
    in_map: &[
        "$defs",
        "definitions",
        "dependentSchemas",
        "patternProperties",
        "properties",
    ],
    in_value_or_array: &[],
    in_map_if_schema: &[],
};
