use super::SubschemaKeywords;

pub(super) const KEYWORDS: SubschemaKeywords = SubschemaKeywords {
    in_value: &[
        "additionalItems",
        "additionalProperties",
        "contains",
        "contentSchema",
        "else",
        "if",
        "not",
        "propertyNames",
        "then",
        "unevaluatedItems",
        "unevaluatedProperties",
    ],
    in_array: &["allOf", "anyOf", "oneOf"],
    in_map: &[
        "$defs",
        "definitions",
        "dependentSchemas",
        "patternProperties",
        "properties",
    ],
    in_value_or_array: &["items"],
    in_map_if_schema: &[],
};
