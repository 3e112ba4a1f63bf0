use super::SubschemaKeywords;

pub(super) const KEYWORDS: SubschemaKeywords = SubschemaKeywords {
    in_value: &[
        "contains",
        "else",
        "if",
        "not",
        "propertyNames",
        "then",
    ],
    in_array: &["allOf", "anyOf", "oneOf"],
    in_map: &["definitions", "patternProperties", "properties"],
    in_value_or_array: &["items", "additionalItems", "additionalProperties"],
    in_map_if_schema: &["dependencies"],
};
