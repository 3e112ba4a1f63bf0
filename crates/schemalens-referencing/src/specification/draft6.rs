use super::SubschemaKeywords;

// Draft 6 adds `contains` and `propertyNames` on top of draft 4.
pub(super) const KEYWORDS: SubschemaKeywords = SubschemaKeywords {
    in_value: &["contains", "not", "propertyNames"],
    in_array: &["allOf", "anyOf", "oneOf"],
    in_map: &["definitions", "patternProperties", "properties"],
    in_value_or_array: &["items", "additionalItems", "additionalProperties"],
    in_map_if_schema: &["dependencies"],
};
