//! JSON Pointer (RFC 6901) helpers.
//!
//! Pointers are stored in their escaped string form (`/definitions/a~1b`). The root pointer is
//! the empty string.
use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde_json::Value;

/// A single segment appended to a JSON pointer.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Segment<'a> {
    /// A string key for object properties.
    Key(Cow<'a, str>),
    /// A numeric index for array elements.
    Index(usize),
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(value: &'a str) -> Self {
        Segment::Key(Cow::Borrowed(value))
    }
}

impl From<String> for Segment<'_> {
    fn from(value: String) -> Self {
        Segment::Key(Cow::Owned(value))
    }
}

impl<'a> From<Cow<'a, str>> for Segment<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Segment::Key(value)
    }
}

impl From<usize> for Segment<'_> {
    fn from(value: usize) -> Self {
        Segment::Index(value)
    }
}

/// Escape a raw key so it can be used as a pointer segment (`~` → `~0`, `/` → `~1`).
#[must_use]
pub fn escape(segment: &str) -> Cow<'_, str> {
    if segment.contains(['~', '/']) {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Unescape a pointer segment (`~1` → `/`, `~0` → `~`).
#[must_use]
pub fn unescape(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        // Order matters: `~01` must become `~1`, not `/`.
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Append one segment to `base`, escaping it first.
#[must_use]
pub fn join<'a>(base: &str, segment: impl Into<Segment<'a>>) -> String {
    let mut buffer = String::with_capacity(base.len() + 8);
    buffer.push_str(base);
    buffer.push('/');
    match segment.into() {
        Segment::Key(key) => buffer.push_str(&escape(&key)),
        Segment::Index(idx) => {
            let mut itoa = itoa::Buffer::new();
            buffer.push_str(itoa.format(idx));
        }
    }
    buffer
}

/// Append several segments to `base`.
#[must_use]
pub fn join_all<'a, I, S>(base: &str, segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<Segment<'a>>,
{
    let mut pointer = base.to_string();
    for segment in segments {
        pointer = join(&pointer, segment);
    }
    pointer
}

/// Normalize a pointer-like reference fragment.
///
/// Accepts `#/a/b`, `/a/b`, `#` and the empty string, decoding URI percent-escapes.
/// Returns `None` when the input is not a pointer (e.g. a plain-name anchor like `#foo`).
#[must_use]
pub fn normalize(reference: &str) -> Option<String> {
    let fragment = reference.strip_prefix('#').unwrap_or(reference);
    let decoded = percent_decode_str(fragment).decode_utf8().ok()?;
    if decoded.is_empty() || decoded.starts_with('/') {
        Some(decoded.into_owned())
    } else {
        None
    }
}

/// Iterate over the unescaped tokens of a normalized pointer.
pub fn tokens(pointer: &str) -> impl Iterator<Item = Cow<'_, str>> {
    pointer
        .strip_prefix('/')
        .map(|rest| rest.split('/'))
        .into_iter()
        .flatten()
        .map(unescape)
}

/// Parent pointer and the last raw (escaped) segment, or `None` for the root.
#[must_use]
pub fn split_last(pointer: &str) -> Option<(&str, &str)> {
    let idx = pointer.rfind('/')?;
    Some((&pointer[..idx], &pointer[idx + 1..]))
}

/// Walk `value` following a normalized pointer.
#[must_use]
pub fn resolve<'v>(value: &'v Value, pointer: &str) -> Option<&'v Value> {
    let mut current = value;
    for token in tokens(pointer) {
        current = match current {
            Value::Object(map) => map.get(token.as_ref())?,
            Value::Array(items) => items.get(parse_index(&token)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Parse an array index token. Leading zeros and signs are rejected per RFC 6901.
#[must_use]
pub fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("a/b", "a~1b")]
    #[test_case("m~n", "m~0n")]
    #[test_case("~/", "~0~1")]
    #[test_case("plain", "plain")]
    fn escaping(raw: &str, escaped: &str) {
        assert_eq!(escape(raw), escaped);
        assert_eq!(unescape(escaped), raw);
    }

    #[test]
    fn unescape_order() {
        assert_eq!(unescape("~01"), "~1");
    }

    #[test_case("#/definitions/a", Some("/definitions/a"))]
    #[test_case("/definitions/a", Some("/definitions/a"))]
    #[test_case("#", Some(""))]
    #[test_case("", Some(""))]
    #[test_case("#/a%20b", Some("/a b"))]
    #[test_case("#foo", None)]
    fn normalization(input: &str, expected: Option<&str>) {
        assert_eq!(normalize(input).as_deref(), expected);
    }

    #[test]
    fn joining() {
        assert_eq!(join("", "properties"), "/properties");
        assert_eq!(join("/properties", "a/b"), "/properties/a~1b");
        assert_eq!(join("/items", 3_usize), "/items/3");
        assert_eq!(join_all("", ["allOf", "x"]), "/allOf/x");
    }

    #[test]
    fn resolving() {
        let document = json!({"a": [{"b~c": 1}], "": {"x": true}});
        assert_eq!(resolve(&document, "/a/0/b~0c"), Some(&json!(1)));
        assert_eq!(resolve(&document, "//x"), Some(&json!(true)));
        assert_eq!(resolve(&document, ""), Some(&document));
        assert_eq!(resolve(&document, "/a/01"), None);
        assert_eq!(resolve(&document, "/missing"), None);
    }

    #[test]
    fn last_segment() {
        assert_eq!(split_last("/a/b"), Some(("/a", "b")));
        assert_eq!(split_last(""), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip(segments in prop::collection::vec("[a-z~/]{0,6}", 0..5)) {
                let pointer = join_all("", segments.iter().map(String::as_str));
                let decoded: Vec<String> = tokens(&pointer).map(Cow::into_owned).collect();
                prop_assert_eq!(&decoded, &segments);
                prop_assert_eq!(normalize(&format!("#{pointer}")), Some(pointer));
            }
        }
    }
}
