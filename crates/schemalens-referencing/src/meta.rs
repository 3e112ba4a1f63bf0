//! Meta-schemas bundled with the crate.
//!
//! They are resolved without consulting the schema service.
use std::sync::LazyLock;

use serde_json::Value;

macro_rules! schema {
    ($vis:vis $name:ident, $path:expr) => {
        $vis static $name: LazyLock<Value> = LazyLock::new(|| {
            serde_json::from_str(include_str!($path)).expect("Invalid bundled meta-schema")
        });
    };
}

schema!(pub DRAFT7, "../metaschemas/draft7.json");
schema!(pub DRAFT201909, "../metaschemas/draft2019-09/schema.json");
schema!(DRAFT201909_CORE, "../metaschemas/draft2019-09/meta/core.json");
schema!(DRAFT201909_APPLICATOR, "../metaschemas/draft2019-09/meta/applicator.json");
schema!(DRAFT201909_VALIDATION, "../metaschemas/draft2019-09/meta/validation.json");
schema!(DRAFT201909_META_DATA, "../metaschemas/draft2019-09/meta/meta-data.json");
schema!(DRAFT201909_FORMAT, "../metaschemas/draft2019-09/meta/format.json");
schema!(DRAFT201909_CONTENT, "../metaschemas/draft2019-09/meta/content.json");
schema!(pub DRAFT202012, "../metaschemas/draft2020-12/schema.json");
schema!(DRAFT202012_CORE, "../metaschemas/draft2020-12/meta/core.json");
schema!(DRAFT202012_APPLICATOR, "../metaschemas/draft2020-12/meta/applicator.json");
schema!(DRAFT202012_UNEVALUATED, "../metaschemas/draft2020-12/meta/unevaluated.json");
schema!(DRAFT202012_VALIDATION, "../metaschemas/draft2020-12/meta/validation.json");
schema!(DRAFT202012_META_DATA, "../metaschemas/draft2020-12/meta/meta-data.json");
schema!(
    DRAFT202012_FORMAT_ANNOTATION,
    "../metaschemas/draft2020-12/meta/format-annotation.json"
);
schema!(DRAFT202012_CONTENT, "../metaschemas/draft2020-12/meta/content.json");

/// Bundled meta-schemas keyed by their canonical URI (without a trailing `#`).
pub static META_SCHEMAS: LazyLock<[(&'static str, &'static Value); 16]> = LazyLock::new(|| {
    [
        ("http://json-schema.org/draft-07/schema", &*DRAFT7),
        ("https://json-schema.org/draft/2019-09/schema", &*DRAFT201909),
        ("https://json-schema.org/draft/2019-09/meta/core", &*DRAFT201909_CORE),
        ("https://json-schema.org/draft/2019-09/meta/applicator", &*DRAFT201909_APPLICATOR),
        ("https://json-schema.org/draft/2019-09/meta/validation", &*DRAFT201909_VALIDATION),
        ("https://json-schema.org/draft/2019-09/meta/meta-data", &*DRAFT201909_META_DATA),
        ("https://json-schema.org/draft/2019-09/meta/format", &*DRAFT201909_FORMAT),
        ("https://json-schema.org/draft/2019-09/meta/content", &*DRAFT201909_CONTENT),
        ("https://json-schema.org/draft/2020-12/schema", &*DRAFT202012),
        ("https://json-schema.org/draft/2020-12/meta/core", &*DRAFT202012_CORE),
        ("https://json-schema.org/draft/2020-12/meta/applicator", &*DRAFT202012_APPLICATOR),
        ("https://json-schema.org/draft/2020-12/meta/unevaluated", &*DRAFT202012_UNEVALUATED),
        ("https://json-schema.org/draft/2020-12/meta/validation", &*DRAFT202012_VALIDATION),
        ("https://json-schema.org/draft/2020-12/meta/meta-data", &*DRAFT202012_META_DATA),
        (
            "https://json-schema.org/draft/2020-12/meta/format-annotation",
            &*DRAFT202012_FORMAT_ANNOTATION,
        ),
        ("https://json-schema.org/draft/2020-12/meta/content", &*DRAFT202012_CONTENT),
    ]
});

/// Look up a bundled meta-schema. `http`/`https` and a trailing empty fragment are ignored.
#[must_use]
pub fn bundled(uri: &str) -> Option<(&'static str, &'static Value)> {
    let uri = uri.trim_end_matches('#');
    let without_scheme = uri
        .strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .unwrap_or(uri);
    META_SCHEMAS.iter().copied().find(|(known, _)| {
        known
            .strip_prefix("https://")
            .or_else(|| known.strip_prefix("http://"))
            .is_some_and(|known| known == without_scheme)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("http://json-schema.org/draft-07/schema#")]
    #[test_case("https://json-schema.org/draft-07/schema")]
    #[test_case("https://json-schema.org/draft/2020-12/meta/validation")]
    #[test_case("https://json-schema.org/draft/2019-09/schema")]
    fn lookup(uri: &str) {
        assert!(bundled(uri).is_some());
    }

    #[test]
    fn all_parse() {
        for (uri, schema) in META_SCHEMAS.iter() {
            assert!(schema.is_object(), "{uri}");
        }
    }

    #[test]
    fn unknown() {
        assert!(bundled("https://example.com/schema").is_none());
    }
}
