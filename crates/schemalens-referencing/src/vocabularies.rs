use serde_json::Value;

/// A keyword vocabulary declared through `$vocabulary`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    Metadata,
    Format,
    FormatAnnotation,
    FormatAssertion,
    Content,
    Custom(Box<str>),
}

const KNOWN: &[(&str, Vocabulary)] = &[
    ("https://json-schema.org/draft/2020-12/vocab/core", Vocabulary::Core),
    ("https://json-schema.org/draft/2020-12/vocab/applicator", Vocabulary::Applicator),
    ("https://json-schema.org/draft/2020-12/vocab/unevaluated", Vocabulary::Unevaluated),
    ("https://json-schema.org/draft/2020-12/vocab/validation", Vocabulary::Validation),
    ("https://json-schema.org/draft/2020-12/vocab/meta-data", Vocabulary::Metadata),
    ("https://json-schema.org/draft/2020-12/vocab/format-annotation", Vocabulary::FormatAnnotation),
    ("https://json-schema.org/draft/2020-12/vocab/format-assertion", Vocabulary::FormatAssertion),
    ("https://json-schema.org/draft/2020-12/vocab/content", Vocabulary::Content),
    ("https://json-schema.org/draft/2019-09/vocab/core", Vocabulary::Core),
    ("https://json-schema.org/draft/2019-09/vocab/applicator", Vocabulary::Applicator),
    ("https://json-schema.org/draft/2019-09/vocab/validation", Vocabulary::Validation),
    ("https://json-schema.org/draft/2019-09/vocab/meta-data", Vocabulary::Metadata),
    ("https://json-schema.org/draft/2019-09/vocab/format", Vocabulary::Format),
    ("https://json-schema.org/draft/2019-09/vocab/content", Vocabulary::Content),
];

impl Vocabulary {
    #[must_use]
    pub fn from_uri(uri: &str) -> Vocabulary {
        KNOWN
            .iter()
            .find(|(known, _)| *known == uri)
            .map_or_else(|| Vocabulary::Custom(uri.into()), |(_, vocabulary)| vocabulary.clone())
    }

    /// URI of the meta-schema describing a vocabulary URI, e.g. `.../vocab/core` → `.../meta/core`.
    #[must_use]
    pub fn meta_schema_for(uri: &str) -> Option<String> {
        let (prefix, name) = uri.rsplit_once("/vocab/")?;
        Some(format!("{prefix}/meta/{name}"))
    }

    const fn bit(&self) -> Option<u16> {
        match self {
            Vocabulary::Core => Some(1),
            Vocabulary::Applicator => Some(1 << 1),
            Vocabulary::Unevaluated => Some(1 << 2),
            Vocabulary::Validation => Some(1 << 3),
            Vocabulary::Metadata => Some(1 << 4),
            Vocabulary::Format => Some(1 << 5),
            Vocabulary::FormatAnnotation => Some(1 << 6),
            Vocabulary::FormatAssertion => Some(1 << 7),
            Vocabulary::Content => Some(1 << 8),
            Vocabulary::Custom(_) => None,
        }
    }
}

/// A set of active vocabularies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularySet {
    known: u16,
    custom: Vec<Box<str>>,
}

impl VocabularySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known vocabulary, used by dialects that predate `$vocabulary`.
    #[must_use]
    pub fn all() -> Self {
        VocabularySet {
            known: 0x1FF,
            custom: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_known(vocabularies: &[Vocabulary]) -> Self {
        let mut set = VocabularySet::new();
        for vocabulary in vocabularies {
            set.add(vocabulary.clone());
        }
        set
    }

    /// Parse a `$vocabulary` object. Both required (`true`) and optional (`false`) entries count
    /// as active since this implementation understands every known vocabulary.
    #[must_use]
    pub fn from_declaration(value: &Value) -> Option<Self> {
        let declared = value.as_object()?;
        let mut set = VocabularySet::new();
        for uri in declared.keys() {
            set.add(Vocabulary::from_uri(uri));
        }
        Some(set)
    }

    pub fn add(&mut self, vocabulary: Vocabulary) {
        match vocabulary.bit() {
            Some(bit) => self.known |= bit,
            None => {
                if let Vocabulary::Custom(uri) = vocabulary {
                    if !self.custom.contains(&uri) {
                        self.custom.push(uri);
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn contains(&self, vocabulary: Vocabulary) -> bool {
        match (vocabulary.bit(), vocabulary) {
            (Some(bit), _) => self.known & bit != 0,
            (None, Vocabulary::Custom(uri)) => self.custom.contains(&uri),
            (None, _) => false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known == 0 && self.custom.is_empty()
    }

    /// Custom vocabulary URIs, in declaration order.
    pub fn custom(&self) -> impl Iterator<Item = &str> {
        self.custom.iter().map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declaration() {
        let set = VocabularySet::from_declaration(&json!({
            "https://json-schema.org/draft/2020-12/vocab/core": true,
            "https://json-schema.org/draft/2020-12/vocab/applicator": true,
            "https://example.com/vocab/custom": false
        }))
        .expect("object");
        assert!(set.contains(Vocabulary::Core));
        assert!(set.contains(Vocabulary::Applicator));
        assert!(!set.contains(Vocabulary::Validation));
        assert!(set.contains(Vocabulary::Custom("https://example.com/vocab/custom".into())));
        assert_eq!(set.custom().count(), 1);
    }

    #[test]
    fn meta_schema_uri() {
        assert_eq!(
            Vocabulary::meta_schema_for("https://json-schema.org/draft/2020-12/vocab/validation")
                .as_deref(),
            Some("https://json-schema.org/draft/2020-12/meta/validation")
        );
        assert_eq!(Vocabulary::meta_schema_for("https://example.com/x"), None);
    }
}
