use thiserror::Error;

/// Errors raised while loading schema documents or resolving their URIs.
///
/// Unresolvable references are not errors: resolvers return `None` and the caller decides
/// whether a missing target matters.
#[derive(Debug, Error)]
pub enum Error {
    /// A base URI or `$id` could not be parsed.
    #[error("Invalid URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    /// A reference could not be joined with its base URI.
    #[error("Invalid reference '{reference}' against base '{base}': {source}")]
    InvalidReference {
        base: String,
        reference: String,
        #[source]
        source: url::ParseError,
    },
    /// The schema service reported a failure for a document.
    #[error("Failed to fetch schema document '{uri}': {message}")]
    Fetch { uri: String, message: String },
}

impl Error {
    pub(crate) fn invalid_uri(uri: impl Into<String>, source: url::ParseError) -> Error {
        Error::InvalidUri {
            uri: uri.into(),
            source,
        }
    }

    pub(crate) fn invalid_reference(
        base: &url::Url,
        reference: impl Into<String>,
        source: url::ParseError,
    ) -> Error {
        Error::InvalidReference {
            base: base.to_string(),
            reference: reference.into(),
            source,
        }
    }

    pub(crate) fn fetch(uri: impl Into<String>, message: impl Into<String>) -> Error {
        Error::Fetch {
            uri: uri.into(),
            message: message.into(),
        }
    }
}
