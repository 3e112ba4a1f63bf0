//! Validation output and setup errors.
use core::fmt;

use schemalens_referencing::{JsonType, JsonTypeSet};

use crate::instance::InstanceLocation;

/// Ordering hint for hosts that show only some of the errors. Higher sorts later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    TypeMismatch,
    MissingProperties,
    NotSchema,
    AlwaysLast,
}

/// What a host quick-fix could do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixableIssueKind {
    #[default]
    None,
    MissingProperty,
    MissingOptionalProperty,
    TypeMismatch,
    ProhibitedProperty,
    DuplicateArrayItems,
}

/// Structured payload attached to fixable errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueData {
    MissingProperty { name: String },
    MissingMultipleProps { names: Vec<String> },
    TypeMismatch { expected: JsonTypeSet, actual: JsonType },
    ProhibitedProperty { name: String },
    DuplicateArrayItems { indices: Vec<usize> },
}

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub location: InstanceLocation,
    pub priority: Priority,
    pub fixable_issue_kind: FixableIssueKind,
    pub issue_data: Option<IssueData>,
}

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>, location: &InstanceLocation) -> Self {
        ValidationError {
            message: message.into(),
            location: location.clone(),
            priority: Priority::Medium,
            fixable_issue_kind: FixableIssueKind::None,
            issue_data: None,
        }
    }

    pub(crate) fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub(crate) fn type_mismatch(
        location: &InstanceLocation,
        expected: JsonTypeSet,
        actual: JsonType,
    ) -> Self {
        ValidationError {
            message: format!(
                "Incompatible types. Required: {}. Actual: {actual}.",
                TypeList(expected)
            ),
            location: location.clone(),
            priority: Priority::TypeMismatch,
            fixable_issue_kind: FixableIssueKind::TypeMismatch,
            issue_data: Some(IssueData::TypeMismatch { expected, actual }),
        }
    }

    pub(crate) fn missing_properties(location: &InstanceLocation, names: Vec<String>) -> Self {
        Self::missing(location, names, FixableIssueKind::MissingProperty, "Missing required")
    }

    pub(crate) fn missing_optional_properties(
        location: &InstanceLocation,
        names: Vec<String>,
    ) -> Self {
        Self::missing(
            location,
            names,
            FixableIssueKind::MissingOptionalProperty,
            "Missing optional",
        )
        .with_priority(Priority::Low)
    }

    fn missing(
        location: &InstanceLocation,
        mut names: Vec<String>,
        kind: FixableIssueKind,
        prefix: &str,
    ) -> Self {
        let quoted = names
            .iter()
            .map(|name| format!("'{name}'"))
            .collect::<Vec<_>>()
            .join(", ");
        let (message, issue_data) = if names.len() == 1 {
            (
                format!("{prefix} property {quoted}"),
                IssueData::MissingProperty {
                    name: names.remove(0),
                },
            )
        } else {
            (
                format!("{prefix} properties {quoted}"),
                IssueData::MissingMultipleProps { names },
            )
        };
        ValidationError {
            message,
            location: location.clone(),
            priority: Priority::MissingProperties,
            fixable_issue_kind: kind,
            issue_data: Some(issue_data),
        }
    }

    pub(crate) fn prohibited_property(location: &InstanceLocation, name: &str) -> Self {
        ValidationError {
            message: format!("Property '{name}' is not allowed"),
            location: location.clone(),
            priority: Priority::Medium,
            fixable_issue_kind: FixableIssueKind::ProhibitedProperty,
            issue_data: Some(IssueData::ProhibitedProperty {
                name: name.to_string(),
            }),
        }
    }

    pub(crate) fn duplicate_items(location: &InstanceLocation, indices: Vec<usize>) -> Self {
        ValidationError {
            message: "Array items are not unique".to_string(),
            location: location.clone(),
            priority: Priority::Medium,
            fixable_issue_kind: FixableIssueKind::DuplicateArrayItems,
            issue_data: Some(IssueData::DuplicateArrayItems { indices }),
        }
    }

    /// Only type errors: several of these can be folded into one combined error.
    pub(crate) fn is_type_mismatch(&self) -> bool {
        self.fixable_issue_kind == FixableIssueKind::TypeMismatch
    }

    pub(crate) fn is_missing_property(&self) -> bool {
        matches!(
            self.fixable_issue_kind,
            FixableIssueKind::MissingProperty | FixableIssueKind::MissingOptionalProperty
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}'", self.message, self.location)
    }
}

/// `string`, `string or number`, `string, number or null`.
pub(crate) struct TypeList(pub(crate) JsonTypeSet);

impl fmt::Display for TypeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.0.iter().map(JsonType::as_str).collect();
        match names.split_last() {
            None => f.write_str("nothing"),
            Some((last, [])) => f.write_str(last),
            Some((last, rest)) => write!(f, "{} or {last}", rest.join(", ")),
        }
    }
}

/// Failures while building a [`Validator`](crate::Validator).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Referencing(#[from] schemalens_referencing::Error),
    #[error("Schema must be an object or a boolean, got {0}")]
    InvalidSchema(JsonType),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_list_rendering() {
        let set = JsonTypeSet::empty()
            .insert(JsonType::String)
            .insert(JsonType::Number)
            .insert(JsonType::Null);
        assert_eq!(TypeList(set).to_string(), "null, number or string");
        assert_eq!(
            TypeList(JsonTypeSet::empty().insert(JsonType::Object)).to_string(),
            "object"
        );
    }

    #[test]
    fn missing_properties_payload() {
        let location = InstanceLocation::new("/a");
        let single = ValidationError::missing_properties(&location, vec!["x".into()]);
        assert_eq!(single.message, "Missing required property 'x'");
        assert_eq!(
            single.issue_data,
            Some(IssueData::MissingProperty { name: "x".into() })
        );
        let many = ValidationError::missing_properties(&location, vec!["x".into(), "y".into()]);
        assert_eq!(many.message, "Missing required properties 'x', 'y'");
        assert!(matches!(
            many.issue_data,
            Some(IssueData::MissingMultipleProps { ref names }) if names.len() == 2
        ));
    }

    #[test]
    fn priorities_order() {
        assert!(Priority::Low < Priority::TypeMismatch);
        assert!(Priority::NotSchema < Priority::AlwaysLast);
    }
}
