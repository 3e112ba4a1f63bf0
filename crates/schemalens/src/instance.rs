//! Instance value adapter.
//!
//! Hosts translate their own syntax trees into [`InstanceNode`]s. The engine never looks at
//! concrete syntax; it only needs values, property names and opaque locations.
use core::fmt;
use std::sync::Arc;

use schemalens_referencing::{pointer, Draft, JsonType};
use serde_json::{Map, Number, Value};

/// Opaque position of an instance value, reported back in errors.
///
/// [`InstanceNode::from_json`] uses JSON pointers; other hosts may store any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InstanceLocation(Arc<str>);

impl InstanceLocation {
    #[must_use]
    pub fn new(location: &str) -> Self {
        InstanceLocation(Arc::from(location))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceLocation {
    fn from(value: &str) -> Self {
        InstanceLocation::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Null,
}

/// A property of an object instance. `value` is `None` while the host is editing it.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceProperty {
    pub name: String,
    pub value: Option<InstanceNode>,
    pub location: InstanceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstanceValue {
    Object(Vec<InstanceProperty>),
    Array(Vec<InstanceNode>),
    /// `text` is the literal as written: strings keep their quotes.
    Scalar { kind: ScalarKind, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceNode {
    pub value: InstanceValue,
    pub location: InstanceLocation,
}

impl InstanceNode {
    #[must_use]
    pub fn new(value: InstanceValue, location: InstanceLocation) -> Self {
        InstanceNode { value, location }
    }

    /// A string literal built from its unquoted content.
    #[must_use]
    pub fn string(content: &str, location: InstanceLocation) -> Self {
        InstanceNode::new(
            InstanceValue::Scalar {
                kind: ScalarKind::String,
                text: Value::String(content.to_string()).to_string(),
            },
            location,
        )
    }

    /// Convert a `serde_json` value. Locations are JSON pointers into `value`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        Self::from_json_at(value, "")
    }

    fn from_json_at(value: &Value, location: &str) -> Self {
        let instance = match value {
            Value::Object(object) => InstanceValue::Object(
                object
                    .iter()
                    .map(|(name, value)| {
                        let location = pointer::join(location, name.as_str());
                        InstanceProperty {
                            name: name.clone(),
                            value: Some(Self::from_json_at(value, &location)),
                            location: InstanceLocation::new(&location),
                        }
                    })
                    .collect(),
            ),
            Value::Array(items) => InstanceValue::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| Self::from_json_at(item, &pointer::join(location, idx)))
                    .collect(),
            ),
            Value::String(_) => scalar(ScalarKind::String, value.to_string()),
            Value::Number(number) => scalar(ScalarKind::Number, number.to_string()),
            Value::Bool(flag) => scalar(ScalarKind::Boolean, flag.to_string()),
            Value::Null => scalar(ScalarKind::Null, "null".to_string()),
        };
        InstanceNode::new(instance, InstanceLocation::new(location))
    }

    /// Convert back to a `serde_json` value. Properties without a value are skipped and
    /// malformed literals become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match &self.value {
            InstanceValue::Object(properties) => Value::Object(
                properties
                    .iter()
                    .filter_map(|property| {
                        property
                            .value
                            .as_ref()
                            .map(|value| (property.name.clone(), value.to_json()))
                    })
                    .collect::<Map<_, _>>(),
            ),
            InstanceValue::Array(items) => {
                Value::Array(items.iter().map(InstanceNode::to_json).collect())
            }
            InstanceValue::Scalar { .. } => serde_json::from_str(self.text()).unwrap_or(Value::Null),
        }
    }

    #[must_use]
    pub fn location(&self) -> &InstanceLocation {
        &self.location
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self.value, InstanceValue::Object(_))
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.value, InstanceValue::Array(_))
    }

    #[must_use]
    pub fn is_string_literal(&self) -> bool {
        self.scalar_kind() == Some(ScalarKind::String)
    }

    #[must_use]
    pub fn is_number_literal(&self) -> bool {
        self.scalar_kind() == Some(ScalarKind::Number)
    }

    #[must_use]
    pub fn is_boolean_literal(&self) -> bool {
        self.scalar_kind() == Some(ScalarKind::Boolean)
    }

    #[must_use]
    pub fn is_null_literal(&self) -> bool {
        self.scalar_kind() == Some(ScalarKind::Null)
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&[InstanceProperty]> {
        match &self.value {
            InstanceValue::Object(properties) => Some(properties),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[InstanceNode]> {
        match &self.value {
            InstanceValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Value of the first property named `name`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&InstanceNode> {
        self.as_object()?
            .iter()
            .find(|property| property.name == name)
            .and_then(|property| property.value.as_ref())
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.as_object()
            .is_some_and(|properties| properties.iter().any(|property| property.name == name))
    }

    fn scalar_kind(&self) -> Option<ScalarKind> {
        match &self.value {
            InstanceValue::Scalar { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Literal text of a scalar; empty for containers.
    #[must_use]
    pub fn text(&self) -> &str {
        match &self.value {
            InstanceValue::Scalar { text, .. } => text,
            _ => "",
        }
    }

    /// Unquoted content of a string literal.
    #[must_use]
    pub fn string_value(&self) -> Option<String> {
        if !self.is_string_literal() {
            return None;
        }
        let text = self.text();
        match serde_json::from_str::<String>(text) {
            Ok(value) => Some(value),
            Err(_) => Some(
                text.strip_prefix('"')
                    .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
                    .unwrap_or(text)
                    .to_string(),
            ),
        }
    }

    #[must_use]
    pub fn number(&self) -> Option<Number> {
        if self.is_number_literal() {
            serde_json::from_str(self.text()).ok()
        } else {
            None
        }
    }

    #[must_use]
    pub fn boolean(&self) -> Option<bool> {
        if self.is_boolean_literal() {
            self.text().parse().ok()
        } else {
            None
        }
    }

    /// The JSON type of this value as seen by `draft`.
    ///
    /// Numbers with a zero fractional part are integers, except in Draft 4 where only
    /// literals without a fraction or exponent are.
    #[must_use]
    pub fn json_type(&self, draft: Draft) -> JsonType {
        match &self.value {
            InstanceValue::Object(_) => JsonType::Object,
            InstanceValue::Array(_) => JsonType::Array,
            InstanceValue::Scalar { kind, text } => match kind {
                ScalarKind::String => JsonType::String,
                ScalarKind::Boolean => JsonType::Boolean,
                ScalarKind::Null => JsonType::Null,
                ScalarKind::Number => {
                    if is_integer(text, draft) {
                        JsonType::Integer
                    } else {
                        JsonType::Number
                    }
                }
            },
        }
    }
}

fn scalar(kind: ScalarKind, text: String) -> InstanceValue {
    InstanceValue::Scalar { kind, text }
}

fn is_integer(text: &str, draft: Draft) -> bool {
    let plain = !text.contains(['.', 'e', 'E']);
    if plain {
        return true;
    }
    draft.integer_valued_numbers()
        && text
            .parse::<f64>()
            .is_ok_and(|value| value.is_finite() && value.fract() == 0.0)
}
