use core::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Primitive JSON types as used by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl JsonType {
    const ALL: [JsonType; 7] = [
        JsonType::Array,
        JsonType::Boolean,
        JsonType::Integer,
        JsonType::Null,
        JsonType::Number,
        JsonType::Object,
        JsonType::String,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            JsonType::Array => "array",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Null => "null",
            JsonType::Number => "number",
            JsonType::Object => "object",
            JsonType::String => "string",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            JsonType::Array => 1,
            JsonType::Boolean => 1 << 1,
            JsonType::Integer => 1 << 2,
            JsonType::Null => 1 << 3,
            JsonType::Number => 1 << 4,
            JsonType::Object => 1 << 5,
            JsonType::String => 1 << 6,
        }
    }

    /// Whether an instance of type `self` satisfies a declared type `expected`.
    #[must_use]
    pub fn satisfies(self, expected: JsonType) -> bool {
        self == expected || (self == JsonType::Integer && expected == JsonType::Number)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JsonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" => Ok(JsonType::Array),
            "boolean" => Ok(JsonType::Boolean),
            "integer" => Ok(JsonType::Integer),
            "null" => Ok(JsonType::Null),
            "number" => Ok(JsonType::Number),
            "object" => Ok(JsonType::Object),
            "string" => Ok(JsonType::String),
            _ => Err(()),
        }
    }
}

impl From<&Value> for JsonType {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(n) if n.is_u64() || n.is_i64() => JsonType::Integer,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }
}

/// A compact set of [`JsonType`] values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JsonTypeSet(u8);

impl JsonTypeSet {
    #[must_use]
    pub const fn empty() -> Self {
        JsonTypeSet(0)
    }

    #[must_use]
    pub const fn all() -> Self {
        JsonTypeSet(0b111_1111)
    }

    #[must_use]
    pub const fn insert(mut self, ty: JsonType) -> Self {
        self.0 |= ty.bit();
        self
    }

    #[must_use]
    pub const fn contains(self, ty: JsonType) -> bool {
        self.0 & ty.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether an instance of type `ty` is accepted by any type in this set.
    #[must_use]
    pub fn accepts(self, ty: JsonType) -> bool {
        self.iter().any(|expected| ty.satisfies(expected))
    }

    /// Intersect two declared type sets, treating `integer` as a subtype of `number`.
    #[must_use]
    pub fn intersect(self, other: JsonTypeSet) -> JsonTypeSet {
        let mut result = JsonTypeSet(self.0 & other.0);
        if self.contains(JsonType::Number) && other.contains(JsonType::Integer)
            || self.contains(JsonType::Integer) && other.contains(JsonType::Number)
        {
            result = result.insert(JsonType::Integer);
        }
        result
    }

    pub fn iter(self) -> impl Iterator<Item = JsonType> {
        JsonType::ALL.into_iter().filter(move |ty| self.contains(*ty))
    }

    /// Parse the value of a `type` keyword. Unknown type names are ignored.
    #[must_use]
    pub fn from_keyword(value: &Value) -> Option<JsonTypeSet> {
        match value {
            Value::String(name) => name.parse().ok().map(|ty| JsonTypeSet::empty().insert(ty)),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|name| name.parse().ok())
                    .fold(JsonTypeSet::empty(), JsonTypeSet::insert),
            ),
            _ => None,
        }
    }
}

impl fmt::Debug for JsonTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<JsonType> for JsonTypeSet {
    fn from_iter<T: IntoIterator<Item = JsonType>>(iter: T) -> Self {
        iter.into_iter().fold(JsonTypeSet::empty(), JsonTypeSet::insert)
    }
}
