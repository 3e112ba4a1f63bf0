use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

/// JSON equality where numbers compare by value: `1` equals `1.0`.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        (Value::Number(left), Value::Number(right)) => equal_numbers(left, right),
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

pub(crate) fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(l, r)| equal(l, r))
}

pub(crate) fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(key, value)| right.get(key).is_some_and(|other| equal(value, other)))
}

pub(crate) fn equal_numbers(left: &Number, right: &Number) -> bool {
    compare(left, right) == Some(core::cmp::Ordering::Equal)
}

/// Order two JSON numbers without losing precision on large integers.
pub(crate) fn compare(left: &Number, right: &Number) -> Option<core::cmp::Ordering> {
    use core::cmp::Ordering;

    macro_rules! ordering {
        ($l:expr, $r:expr) => {
            if NumCmp::num_lt($l, $r) {
                Some(Ordering::Less)
            } else if NumCmp::num_gt($l, $r) {
                Some(Ordering::Greater)
            } else if NumCmp::num_eq($l, $r) {
                Some(Ordering::Equal)
            } else {
                None
            }
        };
    }

    if let Some(l) = left.as_u64() {
        if let Some(r) = right.as_u64() {
            ordering!(l, r)
        } else if let Some(r) = right.as_i64() {
            ordering!(l, r)
        } else {
            ordering!(l, right.as_f64()?)
        }
    } else if let Some(l) = left.as_i64() {
        if let Some(r) = right.as_u64() {
            ordering!(l, r)
        } else if let Some(r) = right.as_i64() {
            ordering!(l, r)
        } else {
            ordering!(l, right.as_f64()?)
        }
    } else {
        let l = left.as_f64()?;
        if let Some(r) = right.as_u64() {
            ordering!(l, r)
        } else if let Some(r) = right.as_i64() {
            ordering!(l, r)
        } else {
            ordering!(l, right.as_f64()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true)]
    #[test_case(&json!([1, {"a": 2.0}]), &json!([1.0, {"a": 2}]), true)]
    #[test_case(&json!({"a": 1}), &json!({"a": 1, "b": 2}), false)]
    #[test_case(&json!("1"), &json!(1), false)]
    #[test_case(&json!(u64::MAX), &json!(-1), false)]
    fn equality(left: &Value, right: &Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
    }

    #[test]
    fn ordering() {
        use core::cmp::Ordering;
        let n = |value: Value| match value {
            Value::Number(number) => number,
            _ => unreachable!(),
        };
        assert_eq!(compare(&n(json!(-1)), &n(json!(0.5))), Some(Ordering::Less));
        assert_eq!(compare(&n(json!(u64::MAX)), &n(json!(1e3))), Some(Ordering::Greater));
        assert_eq!(compare(&n(json!(3)), &n(json!(3.0))), Some(Ordering::Equal));
    }
}
