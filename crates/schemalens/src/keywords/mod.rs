//! Keyword families run by [`crate::checker::Checker::check`].
//!
//! Each module exposes one `validate` function over a single merged schema view.
use serde_json::Value;

pub(crate) mod array;
pub(crate) mod const_;
pub(crate) mod enum_;
pub(crate) mod not;
pub(crate) mod numeric;
pub(crate) mod object;
pub(crate) mod string;
pub(crate) mod type_;

/// Compact JSON rendering for messages; long values are cut.
pub(crate) fn display(value: &Value) -> String {
    const LIMIT: usize = 60;
    let rendered = value.to_string();
    if rendered.chars().count() <= LIMIT {
        rendered
    } else {
        let cut: String = rendered.chars().take(LIMIT).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::display;
    use serde_json::json;

    #[test]
    fn long_values_are_cut() {
        assert_eq!(display(&json!("a")), "\"a\"");
        let long = display(&json!("x".repeat(100)));
        assert!(long.ends_with("..."));
        assert_eq!(long.chars().count(), 63);
    }
}
