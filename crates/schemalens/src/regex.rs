//! Compiled `pattern` / `patternProperties` expressions.
//!
//! Patterns are compiled once per validator. Each compiled pattern owns a small memo of match
//! results because editors re-validate the same values over and over.
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use crate::options::PatternEngine;

const MEMO_CAPACITY: usize = 1024;

pub(crate) trait RegexEngine: Sized + Send + Sync {
    type Error: core::fmt::Display;
    fn is_match(&self, text: &str) -> Result<bool, Self::Error>;

    fn pattern(&self) -> &str;
}

impl RegexEngine for fancy_regex::Regex {
    type Error = fancy_regex::Error;

    fn is_match(&self, text: &str) -> Result<bool, Self::Error> {
        fancy_regex::Regex::is_match(self, text)
    }

    fn pattern(&self) -> &str {
        self.as_str()
    }
}

impl RegexEngine for regex::Regex {
    type Error = regex::Error;

    fn is_match(&self, text: &str) -> Result<bool, Self::Error> {
        Ok(regex::Regex::is_match(self, text))
    }

    fn pattern(&self) -> &str {
        self.as_str()
    }
}

/// Matching a literal never fails.
#[derive(Debug)]
pub(crate) struct LiteralMatchError;

impl core::fmt::Display for LiteralMatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("literal match failed")
    }
}

/// [`RegexEngine`] for literal patterns: either `starts_with` (prefix) or `==` (exact).
pub(crate) enum LiteralMatcher {
    Prefix { literal: String, original: String },
    Exact { exact: String, original: String },
}

impl RegexEngine for LiteralMatcher {
    type Error = LiteralMatchError;

    #[inline]
    fn is_match(&self, text: &str) -> Result<bool, Self::Error> {
        match self {
            Self::Prefix { literal, .. } => Ok(text.starts_with(literal.as_str())),
            Self::Exact { exact, .. } => Ok(text == exact.as_str()),
        }
    }

    fn pattern(&self) -> &str {
        match self {
            Self::Prefix { original, .. } | Self::Exact { original, .. } => original.as_str(),
        }
    }
}

/// Literal shapes that skip the regex engine entirely.
#[derive(Debug, PartialEq)]
pub(crate) enum PatternOptimization {
    /// `^prefix`
    Prefix(String),
    /// `^exact$`
    Exact(String),
}

/// Detect `^literal` and `^literal$` patterns.
///
/// Accepts unescaped alphanumeric chars, `-`, `_`, `/` and the escapes `\/`, `\-`, `\_`,
/// `\$`, `\.` in the literal body. A trailing unescaped `$` makes the match exact.
pub(crate) fn analyze_pattern(pattern: &str) -> Option<PatternOptimization> {
    let suffix = pattern.strip_prefix('^')?;
    let mut literal = String::new();
    let mut chars = suffix.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                c @ ('/' | '-' | '_' | '$' | '.') => literal.push(c),
                _ => return None,
            }
        } else if c == '$' {
            if chars.peek().is_none() {
                return Some(PatternOptimization::Exact(literal));
            }
            return None;
        } else if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/') {
            literal.push(c);
        } else {
            return None;
        }
    }
    Some(PatternOptimization::Prefix(literal))
}

enum Matcher {
    Fancy(fancy_regex::Regex),
    Standard(regex::Regex),
    Literal(LiteralMatcher),
}

/// A compiled pattern with its match memo.
pub(crate) struct Pattern {
    matcher: Matcher,
    memo: Mutex<AHashMap<Box<str>, bool>>,
}

impl Pattern {
    fn compile(pattern: &str, engine: PatternEngine) -> Result<Pattern, String> {
        let matcher = match analyze_pattern(pattern) {
            Some(PatternOptimization::Prefix(literal)) => Matcher::Literal(LiteralMatcher::Prefix {
                literal,
                original: pattern.to_string(),
            }),
            Some(PatternOptimization::Exact(exact)) => Matcher::Literal(LiteralMatcher::Exact {
                exact,
                original: pattern.to_string(),
            }),
            None => match engine {
                PatternEngine::FancyRegex => fancy_regex::Regex::new(pattern)
                    .map(Matcher::Fancy)
                    .map_err(|error| error.to_string())?,
                PatternEngine::Regex => regex::Regex::new(pattern)
                    .map(Matcher::Standard)
                    .map_err(|error| error.to_string())?,
            },
        };
        Ok(Pattern {
            matcher,
            memo: Mutex::new(AHashMap::new()),
        })
    }

    pub(crate) fn as_str(&self) -> &str {
        match &self.matcher {
            Matcher::Fancy(regex) => regex.pattern(),
            Matcher::Standard(regex) => regex.pattern(),
            Matcher::Literal(literal) => literal.pattern(),
        }
    }

    /// Whether `text` matches. Engine failures, such as exceeding the backtrack limit, count
    /// as a match so that they never produce spurious errors.
    pub(crate) fn is_match(&self, text: &str) -> bool {
        if let Matcher::Literal(literal) = &self.matcher {
            return literal.is_match(text).unwrap_or(true);
        }
        if let Some(&cached) = self.memo.lock().get(text) {
            return cached;
        }
        let result = match &self.matcher {
            Matcher::Fancy(regex) => run(regex, text),
            Matcher::Standard(regex) => run(regex, text),
            Matcher::Literal(literal) => run(literal, text),
        };
        let mut memo = self.memo.lock();
        if memo.len() >= MEMO_CAPACITY {
            memo.clear();
        }
        memo.insert(text.into(), result);
        result
    }
}

fn run<E: RegexEngine>(engine: &E, text: &str) -> bool {
    match engine.is_match(text) {
        Ok(result) => result,
        Err(error) => {
            tracing::debug!(pattern = engine.pattern(), %error, "Pattern evaluation failed");
            true
        }
    }
}

/// Compiled patterns of one validator, keyed by source text.
pub(crate) struct PatternCache {
    engine: PatternEngine,
    patterns: RwLock<AHashMap<String, Result<Arc<Pattern>, Arc<str>>>>,
}

impl PatternCache {
    pub(crate) fn new(engine: PatternEngine) -> Self {
        PatternCache {
            engine,
            patterns: RwLock::new(AHashMap::new()),
        }
    }

    /// The compiled pattern, or the syntax error message.
    pub(crate) fn get(&self, pattern: &str) -> Result<Arc<Pattern>, Arc<str>> {
        if let Some(compiled) = self.patterns.read().get(pattern) {
            return compiled.clone();
        }
        let compiled = Pattern::compile(pattern, self.engine)
            .map(Arc::new)
            .map_err(|error| {
                tracing::debug!(pattern, %error, "Invalid pattern");
                Arc::<str>::from(error)
            });
        self.patterns
            .write()
            .entry(pattern.to_string())
            .or_insert(compiled)
            .clone()
    }

    /// Whether `text` matches `pattern`; invalid patterns never match.
    pub(crate) fn matches(&self, pattern: &str, text: &str) -> bool {
        self.get(pattern).is_ok_and(|compiled| compiled.is_match(text))
    }
}

impl core::fmt::Debug for PatternCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PatternCache")
            .field("engine", &self.engine)
            .field("patterns", &self.patterns.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("^foo", Some(PatternOptimization::Prefix("foo".into())))]
    #[test_case("^foo$", Some(PatternOptimization::Exact("foo".into())))]
    #[test_case("^\\/api", Some(PatternOptimization::Prefix("/api".into())))]
    #[test_case("^a.b", None)]
    #[test_case("foo", None)]
    #[test_case("^a$b", None)]
    fn literal_analysis(pattern: &str, expected: Option<PatternOptimization>) {
        assert_eq!(analyze_pattern(pattern), expected);
    }

    #[test_case(PatternEngine::FancyRegex)]
    #[test_case(PatternEngine::Regex)]
    fn matching(engine: PatternEngine) {
        let cache = PatternCache::new(engine);
        assert!(cache.matches("^[a-z]+\\d$", "abc1"));
        assert!(!cache.matches("^[a-z]+\\d$", "abc"));
        assert!(cache.matches("^x-", "x-custom"));
        assert!(!cache.matches("(", "anything"));
        assert!(cache.get("(").is_err());
    }

    #[test]
    fn memo_is_bounded() {
        let cache = PatternCache::new(PatternEngine::FancyRegex);
        let pattern = cache.get("[0-9]+").expect("valid pattern");
        for idx in 0..(MEMO_CAPACITY + 10) {
            assert!(pattern.is_match(&idx.to_string()));
        }
        assert!(pattern.memo.lock().len() <= MEMO_CAPACITY);
        assert_eq!(pattern.as_str(), "[0-9]+");
    }

    #[test]
    fn lookaround_needs_fancy_regex() {
        assert!(PatternCache::new(PatternEngine::FancyRegex)
            .get("^(?!x)")
            .is_ok());
        assert!(PatternCache::new(PatternEngine::Regex).get("^(?!x)").is_err());
    }
}
