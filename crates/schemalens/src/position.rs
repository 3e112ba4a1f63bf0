//! Schemas applicable at a position inside an instance.
//!
//! Used for completion and hover, where there is no complete instance to check `if` against:
//! every expansion here is lenient and keeps both conditional branches.
use core::fmt;

use schemalens_referencing::{resolver::enter_scope, SchemaRegistry};

use crate::{
    merge::merge,
    options::PatternEngine,
    regex::PatternCache,
    schema::Schema,
    tree::{self, Alternative, IfThenElseMode, TreeContext},
};

/// One step of an instance path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Property(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Property(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Property(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Walk `path` from `entry` and return the expanded variants that apply at its end.
///
/// Variants whose schema says nothing about a step are dropped. An empty result means the
/// position is not described by the schema.
#[must_use]
pub fn resolve_at(
    entry: Alternative,
    path: &[PathSegment],
    registry: &SchemaRegistry,
) -> Vec<Alternative> {
    let ctx = TreeContext::new(registry, IfThenElseMode::Lenient);
    let patterns = PatternCache::new(PatternEngine::default());
    let mut current = expand(entry, &ctx);
    for segment in path {
        let mut next = Vec::new();
        for alternative in &current {
            if let Some(child) = step(&alternative.schema, segment, &patterns) {
                let scopes = enter_scope(&alternative.scopes, child.primary_node());
                next.extend(expand(Alternative::new(child, scopes), &ctx));
            }
        }
        if next.is_empty() {
            tracing::trace!(%segment, "No schema applies at instance path");
        }
        current = next;
    }
    current
}

/// Property names declared by any of `alternatives`, first-seen order.
#[must_use]
pub fn property_names(alternatives: &[Alternative]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for alternative in alternatives {
        for (name, _) in alternative.schema.properties() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn expand(entry: Alternative, ctx: &TreeContext<'_>) -> Vec<Alternative> {
    let resolution = tree::resolve(entry.schema, entry.scopes, ctx);
    let mut found: Vec<Alternative> = Vec::new();
    for alternative in resolution.alternatives() {
        if alternative.schema.is_impossible() {
            continue;
        }
        if !found
            .iter()
            .any(|existing| existing.schema == alternative.schema)
        {
            found.push(alternative.view());
        }
    }
    found
}

/// The schema governing one step below `schema`, all matching keywords conjoined.
fn step(schema: &Schema, segment: &PathSegment, patterns: &PatternCache) -> Option<Schema> {
    let child = match segment {
        PathSegment::Property(name) => {
            let mut applicable: Vec<Schema> = schema.property(name).into_iter().collect();
            applicable.extend(
                schema
                    .pattern_properties()
                    .into_iter()
                    .filter(|(pattern, _)| patterns.matches(pattern, name))
                    .map(|(_, child)| child),
            );
            if applicable.is_empty() {
                let fallback = schema
                    .additional_properties()
                    .or_else(|| schema.unevaluated_properties())?;
                applicable.push(fallback);
            }
            conjoin(applicable)
        }
        PathSegment::Index(index) => schema
            .prefix_items()
            .into_iter()
            .nth(*index)
            .or_else(|| schema.rest_items())
            .or_else(|| schema.unevaluated_items()),
    };
    child.filter(|child| child.as_bool() != Some(false))
}

fn conjoin(schemas: Vec<Schema>) -> Option<Schema> {
    let mut schemas = schemas.into_iter();
    let first = schemas.next()?;
    Some(schemas.fold(first, |acc, schema| merge(&acc, &schema, None)))
}
