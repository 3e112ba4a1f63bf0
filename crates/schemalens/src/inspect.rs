//! Schema and instance inspections that are not validation errors.
use std::collections::VecDeque;

use ahash::AHashSet;
use schemalens_referencing::{
    resolver::{self, enter_scope},
    Reference, ReferenceKind, ResolveContext, RootSchema, SchemaNode, SchemaRegistry, Scopes,
};

use crate::{
    error::{Priority, ValidationError},
    instance::InstanceNode,
    tree::{self, Alternative, IfThenElseMode, TreeContext},
};

/// A reference that does not lead anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Pointer to the schema holding the reference.
    pub pointer: String,
    pub reference: String,
    pub kind: ReferenceKind,
    /// The target document is still being loaded by the host.
    pub pending: bool,
}

/// Every `$ref` of `root` that resolves to nothing, in document order.
///
/// Dynamic references are resolved against the scope of their own resource only, since no
/// evaluation path is known here.
#[must_use]
pub fn unresolved_references(root: &RootSchema, registry: &SchemaRegistry) -> Vec<UnresolvedReference> {
    let Some(start) = root.node() else {
        return Vec::new();
    };
    let mut found = Vec::new();
    let mut seen = AHashSet::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        if !seen.insert(node.clone()) {
            continue;
        }
        check_references(&node, registry, &mut found);
        queue.extend(node.subschemas());
    }
    found
}

fn check_references(node: &SchemaNode, registry: &SchemaRegistry, found: &mut Vec<UnresolvedReference>) {
    let scopes = enter_scope(&Scopes::new(), node);
    let ctx = ResolveContext::new(registry, &scopes);
    for reference in Reference::all_of(node) {
        if resolver::resolve(reference, node, &ctx).is_some() {
            continue;
        }
        let pending = node.base_uri().join(reference.value).is_ok_and(|mut target| {
            target.set_fragment(None);
            registry
                .pending()
                .iter()
                .any(|uri| uri.as_str() == target.as_str())
        });
        found.push(UnresolvedReference {
            pointer: node.pointer().to_string(),
            reference: reference.value.to_string(),
            kind: reference.kind,
            pending,
        });
    }
}

/// Properties of `instance` whose schema is deprecated, at any depth.
#[must_use]
pub fn deprecations(
    instance: &InstanceNode,
    entry: Alternative,
    registry: &SchemaRegistry,
) -> Vec<ValidationError> {
    let ctx = TreeContext::new(registry, IfThenElseMode::Lenient);
    let mut found = Vec::new();
    let mut reported = AHashSet::new();
    collect_deprecations(instance, entry, &ctx, &mut reported, &mut found);
    found
}

fn collect_deprecations(
    instance: &InstanceNode,
    entry: Alternative,
    ctx: &TreeContext<'_>,
    reported: &mut AHashSet<String>,
    found: &mut Vec<ValidationError>,
) {
    let resolution = tree::resolve(entry.schema, entry.scopes, ctx);
    let alternatives: Vec<Alternative> = resolution.alternatives().cloned().collect();
    if let Some(properties) = instance.as_object() {
        for property in properties {
            for alternative in &alternatives {
                let Some(schema) = alternative.schema.property(&property.name) else {
                    continue;
                };
                let child = Alternative::new(
                    schema.clone(),
                    enter_scope(&alternative.scopes, schema.primary_node()),
                );
                let resolved = tree::resolve(child.schema.clone(), child.scopes.clone(), ctx);
                for variant in resolved.alternatives() {
                    let Some(notice) = variant.schema.deprecation() else {
                        continue;
                    };
                    if reported.insert(property.location.as_str().to_string()) {
                        found.push(
                            ValidationError::new(
                                format!("Property '{}' is deprecated: {notice}", property.name),
                                &property.location,
                            )
                            .with_priority(Priority::Low),
                        );
                    }
                }
                if let Some(value) = &property.value {
                    collect_deprecations(value, child, ctx, reported, found);
                }
            }
        }
    } else if let Some(items) = instance.as_array() {
        for alternative in &alternatives {
            let prefix = alternative.schema.prefix_items();
            let rest = alternative.schema.rest_items();
            for (idx, item) in items.iter().enumerate() {
                let Some(schema) = prefix.get(idx).cloned().or_else(|| rest.clone()) else {
                    continue;
                };
                let scopes = enter_scope(&alternative.scopes, schema.primary_node());
                collect_deprecations(item, Alternative::new(schema, scopes), ctx, reported, found);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator_for;
    use schemalens_referencing::InMemorySchemaService;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn lists_dangling_references() {
        let registry = SchemaRegistry::new();
        let root = registry
            .load(
                "https://example.com/root.json",
                json!({
                    "$defs": {"ok": {}},
                    "properties": {
                        "a": {"$ref": "#/$defs/ok"},
                        "b": {"$ref": "#/$defs/missing"}
                    }
                }),
            )
            .expect("valid uri");
        let found = unresolved_references(&root, &registry);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pointer, "/properties/b");
        assert_eq!(found[0].reference, "#/$defs/missing");
        assert!(!found[0].pending);
    }

    #[test]
    fn marks_pending_documents() {
        let service = Arc::new(InMemorySchemaService::new());
        service.mark_pending("https://example.com/other.json");
        let registry = SchemaRegistry::options().service(service).build();
        let root = registry
            .load(
                "https://example.com/root.json",
                json!({"$ref": "other.json#/$defs/a"}),
            )
            .expect("valid uri");
        let found = unresolved_references(&root, &registry);
        assert_eq!(found.len(), 1);
        assert!(found[0].pending);
    }

    #[test]
    fn reports_deprecated_properties() {
        let validator = validator_for(&json!({
            "properties": {
                "old": {"deprecated": true},
                "nested": {"properties": {"legacy": {"deprecationMessage": "use 'modern'"}}}
            }
        }))
        .expect("valid schema");
        let instance = InstanceNode::from_json(&json!({
            "old": 1,
            "nested": {"legacy": true, "modern": true}
        }));
        let found = validator.deprecations(&instance);
        let messages: Vec<_> = found.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Property 'legacy' is deprecated: use 'modern'",
                "Property 'old' is deprecated: Property is deprecated",
            ]
        );
        assert!(found.iter().all(|e| e.priority == Priority::Low));
        assert_eq!(found[0].location.as_str(), "/nested/legacy");
    }
}
