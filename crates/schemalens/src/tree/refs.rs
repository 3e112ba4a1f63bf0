use ahash::AHashSet;
use schemalens_referencing::{
    resolver::{self, enter_scope},
    RefSiblings, Reference, ResolveContext, SchemaNode, SchemaRegistry, Scopes,
};

use crate::{
    merge::merge,
    schema::{Applicators, Schema},
};

/// Outcome of inlining the references of one schema view.
#[derive(Debug)]
pub(super) enum Inlined {
    /// Keep expanding this schema instead.
    Replaced(Schema, Scopes),
    /// Expand these parts as an `allOf`. They are already marked as visited.
    Split(Vec<(Schema, Scopes)>),
    /// Nothing to inline: every reference is unresolved or already visited.
    Dropped(Schema),
}

/// Inline the references owned by `owner` into `schema`.
///
/// Targets already expanded on the current path are skipped, which is what makes cyclic
/// schemas terminate.
pub(super) fn inline(
    schema: &Schema,
    owner: &SchemaNode,
    scopes: &Scopes,
    registry: &SchemaRegistry,
    visited: &mut AHashSet<SchemaNode>,
) -> Inlined {
    let own = schema.restrict(Applicators::REF);
    let scopes = enter_scope(scopes, owner);
    let ctx = ResolveContext::new(registry, &scopes);
    let mut targets = Vec::new();
    for reference in Reference::all_of(owner) {
        let Some(target) = resolver::resolve(reference, owner, &ctx) else {
            continue;
        };
        if visited.insert(target.clone()) {
            targets.push(target);
        } else {
            tracing::trace!(
                reference = reference.value,
                target = target.pointer(),
                "Skipping already visited reference target"
            );
        }
    }
    match targets.len() {
        0 => Inlined::Dropped(own),
        1 => {
            let target = targets.remove(0);
            let target_scopes = enter_scope(&scopes, &target);
            let target = Schema::Node(target);
            match owner.draft().ref_siblings() {
                RefSiblings::Ignore => Inlined::Replaced(target, target_scopes),
                RefSiblings::Merge => {
                    let own_combinators = !own.combinators().is_empty();
                    let target_combinators = !target.combinators().is_empty();
                    if own_combinators && target_combinators {
                        Inlined::Split(vec![(own, scopes), (target, target_scopes)])
                    } else if own_combinators {
                        Inlined::Replaced(merge(&target, &own, Some(&target)), target_scopes)
                    } else {
                        Inlined::Replaced(merge(&own, &target, Some(&target)), target_scopes)
                    }
                }
            }
        }
        _ => {
            let mut parts = Vec::with_capacity(targets.len() + 1);
            if owner.draft().ref_siblings() == RefSiblings::Merge {
                parts.push((own, scopes.clone()));
            }
            for target in targets {
                let target_scopes = enter_scope(&scopes, &target);
                parts.push((Schema::Node(target), target_scopes));
            }
            Inlined::Split(parts)
        }
    }
}
