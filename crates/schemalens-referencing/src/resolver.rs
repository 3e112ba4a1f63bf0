//! Reference resolution.
//!
//! Each draft lists the resolvers it uses in [`Draft::reference_resolvers`]; they are tried in
//! order and the first hit wins. Failing to resolve is not an error.
use serde_json::Value;
use url::Url;

use crate::{list::List, pointer, Draft, SchemaNode, SchemaRegistry, Vocabulary};

/// Resources entered during evaluation, innermost first.
pub type Scopes = List<SchemaNode>;

/// One strategy for turning a reference string into a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    /// Pointers, anchors and embedded ids within the owner's document.
    Local,
    /// Other documents, loaded through the registry and its schema service.
    Remote,
    /// `$dynamicRef` / `$recursiveRef` resolved against the dynamic scope.
    Dynamic,
    /// Vocabulary and meta-schema URIs served from the bundled meta-schemas.
    Vocabulary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `$ref`
    Static,
    /// `$dynamicRef` or `$recursiveRef`
    Dynamic,
}

/// A reference found in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    pub value: &'a str,
    pub kind: ReferenceKind,
}

impl<'a> Reference<'a> {
    #[must_use]
    pub const fn new(value: &'a str, kind: ReferenceKind) -> Self {
        Reference { value, kind }
    }

    /// The `$ref` of `node`, if any.
    #[must_use]
    pub fn static_of(node: &'a SchemaNode) -> Option<Reference<'a>> {
        node.get_str("$ref")
            .map(|value| Reference::new(value, ReferenceKind::Static))
    }

    /// The dynamic reference of `node`, if its draft has one.
    #[must_use]
    pub fn dynamic_of(node: &'a SchemaNode) -> Option<Reference<'a>> {
        let keyword = node.draft().dynamic_ref_keyword()?;
        node.get_str(keyword)
            .map(|value| Reference::new(value, ReferenceKind::Dynamic))
    }

    /// Every reference of `node`, static first.
    #[must_use]
    pub fn all_of(node: &'a SchemaNode) -> Vec<Reference<'a>> {
        Reference::static_of(node)
            .into_iter()
            .chain(Reference::dynamic_of(node))
            .collect()
    }
}

/// Everything a resolver may consult besides the owning node.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub registry: &'a SchemaRegistry,
    pub scopes: &'a Scopes,
}

impl<'a> ResolveContext<'a> {
    #[must_use]
    pub const fn new(registry: &'a SchemaRegistry, scopes: &'a Scopes) -> Self {
        ResolveContext { registry, scopes }
    }
}

impl ResolverKind {
    /// Resolve `reference` found in `owner`.
    #[must_use]
    pub fn resolve(
        self,
        reference: Reference<'_>,
        owner: &SchemaNode,
        ctx: &ResolveContext<'_>,
    ) -> Option<SchemaNode> {
        match self {
            ResolverKind::Local => resolve_local(reference.value, owner),
            ResolverKind::Remote => resolve_remote(reference.value, owner, ctx.registry),
            ResolverKind::Dynamic => resolve_dynamic(reference, owner, ctx),
            ResolverKind::Vocabulary => resolve_vocabulary(reference.value, owner, ctx.registry),
        }
    }
}

/// Run the owner's resolver chain.
#[must_use]
pub fn resolve(
    reference: Reference<'_>,
    owner: &SchemaNode,
    ctx: &ResolveContext<'_>,
) -> Option<SchemaNode> {
    let resolved = owner
        .draft()
        .reference_resolvers()
        .iter()
        .find_map(|resolver| resolver.resolve(reference, owner, ctx));
    if resolved.is_none() {
        tracing::debug!(
            reference = reference.value,
            kind = ?reference.kind,
            owner = owner.pointer(),
            "Unresolved reference"
        );
    }
    resolved
}

/// Push the resource containing `target` onto the dynamic scope unless it is already
/// the innermost one.
#[must_use]
pub fn enter_scope(scopes: &Scopes, target: &SchemaNode) -> Scopes {
    let resource = target.resource_root();
    if scopes.head() == Some(&resource) {
        scopes.clone()
    } else {
        scopes.push_front(resource)
    }
}

fn join(owner: &SchemaNode, reference: &str) -> Option<Url> {
    match owner.base_uri().join(reference) {
        Ok(url) => Some(url),
        Err(error) => {
            tracing::debug!(reference, base = %owner.base_uri(), %error, "Invalid reference");
            None
        }
    }
}

fn resolve_local(reference: &str, owner: &SchemaNode) -> Option<SchemaNode> {
    if let Some(fragment) = reference.strip_prefix('#') {
        if pointer::normalize(fragment).is_some() {
            return owner.resolve_in_resource(fragment);
        }
        return owner
            .dynamic_anchor_in_resource(fragment)
            .or_else(|| owner.resolve_in_resource(fragment));
    }
    if reference.starts_with('/') {
        if let Some(node) = owner.root().resolve_pointer(reference) {
            return Some(node);
        }
    }
    let url = join(owner, reference)?;
    owner.root().resolve_uri(&url)
}

fn resolve_remote(
    reference: &str,
    owner: &SchemaNode,
    registry: &SchemaRegistry,
) -> Option<SchemaNode> {
    let url = join(owner, reference)?;
    let node = registry.resolve_url(&url)?;
    registry.service().register_reference_usage(&url);
    Some(node)
}

fn resolve_vocabulary(
    reference: &str,
    owner: &SchemaNode,
    registry: &SchemaRegistry,
) -> Option<SchemaNode> {
    let mut url = join(owner, reference)?;
    let fragment = url.fragment().unwrap_or("").to_string();
    url.set_fragment(None);
    let target = Vocabulary::meta_schema_for(url.as_str()).unwrap_or_else(|| url.to_string());
    match registry.bundled(&target) {
        Some(root) => root.node()?.resolve_in_resource(&fragment),
        None if target != url.as_str() => {
            let mut meta = Url::parse(&target).ok()?;
            meta.set_fragment(Some(&fragment).filter(|f| !f.is_empty()).map(String::as_str));
            registry.resolve_url(&meta)
        }
        None => None,
    }
}

fn resolve_static(
    reference: &str,
    owner: &SchemaNode,
    registry: &SchemaRegistry,
) -> Option<SchemaNode> {
    resolve_local(reference, owner).or_else(|| resolve_remote(reference, owner, registry))
}

fn resolve_dynamic(
    reference: Reference<'_>,
    owner: &SchemaNode,
    ctx: &ResolveContext<'_>,
) -> Option<SchemaNode> {
    if reference.kind != ReferenceKind::Dynamic {
        return None;
    }
    let target = resolve_static(reference.value, owner, ctx.registry)?;
    let scopes: Vec<_> = ctx.scopes.iter().collect();
    match owner.draft() {
        Draft::Draft202012 => {
            let (_, name) = reference.value.rsplit_once('#')?;
            if pointer::normalize(name).is_some()
                || target.get_str("$dynamicAnchor") != Some(name)
            {
                return None;
            }
            // The outermost resource declaring the anchor wins.
            scopes
                .into_iter()
                .rev()
                .find_map(|scope| scope.dynamic_anchor_in_resource(name))
        }
        Draft::Draft201909 => {
            if target.get_value("$recursiveAnchor") != Some(&Value::Bool(true)) {
                return None;
            }
            scopes
                .into_iter()
                .rev()
                .find(|scope| scope.resource_has_recursive_anchor())
                .map(SchemaNode::resource_root)
        }
        _ => None,
    }
}
