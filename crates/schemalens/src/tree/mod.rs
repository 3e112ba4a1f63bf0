//! Combinator expansion.
//!
//! A schema position is expanded into a tree of [`OperationKind`]s stored in an index arena:
//! top-down with an explicit worklist, then reduced bottom-up into a [`Resolution`]. Every
//! operation carries the schema nodes expanded on its path from the root, so cyclic schemas
//! terminate while sibling branches may still expand the same definition.
use ahash::AHashSet;
use schemalens_referencing::{SchemaNode, SchemaRegistry, Scopes};

use crate::{
    cancel::Cancellation,
    merge::merge,
    schema::{Applicators, Schema},
};

mod refs;

use refs::Inlined;

/// Upper bound on alternatives produced by an `allOf` cross product.
const MAX_ALTERNATIVES: usize = 64;
/// Upper bound on operations per pass.
const MAX_OPERATIONS: usize = 4096;

/// Decides whether an `if` schema holds for the instance being validated.
pub trait Condition {
    fn holds(&self, schema: &Schema, scopes: &Scopes) -> bool;
}

/// How `if` / `then` / `else` is expanded.
#[derive(Clone, Copy)]
pub enum IfThenElseMode<'a> {
    /// Evaluate `if` and keep only the selected branch.
    Strict(&'a dyn Condition),
    /// Keep both branches as alternatives.
    Lenient,
}

impl core::fmt::Debug for IfThenElseMode<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IfThenElseMode::Strict(_) => f.write_str("Strict"),
            IfThenElseMode::Lenient => f.write_str("Lenient"),
        }
    }
}

/// Everything an expansion pass consults besides the schema itself.
#[derive(Debug, Clone, Copy)]
pub struct TreeContext<'a> {
    pub registry: &'a SchemaRegistry,
    pub mode: IfThenElseMode<'a>,
    pub cancellation: Option<&'a Cancellation>,
}

impl<'a> TreeContext<'a> {
    #[must_use]
    pub fn new(registry: &'a SchemaRegistry, mode: IfThenElseMode<'a>) -> Self {
        TreeContext {
            registry,
            mode,
            cancellation: None,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: &'a Cancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_some_and(Cancellation::is_cancelled)
    }
}

/// A schema view together with the dynamic scope it was reached in.
#[derive(Debug, Clone)]
pub struct Alternative {
    pub schema: Schema,
    pub scopes: Scopes,
    /// Exclusive groups that apply only when this view is the one that holds, e.g. a `oneOf`
    /// inside an `anyOf` branch.
    pub exclusive: Vec<Vec<Resolution>>,
}

impl Alternative {
    #[must_use]
    pub fn new(schema: Schema, scopes: Scopes) -> Self {
        Alternative {
            schema,
            scopes,
            exclusive: Vec::new(),
        }
    }

    /// The same view without its exclusive groups.
    #[must_use]
    pub fn view(&self) -> Alternative {
        Alternative::new(self.schema.clone(), self.scopes.clone())
    }

    fn groups(&self) -> Vec<Vec<Alternative>> {
        self.exclusive
            .iter()
            .fold(vec![vec![self.view()]], |groups, members| cross(groups, members))
    }
}

/// Constraint groups applicable at one position.
///
/// At least one entry of `and_group` must hold (each entry is a conjunction baked into one
/// merged view) and exactly one member of every `or_groups` entry must hold. A member is a
/// nested resolution, so a `oneOf` branch that is itself an `anyOf` counts as one variant.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub and_group: Vec<Alternative>,
    pub or_groups: Vec<Vec<Resolution>>,
}

impl Resolution {
    fn single(alternative: Alternative) -> Self {
        Resolution {
            and_group: vec![alternative],
            or_groups: Vec::new(),
        }
    }

    /// Every way to satisfy this resolution, as a list of conjunctions: one entry of
    /// `and_group` (if any) plus one way to satisfy a member of each `or_groups` entry.
    #[must_use]
    pub fn groups(&self) -> Vec<Vec<Alternative>> {
        let groups: Vec<Vec<Alternative>> = if self.and_group.is_empty() {
            vec![Vec::new()]
        } else {
            self.and_group.iter().flat_map(Alternative::groups).collect()
        };
        let mut groups = self
            .or_groups
            .iter()
            .fold(groups, |groups, members| cross(groups, members));
        groups.retain(|group| !group.is_empty());
        groups
    }

    /// Every schema view mentioned anywhere in this resolution, nested groups included.
    pub fn alternatives(&self) -> impl Iterator<Item = &Alternative> {
        let mut found = Vec::new();
        self.collect_alternatives(&mut found);
        found.into_iter()
    }

    fn collect_alternatives<'r>(&'r self, found: &mut Vec<&'r Alternative>) {
        for alternative in &self.and_group {
            found.push(alternative);
            for member in alternative.exclusive.iter().flatten() {
                member.collect_alternatives(found);
            }
        }
        for member in self.or_groups.iter().flatten() {
            member.collect_alternatives(found);
        }
    }
}

/// Extend every conjunction in `groups` with each way to satisfy one of `members`.
fn cross(groups: Vec<Vec<Alternative>>, members: &[Resolution]) -> Vec<Vec<Alternative>> {
    let options: Vec<Vec<Alternative>> = members.iter().flat_map(Resolution::groups).collect();
    if options.is_empty() {
        return groups;
    }
    let mut next = Vec::with_capacity(groups.len() * options.len());
    'outer: for prefix in &groups {
        for option in &options {
            if next.len() == MAX_ALTERNATIVES {
                break 'outer;
            }
            let mut combined = prefix.clone();
            combined.extend(option.iter().cloned());
            next.push(combined);
        }
    }
    next
}

/// Index of an operation in the arena. The root is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(usize);

impl OperationId {
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not expanded yet; stays so for passes cancelled midway.
    Unresolved,
    Normal,
    /// Reached a second time in the same pass; contributes only its own keywords.
    Exhausted,
}

#[derive(Debug, Clone)]
pub enum OperationKind {
    Leaf,
    /// Every child holds. `own` carries the node's non-`allOf` keywords.
    AllOf { own: Option<Alternative> },
    /// Some child holds.
    AnyOf,
    /// Exactly one child holds. `own` carries the node's non-`oneOf` keywords.
    OneOf { own: Alternative },
    /// The selected `then` / `else` branches.
    IfThenElse,
}

#[derive(Debug)]
pub struct Operation {
    schema: Schema,
    scopes: Scopes,
    /// Already accounted for in the visited set by the parent.
    guarded: bool,
    /// Nodes expanded on the path from the root. Taken once the operation is expanded.
    visited: AHashSet<SchemaNode>,
    state: State,
    kind: OperationKind,
    children: Vec<OperationId>,
}

impl Operation {
    fn new(schema: Schema, scopes: Scopes, guarded: bool, visited: AHashSet<SchemaNode>) -> Self {
        Operation {
            schema,
            scopes,
            guarded,
            visited,
            state: State::Unresolved,
            kind: OperationKind::Leaf,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    #[must_use]
    pub fn children(&self) -> &[OperationId] {
        &self.children
    }
}

/// One expansion pass over a schema position.
#[derive(Debug)]
pub struct ResolutionTree {
    operations: Vec<Operation>,
}

impl ResolutionTree {
    /// Expand `schema` reached within `scopes`.
    #[must_use]
    pub fn build(schema: Schema, scopes: Scopes, ctx: &TreeContext<'_>) -> Self {
        let mut tree = ResolutionTree {
            operations: vec![Operation::new(schema, scopes, false, AHashSet::new())],
        };
        let mut worklist = vec![OperationId(0)];
        while let Some(id) = worklist.pop() {
            if ctx.is_cancelled() {
                tracing::debug!(
                    expanded = tree.operations.len(),
                    "Schema expansion cancelled"
                );
                break;
            }
            let first_child = tree.operations.len();
            tree.expand(id, ctx);
            worklist.extend((first_child..tree.operations.len()).rev().map(OperationId));
        }
        tree
    }

    #[must_use]
    pub fn root(&self) -> &Operation {
        &self.operations[0]
    }

    #[must_use]
    pub fn get(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(id.0)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    fn push(
        &mut self,
        parent: OperationId,
        schema: Schema,
        scopes: Scopes,
        guarded: bool,
        visited: &AHashSet<SchemaNode>,
    ) {
        let id = OperationId(self.operations.len());
        self.operations
            .push(Operation::new(schema, scopes, guarded, visited.clone()));
        self.operations[parent.0].children.push(id);
    }

    fn expand(&mut self, id: OperationId, ctx: &TreeContext<'_>) {
        let (mut schema, mut scopes, guarded, mut visited) = {
            let operation = &mut self.operations[id.0];
            (
                operation.schema.clone(),
                operation.scopes.clone(),
                operation.guarded,
                core::mem::take(&mut operation.visited),
            )
        };
        if !guarded && !visited.insert(schema.primary_node().clone()) {
            self.exhaust(id, "Schema already expanded on this path");
            return;
        }
        if self.operations.len() >= MAX_OPERATIONS {
            self.exhaust(id, "Operation limit reached");
            return;
        }

        while let Some(owner) = schema.reference_owner().cloned() {
            match refs::inline(&schema, &owner, &scopes, ctx.registry, &mut visited) {
                Inlined::Replaced(replaced, replaced_scopes) => {
                    schema = replaced;
                    scopes = replaced_scopes;
                }
                Inlined::Split(parts) => {
                    let operation = &mut self.operations[id.0];
                    operation.state = State::Normal;
                    operation.kind = OperationKind::AllOf { own: None };
                    for (part, part_scopes) in parts {
                        self.push(id, part, part_scopes, true, &visited);
                    }
                    return;
                }
                Inlined::Dropped(own) => {
                    schema = own;
                }
            }
        }

        {
            let operation = &mut self.operations[id.0];
            operation.schema = schema.clone();
            operation.scopes = scopes.clone();
            operation.state = State::Normal;
        }

        let combinators = schema.combinators();
        if combinators.is_empty() {
            return;
        }
        let families = [
            Applicators::ALL_OF,
            Applicators::ANY_OF,
            Applicators::ONE_OF,
            Applicators::CONDITIONAL,
        ]
        .into_iter()
        .filter(|family| combinators.contains(*family))
        .collect::<Vec<_>>();
        if families.len() > 1 {
            self.operations[id.0].kind = OperationKind::AllOf { own: None };
            for family in families {
                let others = families_except(family);
                self.push(id, schema.restrict(others), scopes.clone(), true, &visited);
            }
            return;
        }

        match families[0] {
            Applicators::ALL_OF => {
                let own = schema.restrict(Applicators::ALL_OF);
                self.operations[id.0].kind = OperationKind::AllOf {
                    own: Some(Alternative::new(own, scopes.clone())),
                };
                for branch in schema.all_of().unwrap_or_default() {
                    self.push(id, branch, scopes.clone(), false, &visited);
                }
            }
            Applicators::ANY_OF => {
                let own = schema.restrict(Applicators::ANY_OF);
                self.operations[id.0].kind = OperationKind::AnyOf;
                for branch in schema.any_of().unwrap_or_default() {
                    self.push(id, merge(&own, &branch, None), scopes.clone(), false, &visited);
                }
            }
            Applicators::ONE_OF => {
                let own = schema.restrict(Applicators::ONE_OF);
                self.operations[id.0].kind = OperationKind::OneOf {
                    own: Alternative::new(own, scopes.clone()),
                };
                for branch in schema.one_of().unwrap_or_default() {
                    self.push(id, branch, scopes.clone(), false, &visited);
                }
            }
            _ => {
                let own = schema.restrict(Applicators::CONDITIONAL);
                self.operations[id.0].kind = OperationKind::IfThenElse;
                let branches = match (ctx.mode, schema.if_()) {
                    (IfThenElseMode::Strict(condition), Some(condition_schema)) => {
                        let selected = if condition.holds(&condition_schema, &scopes) {
                            schema.then_()
                        } else {
                            schema.else_()
                        };
                        selected.into_iter().collect::<Vec<_>>()
                    }
                    _ => schema.then_().into_iter().chain(schema.else_()).collect(),
                };
                if branches.is_empty() {
                    self.push(id, own, scopes, true, &visited);
                } else {
                    for branch in branches {
                        self.push(id, merge(&own, &branch, None), scopes.clone(), false, &visited);
                    }
                }
            }
        }
    }

    fn exhaust(&mut self, id: OperationId, reason: &'static str) {
        let operation = &mut self.operations[id.0];
        tracing::trace!(
            schema = ?operation.schema.primary_node(),
            reason,
            "Schema operation exhausted"
        );
        operation.schema = operation
            .schema
            .restrict(Applicators::COMBINATORS.union(Applicators::REF));
        operation.state = State::Exhausted;
    }

    /// Combine the children bottom-up into the root's [`Resolution`].
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        let mut results: Vec<Option<Resolution>> = vec![None; self.operations.len()];
        for idx in (0..self.operations.len()).rev() {
            let operation = &self.operations[idx];
            let mut children = operation
                .children
                .iter()
                .filter_map(|child| results[child.0].take())
                .collect::<Vec<_>>();
            let leaf = || Resolution::single(Alternative::new(
                operation.schema.clone(),
                operation.scopes.clone(),
            ));
            let result = match (&operation.state, &operation.kind) {
                (State::Unresolved | State::Exhausted, _) | (State::Normal, OperationKind::Leaf) => {
                    leaf()
                }
                (State::Normal, _) if children.is_empty() && operation.children.is_empty() => {
                    leaf()
                }
                (State::Normal, OperationKind::AllOf { own }) => reduce_all_of(own.clone(), children),
                (State::Normal, OperationKind::AnyOf | OperationKind::IfThenElse) => {
                    let mut and_group = Vec::new();
                    for child in children.drain(..) {
                        and_group.extend(attach_exclusive(child, || {
                            Alternative::new(
                                operation
                                    .schema
                                    .restrict(Applicators::COMBINATORS.union(Applicators::REF)),
                                operation.scopes.clone(),
                            )
                        }));
                    }
                    Resolution {
                        and_group,
                        or_groups: Vec::new(),
                    }
                }
                (State::Normal, OperationKind::OneOf { own }) => Resolution {
                    and_group: vec![own.clone()],
                    or_groups: vec![children],
                },
            };
            results[idx] = Some(result);
        }
        results
            .into_iter()
            .next()
            .flatten()
            .unwrap_or_default()
    }
}

fn families_except(family: Applicators) -> Applicators {
    [
        Applicators::ALL_OF,
        Applicators::ANY_OF,
        Applicators::ONE_OF,
        Applicators::CONDITIONAL,
    ]
    .into_iter()
    .filter(|other| *other != family)
    .fold(Applicators::NONE, Applicators::union)
}

/// The alternatives of one branch, each carrying the branch's exclusive groups so that they
/// are only enforced when that alternative is the one that holds.
fn attach_exclusive(branch: Resolution, own: impl FnOnce() -> Alternative) -> Vec<Alternative> {
    let Resolution {
        mut and_group,
        or_groups,
    } = branch;
    if or_groups.is_empty() {
        return and_group;
    }
    if and_group.is_empty() {
        and_group.push(own());
    }
    for alternative in &mut and_group {
        alternative.exclusive.extend(or_groups.iter().cloned());
    }
    and_group
}

/// Cross product of every child's `and_group`, each combination merged into one view.
fn reduce_all_of(own: Option<Alternative>, children: Vec<Resolution>) -> Resolution {
    let mut and_group: Vec<Alternative> = own.into_iter().collect();
    let mut or_groups = Vec::new();
    for child in children {
        or_groups.extend(child.or_groups);
        if child.and_group.is_empty() {
            continue;
        }
        if and_group.is_empty() {
            and_group = child.and_group;
            continue;
        }
        let mut product = Vec::with_capacity(and_group.len() * child.and_group.len());
        'outer: for left in &and_group {
            for right in &child.and_group {
                if product.len() == MAX_ALTERNATIVES {
                    tracing::debug!(limit = MAX_ALTERNATIVES, "allOf alternatives truncated");
                    break 'outer;
                }
                let scopes = if right.scopes.len() >= left.scopes.len() {
                    right.scopes.clone()
                } else {
                    left.scopes.clone()
                };
                let mut merged = Alternative::new(merge(&left.schema, &right.schema, None), scopes);
                merged.exclusive = left
                    .exclusive
                    .iter()
                    .chain(&right.exclusive)
                    .cloned()
                    .collect();
                product.push(merged);
            }
        }
        and_group = product;
    }
    Resolution {
        and_group,
        or_groups,
    }
}

/// Expand `schema` and return its resolution.
#[must_use]
pub fn resolve(schema: Schema, scopes: Scopes, ctx: &TreeContext<'_>) -> Resolution {
    ResolutionTree::build(schema, scopes, ctx).resolution()
}
