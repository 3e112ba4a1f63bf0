//! # schemalens-referencing
//!
//! Schema documents as pointer-addressable node graphs, per-draft interpretation strategies
//! and reference resolution across local, remote, dynamic and vocabulary targets.
mod error;
mod list;
pub mod meta;
mod node;
pub mod pointer;
mod registry;
pub mod resolver;
mod root;
mod service;
mod specification;
mod types;
mod vocabularies;

pub use error::Error;
pub use list::List;
pub use node::SchemaNode;
pub use registry::{Generation, RegistryOptions, SchemaRegistry};
pub use resolver::{Reference, ReferenceKind, ResolveContext, ResolverKind, Scopes};
pub use root::{RootSchema, DEFAULT_ROOT_URI};
pub use service::{Fetch, InMemorySchemaService, NoopService, SchemaService};
pub use specification::{Draft, ExclusiveBounds, KeywordLookup, RefSiblings, ValidationKind};
pub use types::{JsonType, JsonTypeSet};
pub use url::Url;
pub use vocabularies::{Vocabulary, VocabularySet};
