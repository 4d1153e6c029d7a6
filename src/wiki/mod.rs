//! Knowledge linking: link rewriting, backlinks and the relation graph.
//!
//! Everything here is a pure function of a document slice; nothing is
//! cached or persisted. Callers fetch the corpus from the
//! [`DocumentStore`](crate::store::DocumentStore) and recompute per request.

pub mod backlinks;
pub mod graph;
pub mod links;
pub mod rewrite;
pub mod segment;

pub use backlinks::{Backlink, collect_backlinks};
pub use graph::{GraphNode, KnowledgeGraph, Relation, RelationKind, build_graph};
pub use links::extract_wiki_links;
pub use rewrite::{auto_link_keywords, convert_wiki_links, rewrite};
pub use segment::{Segment, tokenize};
