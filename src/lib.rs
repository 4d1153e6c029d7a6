//! Issue Wiki: tickets from an issue tracker served as a cross-linked wiki.
//!
//! The [`store::DocumentStore`] fetches and caches the corpus; everything in
//! [`wiki`] and [`search`] is computed from a corpus slice on demand.

pub mod config;
pub mod error;
pub mod logger;
#[cfg(feature = "markdown")]
pub mod markdown;
pub mod model;
pub mod search;
pub mod slug;
pub mod source;
pub mod store;
pub mod wiki;

pub use error::AppError;
pub use model::{Comment, Document, IssueState, Label};
pub use slug::generate_slug;
pub use store::DocumentStore;
