//! Semantic search over e5 embeddings and a namespaced vector index.
//!
//! This crate ties the [`semantic`] embedding layer to the [`index`] vector layer:
//! [`SemanticSearchService`] embeds a query with the `"query: "` prefix, asks the index
//! for its nearest passages and returns ranked [`SearchMatch`]es. It can also embed and
//! store a single text ([`SemanticSearchService::store_text`]).
//!
//! Configuration for the whole stack lives in [`DocsearchConfig`].

pub mod config;
mod error;
mod search;

pub use crate::config::{ConfigLoadError, DocsearchConfig, StoreBackend};
pub use crate::error::SearchError;
pub use crate::search::{
    DEFAULT_TOP_K, MAX_TOP_K, SearchMatch, SearchOptions, SemanticSearchService, StoreTextRequest,
    StoredText, TEXT_METADATA_KEY,
};

pub use index;
pub use semantic;
