//! # docsearch index
//!
//! Namespaced vector storage for semantic search.
//!
//! ## Layers
//!
//! - [`VectorStore`] is the backend seam. [`PineconeStore`] talks to a managed
//!   Pinecone index over REST, [`InMemoryStore`] keeps everything in a
//!   `RwLock<HashMap>` and supports the common metadata filter operators.
//! - [`VectorIndex`] validates every batch before the store sees it: array parity,
//!   batch ceilings ([`MAX_UPSERT_BATCH`], [`MAX_FETCH_BATCH`]), empty ids or vectors and
//!   the configured dimension. A rejected batch never partially applies.
//! - [`IndexAdmin`] lists namespaces, reports statistics and runs a connection check
//!   that reports failures instead of returning them.
//!
//! Every store call goes through [`trace::traced`], which logs started / completed /
//! failed events with the operation, namespace, item count and elapsed time.
//!
//! ## Namespaces
//!
//! The empty string and `"__default__"` both name the default partition. [`Namespace`]
//! collapses the two so the store always receives `""` and callers always see
//! `"__default__"`.
//!
//! ## Example
//!
//! ```
//! use index::{InMemoryStore, Namespace, VectorIndex};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), index::IndexError> {
//! let index = VectorIndex::new(Arc::new(InMemoryStore::default())).with_dimension(Some(3));
//! let ns = Namespace::new("docs");
//!
//! index
//!     .upsert_chunks(vec!["doc-1".into()], vec![vec![0.1, 0.2, 0.3]], None, &ns)
//!     .await?;
//!
//! let hits = index.query(vec![0.1, 0.2, 0.3], 5, None, &ns).await?;
//! assert_eq!(hits[0].id, "doc-1");
//! # Ok(())
//! # }
//! ```

mod adapter;
mod admin;
mod error;
mod filter;
mod memory;
mod pinecone;
mod store;
pub mod trace;
mod types;

pub use crate::adapter::{VectorIndex, MAX_FETCH_BATCH, MAX_UPSERT_BATCH};
pub use crate::admin::IndexAdmin;
pub use crate::error::IndexError;
pub use crate::memory::InMemoryStore;
pub use crate::pinecone::{
    PineconeConfig, PineconeStore, DEFAULT_API_VERSION, DEFAULT_CONTROLLER_URL,
};
pub use crate::store::VectorStore;
pub use crate::types::{
    ConnectionStatus, IndexDescription, IndexStats, Metadata, Namespace, NamespaceSummary,
    QueryRequest, ScoredVector, UpsertSummary, VectorRecord, DEFAULT_NAMESPACE,
};
