//! docsearch embeddings
//!
//! This crate turns text into vectors for asymmetric retrieval. It has two layers:
//!
//! - [`EmbeddingClient`] wraps exactly one inference call. It rejects blank text, checks
//!   the returned vector against the configured dimension (so a model swap without a
//!   config change fails loudly instead of silently poisoning the index), and optionally
//!   L2-normalizes.
//! - [`EmbeddingService`] adds the role prefixes (`"query: "` for searches, `"passage: "`
//!   for indexed text) and batch semantics where one bad passage never sinks the batch.
//!
//! The inference call itself goes through a [`FeatureExtractor`]: the HTTP backend talks to
//! Hugging Face (or an OpenAI-compatible / custom endpoint), the stub backend produces
//! deterministic vectors without a network.
//!
//! No retries happen here. If the provider fails, the error comes back as-is.
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{EmbeddingClient, EmbeddingConfig, EmbeddingService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), semantic::SemanticError> {
//!     let cfg = EmbeddingConfig {
//!         api_token: Some("hf_xxx".into()),
//!         expected_dimension: Some(1024),
//!         ..Default::default()
//!     };
//!     let service = EmbeddingService::new(Arc::new(EmbeddingClient::from_config(&cfg)?));
//!
//!     let query = service.embed_query("how do refunds work?").await?;
//!     assert_eq!(query.vector.len(), 1024);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod api;
mod client;
mod extractor;
mod normalize;
mod service;
mod stub;

pub use crate::api::HttpFeatureExtractor;
pub use crate::client::EmbeddingClient;
pub use crate::config::{EmbeddingConfig, ExtractorMode, DEFAULT_API_URL, DEFAULT_MODEL};
pub use crate::error::SemanticError;
pub use crate::extractor::{build_extractor, FeatureExtractor};
pub use crate::service::{EmbeddingService, MAX_PASSAGE_BATCH};
pub use crate::stub::StubFeatureExtractor;
pub use crate::types::{
    BatchEmbedding, EmbeddingMetadata, EmbeddingResult, EmbeddingRole, FeatureExtraction,
    PassageOutcome, PASSAGE_PREFIX, QUERY_PREFIX,
};
