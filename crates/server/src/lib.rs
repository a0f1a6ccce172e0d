//! docsearch server - HTTP API for semantic document search
//!
//! Exposes the embedding client, the vector index adapter and the semantic search
//! service over a JSON REST API.
//!
//! - **Semantic search**: embed a query and rank stored passages by cosine similarity
//! - **Vector CRUD**: upsert, fetch and delete caller-supplied vectors by namespace
//! - **Diagnostics**: index statistics, namespace listing, store connectivity
//! - **Feature extraction**: raw embeddings straight from the inference endpoint
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check
//!
//! ## Protected Endpoints (API key required when keys are configured)
//!
//! - `POST /pinecone/search` - Semantic search
//! - `POST /pinecone/store-text` - Embed and store one passage
//! - `POST /pinecone/upsert` - Upsert vectors
//! - `POST /pinecone/fetch` - Fetch vectors by id
//! - `DELETE /pinecone/vectors?ids=a,b` - Delete vectors by id
//! - `GET /pinecone/index/stats` - Index statistics
//! - `GET /pinecone/namespaces` - Namespaces with record counts
//! - `GET /pinecone/health` - Vector store connectivity
//! - `POST /huggingface/extract-features` - Raw feature extraction
//!
//! Every error is returned as `{statusCode, message, error, timestamp, path}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, ServerError, ServerResult};
pub use server::{build_router, load_app_config, start_server};
pub use state::ServerState;
