use std::sync::Arc;

use crate::{ConnectionStatus, IndexError, IndexStats, Namespace, NamespaceSummary, VectorStore};
use crate::trace::traced;

/// Read-only diagnostics over a [`VectorStore`].
#[derive(Clone)]
pub struct IndexAdmin {
    store: Arc<dyn VectorStore>,
}

impl IndexAdmin {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Namespaces and their record counts, sorted by name.
    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>, IndexError> {
        let stats = self.get_index_stats().await?;
        // BTreeMap iteration is already name-ordered.
        Ok(stats
            .namespaces
            .into_iter()
            .map(|(name, vector_count)| NamespaceSummary { name, vector_count })
            .collect())
    }

    pub async fn get_index_stats(&self) -> Result<IndexStats, IndexError> {
        traced(
            "describe_index_stats",
            &Namespace::default(),
            0,
            self.store.describe_stats(),
        )
        .await
    }

    /// Check the store connection. Every failure is reported in the returned status, never as an error.
    pub async fn verify_connection(&self) -> ConnectionStatus {
        let index_name = self.store.index_name().to_string();
        match self.store.describe_index().await {
            Ok(description) => {
                let message = if description.ready {
                    format!("connected to index '{index_name}'")
                } else {
                    format!(
                        "connected to index '{index_name}' but it is not ready (state: {})",
                        description.state
                    )
                };
                ConnectionStatus {
                    connected: true,
                    index_ready: description.ready,
                    index_name,
                    message,
                }
            }
            Err(error) => {
                tracing::warn!(index = %index_name, %error, "vector index connection check failed");
                ConnectionStatus {
                    connected: false,
                    index_ready: false,
                    index_name,
                    message: format!("connection failed: {error}"),
                }
            }
        }
    }
}
