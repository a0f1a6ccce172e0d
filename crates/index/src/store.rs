use async_trait::async_trait;

use crate::{
    IndexDescription, IndexError, IndexStats, Namespace, QueryRequest, ScoredVector, VectorRecord,
};

/// A namespaced vector store. This allows for different implementations
/// (the managed Pinecone index, an in-memory store for tests and local runs).
///
/// Implementations perform one round trip per call and do not validate caller input;
/// validation belongs to [`VectorIndex`](crate::VectorIndex).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the index this store talks to.
    fn index_name(&self) -> &str;

    /// Vector length the index enforces, when the store knows it.
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Insert or overwrite records by id. Returns the number of records written.
    async fn upsert(&self, namespace: &Namespace, records: Vec<VectorRecord>)
        -> Result<usize, IndexError>;

    /// Fetch records by id. Missing ids are omitted; order follows `ids`.
    async fn fetch(&self, namespace: &Namespace, ids: &[String])
        -> Result<Vec<VectorRecord>, IndexError>;

    /// Delete records by id. Unknown ids are ignored.
    async fn delete(&self, namespace: &Namespace, ids: &[String]) -> Result<(), IndexError>;

    /// Nearest neighbours of `request.vector`, best first.
    async fn query(&self, namespace: &Namespace, request: &QueryRequest)
        -> Result<Vec<ScoredVector>, IndexError>;

    /// Index-wide statistics.
    async fn describe_stats(&self) -> Result<IndexStats, IndexError>;

    /// Control-plane description (readiness, dimension).
    async fn describe_index(&self) -> Result<IndexDescription, IndexError>;
}
