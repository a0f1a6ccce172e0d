use std::sync::Arc;

use serde_json::Value;

use crate::trace::traced;
use crate::{
    IndexError, Metadata, Namespace, QueryRequest, ScoredVector, UpsertSummary, VectorRecord,
    VectorStore,
};

/// Most records accepted by one upsert.
pub const MAX_UPSERT_BATCH: usize = 1000;
/// Most ids accepted by one fetch.
pub const MAX_FETCH_BATCH: usize = 100;

/// Validating front of a [`VectorStore`].
///
/// Every check runs before the store is touched, so a rejected batch never
/// leaves partial state behind.
#[derive(Clone)]
pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    dimension: Option<usize>,
}

impl VectorIndex {
    /// Enforces the store's own dimension when it reports one.
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        let dimension = store.dimension();
        Self { store, dimension }
    }

    /// Reject vectors whose length differs from `dimension`. `None` disables the check.
    pub fn with_dimension(mut self, dimension: Option<usize>) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Shape checks for [`upsert_chunks`](Self::upsert_chunks) that need no store: non-empty,
    /// equal-length arrays and the batch ceiling. Dimensions are checked on upsert.
    pub fn check_chunks(
        ids: &[String],
        vectors: &[Vec<f32>],
        metadata: Option<&[Metadata]>,
    ) -> Result<(), IndexError> {
        if ids.is_empty() || vectors.is_empty() {
            return Err(IndexError::validation(format!(
                "ids and vectors must be non-empty (got {} ids, {} vectors)",
                ids.len(),
                vectors.len()
            )));
        }
        if ids.len() != vectors.len() {
            return Err(IndexError::validation(format!(
                "ids and vectors must have the same length (got {} ids, {} vectors)",
                ids.len(),
                vectors.len()
            )));
        }
        if let Some(metadata) = metadata {
            if metadata.len() != ids.len() {
                return Err(IndexError::validation(format!(
                    "metadata must have the same length as ids (got {} metadata, {} ids)",
                    metadata.len(),
                    ids.len()
                )));
            }
        }
        if ids.len() > MAX_UPSERT_BATCH {
            return Err(IndexError::BatchSize {
                operation: "upsert",
                limit: MAX_UPSERT_BATCH,
                actual: ids.len(),
            });
        }
        Ok(())
    }

    /// Id checks for [`fetch_vectors`](Self::fetch_vectors): non-empty and at most
    /// [`MAX_FETCH_BATCH`].
    pub fn check_fetch_ids(ids: &[String]) -> Result<(), IndexError> {
        if ids.is_empty() {
            return Err(IndexError::validation("ids must be a non-empty array"));
        }
        if ids.len() > MAX_FETCH_BATCH {
            return Err(IndexError::BatchSize {
                operation: "fetch",
                limit: MAX_FETCH_BATCH,
                actual: ids.len(),
            });
        }
        Ok(())
    }

    /// Upsert parallel arrays of ids, vectors and optional metadata as one batch.
    pub async fn upsert_chunks(
        &self,
        ids: Vec<String>,
        vectors: Vec<Vec<f32>>,
        metadata: Option<Vec<Metadata>>,
        namespace: &Namespace,
    ) -> Result<UpsertSummary, IndexError> {
        Self::check_chunks(&ids, &vectors, metadata.as_deref())?;

        let mut metadata = metadata.map(Vec::into_iter);
        let records = ids
            .into_iter()
            .zip(vectors)
            .map(|(id, values)| VectorRecord {
                id,
                values,
                metadata: metadata
                    .as_mut()
                    .and_then(|rest| rest.next())
                    .unwrap_or_default(),
            })
            .collect();
        self.upsert_records(records, namespace).await
    }

    /// Upsert already assembled records as one batch.
    pub async fn upsert_records(
        &self,
        records: Vec<VectorRecord>,
        namespace: &Namespace,
    ) -> Result<UpsertSummary, IndexError> {
        self.validate_records(&records)?;

        let count = records.len();
        let upserted_count = traced(
            "upsert",
            namespace,
            count,
            self.store.upsert(namespace, records),
        )
        .await?;
        Ok(UpsertSummary {
            upserted_count,
            namespace: namespace.clone(),
        })
    }

    fn validate_records(&self, records: &[VectorRecord]) -> Result<(), IndexError> {
        if records.is_empty() {
            return Err(IndexError::validation("at least one vector is required"));
        }
        if records.len() > MAX_UPSERT_BATCH {
            return Err(IndexError::BatchSize {
                operation: "upsert",
                limit: MAX_UPSERT_BATCH,
                actual: records.len(),
            });
        }
        for (position, record) in records.iter().enumerate() {
            if record.id.trim().is_empty() {
                return Err(IndexError::validation(format!(
                    "vector id at position {position} must be a non-empty string"
                )));
            }
            if record.values.is_empty() {
                return Err(IndexError::validation(format!(
                    "vector '{}' has no values",
                    record.id
                )));
            }
            if let Some(expected) = self.dimension {
                if record.values.len() != expected {
                    tracing::error!(
                        id = %record.id,
                        expected,
                        actual = record.values.len(),
                        "vector dimension mismatch"
                    );
                    return Err(IndexError::DimensionMismatch {
                        id: record.id.clone(),
                        expected,
                        actual: record.values.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fetch stored records by id. Missing ids are omitted and order follows `ids`.
    pub async fn fetch_vectors(
        &self,
        ids: &[String],
        namespace: &Namespace,
    ) -> Result<Vec<VectorRecord>, IndexError> {
        Self::check_fetch_ids(ids)?;
        traced("fetch", namespace, ids.len(), self.store.fetch(namespace, ids)).await
    }

    /// Delete records by id. Returns the number of ids submitted, not the number that existed.
    pub async fn delete_vectors(
        &self,
        ids: &[String],
        namespace: &Namespace,
    ) -> Result<usize, IndexError> {
        if ids.is_empty() {
            return Err(IndexError::validation("ids must be a non-empty array"));
        }
        traced("delete", namespace, ids.len(), self.store.delete(namespace, ids)).await?;
        Ok(ids.len())
    }

    /// Nearest neighbours of `vector`. `filter` is handed to the store untouched.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<Value>,
        namespace: &Namespace,
    ) -> Result<Vec<ScoredVector>, IndexError> {
        if vector.is_empty() {
            return Err(IndexError::validation("query vector must be non-empty"));
        }
        let request = QueryRequest {
            vector,
            top_k,
            filter,
            include_metadata: true,
            include_values: false,
        };
        traced("query", namespace, top_k, self.store.query(namespace, &request)).await
    }
}
