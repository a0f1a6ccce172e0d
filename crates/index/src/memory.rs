use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use hashbrown::HashMap;

use crate::filter::matches_filter;
use crate::{
    IndexDescription, IndexError, IndexStats, Namespace, QueryRequest, ScoredVector, VectorRecord,
    VectorStore,
};

type Partition = HashMap<String, VectorRecord>;

/// An in-memory vector store using a `RwLock` around a namespaced `HashMap`.
///
/// Queries are exhaustive cosine scans. Useful for tests and for running the
/// server without a managed index.
pub struct InMemoryStore {
    name: String,
    dimension: Option<usize>,
    partitions: RwLock<HashMap<Namespace, Partition>>,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimension: None,
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Fix the reported dimension. Without it the dimension of the first stored vector is reported.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new("in-memory")
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn index_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn upsert(
        &self,
        namespace: &Namespace,
        records: Vec<VectorRecord>,
    ) -> Result<usize, IndexError> {
        // A single write lock is held for the entire batch.
        let mut guard = self
            .partitions
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let partition = guard.entry(namespace.clone()).or_default();
        let count = records.len();
        for record in records {
            partition.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    async fn fetch(
        &self,
        namespace: &Namespace,
        ids: &[String],
    ) -> Result<Vec<VectorRecord>, IndexError> {
        let guard = self
            .partitions
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let Some(partition) = guard.get(namespace) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| partition.get(id).cloned())
            .collect())
    }

    async fn delete(&self, namespace: &Namespace, ids: &[String]) -> Result<(), IndexError> {
        let mut guard = self
            .partitions
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        if let Some(partition) = guard.get_mut(namespace) {
            for id in ids {
                partition.remove(id);
            }
            if partition.is_empty() {
                guard.remove(namespace);
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &Namespace,
        request: &QueryRequest,
    ) -> Result<Vec<ScoredVector>, IndexError> {
        let guard = self
            .partitions
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let Some(partition) = guard.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored = Vec::new();
        for record in partition.values() {
            if let Some(filter) = &request.filter {
                if !matches_filter(&record.metadata, filter)? {
                    continue;
                }
            }
            scored.push((cosine_similarity(&request.vector, &record.values), record));
        }

        // Ties are broken by id to keep ordering deterministic.
        scored.sort_unstable_by(|(sa, a), (sb, b)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(request.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| ScoredVector {
                id: record.id.clone(),
                score: Some(score),
                values: if request.include_values {
                    record.values.clone()
                } else {
                    Vec::new()
                },
                metadata: request
                    .include_metadata
                    .then(|| record.metadata.clone()),
            })
            .collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats, IndexError> {
        let guard = self
            .partitions
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let namespaces: BTreeMap<String, u64> = guard
            .iter()
            .map(|(ns, partition)| (ns.label().to_string(), partition.len() as u64))
            .collect();
        let dimension = self.dimension.unwrap_or_else(|| {
            guard
                .values()
                .flat_map(|p| p.values())
                .map(|r| r.values.len())
                .next()
                .unwrap_or(0)
        });
        Ok(IndexStats {
            dimension,
            index_fullness: 0.0,
            total_record_count: namespaces.values().sum(),
            namespaces,
        })
    }

    async fn describe_index(&self) -> Result<IndexDescription, IndexError> {
        Ok(IndexDescription {
            name: self.name.clone(),
            dimension: self.dimension,
            host: None,
            ready: true,
            state: "Ready".into(),
        })
    }
}

/// Cosine similarity in [-1, 1]. Zero-magnitude inputs score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metadata;
    use serde_json::json;

    fn record(id: &str, values: Vec<f32>, metadata: serde_json::Value) -> VectorRecord {
        VectorRecord {
            id: id.into(),
            values,
            metadata: metadata.as_object().cloned().unwrap_or_else(Metadata::new),
        }
    }

    fn query(vector: Vec<f32>, top_k: usize) -> QueryRequest {
        QueryRequest {
            vector,
            top_k,
            filter: None,
            include_metadata: true,
            include_values: false,
        }
    }

    #[tokio::test]
    async fn query_orders_by_score_then_id() {
        let store = InMemoryStore::default();
        let ns = Namespace::default();
        store
            .upsert(
                &ns,
                vec![
                    record("b", vec![1.0, 0.0], json!({})),
                    record("a", vec![1.0, 0.0], json!({})),
                    record("c", vec![0.0, 1.0], json!({})),
                ],
            )
            .await
            .unwrap();

        let hits = store.query(&ns, &query(vec![1.0, 0.0], 10)).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!((hits[0].score.unwrap() - 1.0).abs() < 1e-6);
        assert!(hits[2].score.unwrap().abs() < 1e-6);
        assert!(hits[0].values.is_empty());
    }

    #[tokio::test]
    async fn query_respects_top_k_and_filter() {
        let store = InMemoryStore::default();
        let ns = Namespace::new("docs");
        store
            .upsert(
                &ns,
                vec![
                    record("1", vec![1.0, 0.0], json!({"lang": "en"})),
                    record("2", vec![0.9, 0.1], json!({"lang": "de"})),
                    record("3", vec![0.8, 0.2], json!({"lang": "en"})),
                ],
            )
            .await
            .unwrap();

        let mut request = query(vec![1.0, 0.0], 1);
        assert_eq!(store.query(&ns, &request).await.unwrap().len(), 1);

        request.top_k = 10;
        request.filter = Some(json!({"lang": {"$eq": "en"}}));
        let ids: Vec<_> = store
            .query(&ns, &request)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = InMemoryStore::default();
        let a = Namespace::new("A");
        let b = Namespace::new("B");
        store
            .upsert(&a, vec![record("x", vec![1.0], json!({}))])
            .await
            .unwrap();

        assert!(store.fetch(&b, &["x".into()]).await.unwrap().is_empty());
        assert_eq!(store.fetch(&a, &["x".into()]).await.unwrap().len(), 1);
        assert!(store.query(&b, &query(vec![1.0], 5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_follows_request_order_and_skips_missing() {
        let store = InMemoryStore::default();
        let ns = Namespace::default();
        store
            .upsert(
                &ns,
                vec![
                    record("a", vec![1.0], json!({})),
                    record("b", vec![2.0], json!({})),
                ],
            )
            .await
            .unwrap();
        let ids = ["b".to_string(), "zz".to_string(), "a".to_string()];
        let fetched: Vec<_> = store
            .fetch(&ns, &ids)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(fetched, ["b", "a"]);
    }

    #[tokio::test]
    async fn delete_and_stats() {
        let store = InMemoryStore::new("local").with_dimension(2);
        let docs = Namespace::new("docs");
        store
            .upsert(&Namespace::default(), vec![record("a", vec![1.0, 0.0], json!({}))])
            .await
            .unwrap();
        store
            .upsert(
                &docs,
                vec![
                    record("b", vec![0.0, 1.0], json!({})),
                    record("c", vec![1.0, 1.0], json!({})),
                ],
            )
            .await
            .unwrap();

        let stats = store.describe_stats().await.unwrap();
        assert_eq!(stats.dimension, 2);
        assert_eq!(stats.total_record_count, 3);
        assert_eq!(stats.namespaces["__default__"], 1);
        assert_eq!(stats.namespaces["docs"], 2);

        store
            .delete(&docs, &["b".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(store.describe_stats().await.unwrap().namespaces["docs"], 1);

        store.delete(&docs, &["c".into()]).await.unwrap();
        assert!(!store
            .describe_stats()
            .await
            .unwrap()
            .namespaces
            .contains_key("docs"));
    }

    #[test]
    fn cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
