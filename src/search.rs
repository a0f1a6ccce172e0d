use std::sync::Arc;

use index::{Metadata, Namespace, VectorIndex, VectorRecord};
use semantic::{EmbeddingMetadata, EmbeddingService};
use serde::Serialize;
use serde_json::Value;

use crate::SearchError;

/// Result count used when a caller does not ask for one.
pub const DEFAULT_TOP_K: usize = 10;
/// Largest accepted result count.
pub const MAX_TOP_K: usize = 10_000;
/// Metadata key under which [`SemanticSearchService::store_text`] keeps the original text.
pub const TEXT_METADATA_KEY: &str = "text";

/// Parameters of one semantic search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub query: String,
    pub top_k: usize,
    /// Metadata predicate handed to the index untouched.
    pub filter: Option<Value>,
    pub namespace: Namespace,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            filter: None,
            namespace: Namespace::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Query non-empty after trimming, then `top_k` within `1..=MAX_TOP_K`.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.query.trim().is_empty() {
            return Err(SearchError::Validation(
                "query must be a non-empty string".into(),
            ));
        }
        if !(1..=MAX_TOP_K).contains(&self.top_k) {
            return Err(SearchError::Validation(format!(
                "topK must be an integer between 1 and {MAX_TOP_K}"
            )));
        }
        Ok(())
    }
}

/// One ranked hit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// A text to embed as a passage and store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreTextRequest {
    pub text: String,
    /// Record id. A UUID v4 is generated when absent or blank.
    pub id: Option<String>,
    pub metadata: Option<Metadata>,
    pub namespace: Namespace,
}

impl StoreTextRequest {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.text.trim().is_empty() {
            return Err(SearchError::Validation(
                "text must be a non-empty string".into(),
            ));
        }
        Ok(())
    }
}

/// What [`SemanticSearchService::store_text`] wrote.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredText {
    pub id: String,
    pub text: String,
    pub embedding: EmbeddingMetadata,
    pub metadata: Metadata,
    pub namespace: Namespace,
}

/// Query-side orchestration: embed the query, search the index, shape the matches.
///
/// Nothing is cached and there is no fallback path. Any failure is returned to the caller.
#[derive(Clone)]
pub struct SemanticSearchService {
    embeddings: Arc<EmbeddingService>,
    index: Arc<VectorIndex>,
}

impl SemanticSearchService {
    pub fn new(embeddings: Arc<EmbeddingService>, index: Arc<VectorIndex>) -> Self {
        Self { embeddings, index }
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Rank stored passages against `options.query`, best first.
    #[tracing::instrument(skip_all, fields(top_k = options.top_k, namespace = %options.namespace))]
    pub async fn vector_search(
        &self,
        options: SearchOptions,
    ) -> Result<Vec<SearchMatch>, SearchError> {
        options.validate()?;

        let query = self.embeddings.embed_query(&options.query).await?;
        let hits = self
            .index
            .query(query.vector, options.top_k, options.filter, &options.namespace)
            .await?;

        let matches: Vec<SearchMatch> = hits
            .into_iter()
            .map(|hit| SearchMatch {
                id: hit.id,
                score: hit.score.unwrap_or(0.0),
                metadata: hit.metadata.unwrap_or_default(),
            })
            .collect();
        tracing::debug!(matches = matches.len(), "semantic search finished");
        Ok(matches)
    }

    /// Embed `request.text` as a passage and upsert it as a single record.
    #[tracing::instrument(skip_all, fields(namespace = %request.namespace))]
    pub async fn store_text(&self, request: StoreTextRequest) -> Result<StoredText, SearchError> {
        request.validate()?;

        let passage = self.embeddings.embed_passage(&request.text).await?;

        let id = request
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut metadata = request.metadata.unwrap_or_default();
        metadata.insert(
            TEXT_METADATA_KEY.to_string(),
            Value::String(request.text.clone()),
        );

        let record = VectorRecord {
            id: id.clone(),
            values: passage.vector,
            metadata: metadata.clone(),
        };
        self.index
            .upsert_records(vec![record], &request.namespace)
            .await?;

        tracing::info!(%id, dimensions = passage.metadata.dimensions, "text stored");
        Ok(StoredText {
            id,
            text: request.text,
            embedding: passage.metadata,
            metadata,
            namespace: request.namespace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use index::{IndexError, InMemoryStore, VectorStore};
    use semantic::{EmbeddingClient, EmbeddingConfig, FeatureExtractor, SemanticError};
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps a few known words onto axes so rankings are predictable.
    #[derive(Default)]
    struct Axes {
        calls: AtomicUsize,
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FeatureExtractor for Axes {
        async fn extract(&self, text: &str, _model: &str) -> Result<Vec<f32>, SemanticError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(text.to_string());
            let mut v = vec![0.01_f32; 3];
            if text.contains("cat") {
                v[0] += 1.0;
            }
            if text.contains("dog") {
                v[1] += 1.0;
            }
            if text.contains("car") {
                v[2] += 1.0;
            }
            Ok(v)
        }
    }

    fn service() -> (SemanticSearchService, Arc<Axes>, Arc<InMemoryStore>) {
        let axes = Arc::new(Axes::default());
        let cfg = EmbeddingConfig {
            expected_dimension: Some(3),
            ..Default::default()
        };
        let client = Arc::new(EmbeddingClient::new(axes.clone(), &cfg));
        let embeddings = Arc::new(EmbeddingService::new(client));
        let store = Arc::new(InMemoryStore::new("test"));
        let index = Arc::new(VectorIndex::new(store.clone()).with_dimension(Some(3)));
        (SemanticSearchService::new(embeddings, index), axes, store)
    }

    async fn seed(svc: &SemanticSearchService, ns: &str) {
        for (id, text) in [("c", "a cat"), ("d", "a dog"), ("v", "a car")] {
            svc.store_text(StoreTextRequest {
                text: text.into(),
                id: Some(id.into()),
                namespace: Namespace::new(ns),
                ..Default::default()
            })
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn search_ranks_closest_passage_first() {
        let (svc, axes, _) = service();
        seed(&svc, "").await;

        let matches = svc
            .vector_search(SearchOptions::new("dog").with_top_k(3))
            .await
            .unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].id, "d");
        assert!(matches[0].score > matches[1].score);
        assert_eq!(matches[0].metadata["text"], json!("a dog"));

        let inputs = axes.inputs.lock().unwrap();
        assert_eq!(inputs.last().map(String::as_str), Some("query: dog"));
        assert!(inputs.iter().take(3).all(|i| i.starts_with("passage: ")));
    }

    #[tokio::test]
    async fn validation_happens_before_embedding() {
        let (svc, axes, _) = service();

        let err = svc.vector_search(SearchOptions::new("   ")).await.unwrap_err();
        assert_eq!(
            err,
            SearchError::Validation("query must be a non-empty string".into())
        );

        for top_k in [0, MAX_TOP_K + 1] {
            let err = svc
                .vector_search(SearchOptions::new("cat").with_top_k(top_k))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("topK"), "{top_k}: {err}");
        }

        // Blank query wins over a bad topK.
        let err = svc
            .vector_search(SearchOptions::new("").with_top_k(0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("query"));
        assert_eq!(axes.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn top_k_bounds_are_inclusive() {
        let (svc, _, _) = service();
        seed(&svc, "").await;
        for top_k in [1, MAX_TOP_K] {
            let matches = svc
                .vector_search(SearchOptions::new("car").with_top_k(top_k))
                .await
                .unwrap();
            assert_eq!(matches.len(), top_k.min(3));
        }
    }

    #[tokio::test]
    async fn default_options() {
        let options = SearchOptions::new("q");
        assert_eq!(options.top_k, DEFAULT_TOP_K);
        assert_eq!(options.namespace.label(), "__default__");
        assert!(options.filter.is_none());
    }

    #[tokio::test]
    async fn filter_and_namespace_are_honoured() {
        let (svc, _, _) = service();
        seed(&svc, "animals").await;

        let matches = svc
            .vector_search(
                SearchOptions::new("cat")
                    .with_namespace("animals")
                    .with_filter(json!({"text": {"$in": ["a dog", "a car"]}})),
            )
            .await
            .unwrap();
        let ids: Vec<_> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&"c"));

        let elsewhere = svc
            .vector_search(SearchOptions::new("cat").with_namespace("plants"))
            .await
            .unwrap();
        assert!(elsewhere.is_empty());
    }

    #[tokio::test]
    async fn store_text_round_trip() {
        let (svc, _, store) = service();
        let mut extra = Metadata::new();
        extra.insert("source".into(), json!("faq.md"));

        let stored = svc
            .store_text(StoreTextRequest {
                text: "my cat sleeps".into(),
                metadata: Some(extra),
                namespace: Namespace::new("docs"),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(uuid::Uuid::parse_str(&stored.id).is_ok());
        assert_eq!(stored.embedding.dimensions, 3);
        assert!(stored.embedding.normalized);
        assert_eq!(stored.metadata["source"], json!("faq.md"));
        assert_eq!(stored.metadata["text"], json!("my cat sleeps"));

        let fetched = store
            .fetch(&Namespace::new("docs"), &[stored.id.clone()])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].metadata, stored.metadata);

        let top = svc
            .vector_search(SearchOptions::new("cat").with_namespace("docs").with_top_k(1))
            .await
            .unwrap();
        assert_eq!(top[0].id, stored.id);
    }

    #[tokio::test]
    async fn store_text_rejects_blank_text() {
        let (svc, axes, _) = service();
        let err = svc
            .store_text(StoreTextRequest {
                text: " \n".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(axes.calls.load(Ordering::SeqCst), 0);
    }

    struct FailingStore;

    #[async_trait]
    impl VectorStore for FailingStore {
        fn index_name(&self) -> &str {
            "down"
        }
        async fn upsert(&self, _: &Namespace, _: Vec<VectorRecord>) -> Result<usize, IndexError> {
            Err(IndexError::ExternalService("HTTP error 503".into()))
        }
        async fn fetch(
            &self,
            _: &Namespace,
            _: &[String],
        ) -> Result<Vec<VectorRecord>, IndexError> {
            Err(IndexError::ExternalService("HTTP error 503".into()))
        }
        async fn delete(&self, _: &Namespace, _: &[String]) -> Result<(), IndexError> {
            Err(IndexError::ExternalService("HTTP error 503".into()))
        }
        async fn query(
            &self,
            _: &Namespace,
            _: &index::QueryRequest,
        ) -> Result<Vec<index::ScoredVector>, IndexError> {
            Err(IndexError::ExternalService("HTTP error 503".into()))
        }
        async fn describe_stats(&self) -> Result<index::IndexStats, IndexError> {
            Err(IndexError::ExternalService("HTTP error 503".into()))
        }
        async fn describe_index(&self) -> Result<index::IndexDescription, IndexError> {
            Err(IndexError::ExternalService("HTTP error 503".into()))
        }
    }

    #[tokio::test]
    async fn index_failures_propagate() {
        let (svc, _, _) = service();
        let broken = SemanticSearchService::new(
            svc.embeddings().clone(),
            Arc::new(VectorIndex::new(Arc::new(FailingStore))),
        );
        let err = broken
            .vector_search(SearchOptions::new("cat"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SearchError::Index(IndexError::ExternalService("HTTP error 503".into()))
        );
        assert!(!err.is_validation());
    }
}
