use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::{
    BatchEmbedding, EmbeddingClient, EmbeddingResult, EmbeddingRole, PassageOutcome, SemanticError,
};

/// Maximum number of passages accepted by [`EmbeddingService::embed_passages`].
pub const MAX_PASSAGE_BATCH: usize = 100;

/// Role-aware embedding on top of [`EmbeddingClient`].
///
/// Queries are embedded with `"query: "` and passages with `"passage: "`; the two never
/// share an inference input for the same text.
#[derive(Clone)]
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    batch_concurrency: usize,
}

impl EmbeddingService {
    pub fn new(client: Arc<EmbeddingClient>) -> Self {
        Self {
            client,
            batch_concurrency: 1,
        }
    }

    /// Embed up to `limit` passages at once in [`embed_passages`](Self::embed_passages).
    pub fn with_batch_concurrency(mut self, limit: usize) -> Self {
        self.batch_concurrency = limit.max(1);
        self
    }

    pub fn client(&self) -> &EmbeddingClient {
        &self.client
    }

    pub async fn embed_query(&self, text: &str) -> Result<EmbeddingResult, SemanticError> {
        self.embed(text, EmbeddingRole::Query).await
    }

    pub async fn embed_passage(&self, text: &str) -> Result<EmbeddingResult, SemanticError> {
        self.embed(text, EmbeddingRole::Passage).await
    }

    /// Embed a batch of passages. A blank item or a failed inference call is recorded for that
    /// item only; the rest of the batch still runs. Outcomes come back in input order.
    pub async fn embed_passages<T>(&self, texts: &[T]) -> Result<BatchEmbedding, SemanticError>
    where
        T: AsRef<str> + Sync,
    {
        if texts.is_empty() || texts.len() > MAX_PASSAGE_BATCH {
            return Err(SemanticError::BatchSize {
                limit: MAX_PASSAGE_BATCH,
                actual: texts.len(),
            });
        }

        let outcomes: Vec<PassageOutcome> = stream::iter(texts.iter().enumerate())
            .map(|(index, text)| async move {
                match self.embed_passage(text.as_ref()).await {
                    Ok(result) => PassageOutcome::Embedded { index, result },
                    Err(error) => {
                        tracing::warn!(index, error = %error, "passage embedding failed");
                        PassageOutcome::Failed { index, error }
                    }
                }
            })
            .buffered(self.batch_concurrency)
            .collect()
            .await;

        let batch = BatchEmbedding { outcomes };
        tracing::info!(
            requested = texts.len(),
            embedded = texts.len() - batch.failed_count(),
            failed = batch.failed_count(),
            "passage batch embedded"
        );
        Ok(batch)
    }

    async fn embed(&self, text: &str, role: EmbeddingRole) -> Result<EmbeddingResult, SemanticError> {
        if text.trim().is_empty() {
            return Err(SemanticError::Validation(
                "text must be a non-empty string".into(),
            ));
        }

        let extraction = self.client.extract_features(&role.apply(text), None).await?;
        Ok(EmbeddingResult {
            text: text.to_string(),
            role,
            vector: extraction.embeddings,
            metadata: extraction.metadata,
            model: extraction.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmbeddingConfig, FeatureExtractor};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records raw inputs; fails any input containing "boom".
    #[derive(Default)]
    struct Recording {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FeatureExtractor for Recording {
        async fn extract(&self, text: &str, _model: &str) -> Result<Vec<f32>, SemanticError> {
            self.inputs.lock().unwrap().push(text.to_string());
            if text.contains("boom") {
                return Err(SemanticError::ExternalService("HTTP error 503: overloaded".into()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn service() -> (EmbeddingService, Arc<Recording>) {
        let recording = Arc::new(Recording::default());
        let cfg = EmbeddingConfig {
            normalize: false,
            ..Default::default()
        };
        let client = Arc::new(EmbeddingClient::new(recording.clone(), &cfg));
        (EmbeddingService::new(client), recording)
    }

    #[tokio::test]
    async fn query_and_passage_use_distinct_prefixes() {
        let (svc, rec) = service();
        let q = svc.embed_query("hello world").await.unwrap();
        let p = svc.embed_passage("hello world").await.unwrap();

        let inputs = rec.inputs.lock().unwrap().clone();
        assert_eq!(inputs, vec!["query: hello world", "passage: hello world"]);
        assert_eq!(q.role, EmbeddingRole::Query);
        assert_eq!(p.role, EmbeddingRole::Passage);
        assert_eq!(q.text, "hello world");
    }

    #[tokio::test]
    async fn blank_texts_are_rejected_before_inference() {
        let (svc, rec) = service();
        assert!(svc.embed_query("  ").await.unwrap_err().is_validation());
        assert!(svc.embed_passage("").await.unwrap_err().is_validation());
        assert!(rec.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_bounds_are_enforced() {
        let (svc, _) = service();
        let empty: Vec<String> = Vec::new();
        assert_eq!(
            svc.embed_passages(&empty).await.unwrap_err(),
            SemanticError::BatchSize {
                limit: 100,
                actual: 0
            }
        );

        let too_many = vec!["x"; 101];
        assert!(matches!(
            svc.embed_passages(&too_many).await,
            Err(SemanticError::BatchSize { actual: 101, .. })
        ));

        let at_limit = vec!["x"; 100];
        assert_eq!(svc.embed_passages(&at_limit).await.unwrap().outcomes.len(), 100);
    }

    #[tokio::test]
    async fn blank_item_does_not_affect_neighbours() {
        let (svc, rec) = service();
        let batch = svc.embed_passages(&["t1", "   ", "t3"]).await.unwrap();

        let texts: Vec<&str> = batch.successes().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["t1", "t3"]);
        let failures: Vec<usize> = batch.failures().map(|(i, _)| i).collect();
        assert_eq!(failures, vec![1]);
        assert_eq!(
            rec.inputs.lock().unwrap().clone(),
            vec!["passage: t1", "passage: t3"]
        );
    }

    #[tokio::test]
    async fn inference_failure_is_recorded_per_item() {
        let (svc, _) = service();
        let batch = svc.embed_passages(&["a", "boom", "c"]).await.unwrap();

        assert_eq!(batch.outcomes.len(), 3);
        assert!(batch.outcomes[0].is_embedded());
        assert!(matches!(
            &batch.outcomes[1],
            PassageOutcome::Failed { index: 1, error: SemanticError::ExternalService(_) }
        ));
        assert!(batch.outcomes[2].is_embedded());
    }

    #[tokio::test]
    async fn concurrent_batches_preserve_input_order() {
        let (svc, _) = service();
        let svc = svc.with_batch_concurrency(8);
        let texts: Vec<String> = (0..20).map(|i| "x".repeat(i + 1)).collect();
        let batch = svc.embed_passages(&texts).await.unwrap();

        for (i, outcome) in batch.outcomes.iter().enumerate() {
            assert_eq!(outcome.index(), i);
        }
        let lens: Vec<f32> = batch.successes().map(|r| r.vector[0]).collect();
        let expected: Vec<f32> = (0..20).map(|i| ("passage: ".len() + i + 1) as f32).collect();
        assert_eq!(lens, expected);
    }
}
