use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SemanticError;

/// Instruction prefix for text being searched for.
pub const QUERY_PREFIX: &str = "query: ";
/// Instruction prefix for text being indexed.
pub const PASSAGE_PREFIX: &str = "passage: ";

/// Descriptive facts about one embedding vector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingMetadata {
    /// Number of components.
    pub dimensions: usize,
    /// L2 norm of the vector as returned by the endpoint, before normalization.
    pub magnitude: f32,
    /// Whether the stored vector was L2-normalized.
    pub normalized: bool,
}

/// Output of a single inference call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureExtraction {
    pub embeddings: Vec<f32>,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: EmbeddingMetadata,
}

/// Role of a text in asymmetric retrieval. Determines the instruction prefix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingRole {
    Query,
    Passage,
}

impl EmbeddingRole {
    pub fn prefix(self) -> &'static str {
        match self {
            EmbeddingRole::Query => QUERY_PREFIX,
            EmbeddingRole::Passage => PASSAGE_PREFIX,
        }
    }

    /// The raw inference input for `text` in this role.
    pub fn apply(self, text: &str) -> String {
        format!("{}{text}", self.prefix())
    }
}

/// A role-prefixed embedding of one text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingResult {
    /// The caller's text, without the prefix.
    pub text: String,
    pub role: EmbeddingRole,
    pub vector: Vec<f32>,
    pub metadata: EmbeddingMetadata,
    pub model: String,
}

/// Outcome for one item of [`embed_passages`](crate::EmbeddingService::embed_passages).
#[derive(Debug, Clone, PartialEq)]
pub enum PassageOutcome {
    Embedded { index: usize, result: EmbeddingResult },
    Failed { index: usize, error: SemanticError },
}

impl PassageOutcome {
    /// Position of the item in the caller's input.
    pub fn index(&self) -> usize {
        match self {
            PassageOutcome::Embedded { index, .. } | PassageOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, PassageOutcome::Embedded { .. })
    }
}

/// Per-item results of a passage batch, one entry per input in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchEmbedding {
    pub outcomes: Vec<PassageOutcome>,
}

impl BatchEmbedding {
    /// Successful results in input order.
    pub fn successes(&self) -> impl Iterator<Item = &EmbeddingResult> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PassageOutcome::Embedded { result, .. } => Some(result),
            PassageOutcome::Failed { .. } => None,
        })
    }

    /// `(input index, error)` for every failed item.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &SemanticError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PassageOutcome::Failed { index, error } => Some((*index, error)),
            PassageOutcome::Embedded { .. } => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_embedded()).count()
    }

    /// Consume the batch, keeping only the successful results.
    pub fn into_successes(self) -> Vec<EmbeddingResult> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                PassageOutcome::Embedded { result, .. } => Some(result),
                PassageOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str) -> EmbeddingResult {
        EmbeddingResult {
            text: text.into(),
            role: EmbeddingRole::Passage,
            vector: vec![1.0, 0.0],
            metadata: EmbeddingMetadata {
                dimensions: 2,
                magnitude: 1.0,
                normalized: true,
            },
            model: "m".into(),
        }
    }

    #[test]
    fn roles_use_distinct_prefixes() {
        assert_eq!(EmbeddingRole::Query.apply("hello"), "query: hello");
        assert_eq!(EmbeddingRole::Passage.apply("hello"), "passage: hello");
        assert_ne!(
            EmbeddingRole::Query.apply("same"),
            EmbeddingRole::Passage.apply("same")
        );
    }

    #[test]
    fn batch_helpers_split_outcomes() {
        let batch = BatchEmbedding {
            outcomes: vec![
                PassageOutcome::Embedded {
                    index: 0,
                    result: result("a"),
                },
                PassageOutcome::Failed {
                    index: 1,
                    error: SemanticError::Validation("blank".into()),
                },
                PassageOutcome::Embedded {
                    index: 2,
                    result: result("c"),
                },
            ],
        };

        let texts: Vec<&str> = batch.successes().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        let failed: Vec<usize> = batch.failures().map(|(i, _)| i).collect();
        assert_eq!(failed, vec![1]);
        assert_eq!(batch.failed_count(), 1);
        assert_eq!(batch.outcomes[2].index(), 2);
        assert_eq!(batch.into_successes().len(), 2);
    }

    #[test]
    fn metadata_serializes_field_names() {
        let meta = EmbeddingMetadata {
            dimensions: 3,
            magnitude: 2.5,
            normalized: false,
        };
        let value = serde_json::to_value(meta).unwrap();
        assert_eq!(value["dimensions"], 3);
        assert_eq!(value["normalized"], false);
    }
}
