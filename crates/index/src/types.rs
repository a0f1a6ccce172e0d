use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Open key-value metadata attached to a vector.
pub type Metadata = serde_json::Map<String, Value>;

/// Name under which the default partition is reported.
pub const DEFAULT_NAMESPACE: &str = "__default__";

/// A partition of the vector index.
///
/// The empty string and `"__default__"` both name the default partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == DEFAULT_NAMESPACE {
            Self(String::new())
        } else {
            Self(name)
        }
    }

    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    /// Value sent to the store. The default partition is the empty string.
    pub fn as_wire(&self) -> &str {
        &self.0
    }

    /// Human-facing name. The default partition is `"__default__"`.
    pub fn label(&self) -> &str {
        if self.is_default() {
            DEFAULT_NAMESPACE
        } else {
            &self.0
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Option<String>> for Namespace {
    fn from(value: Option<String>) -> Self {
        value.map(Self::new).unwrap_or_default()
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// A stored vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// A raw match from a similarity query, as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredVector {
    pub id: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Parameters of one similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    /// Metadata predicate forwarded to the store as-is.
    pub filter: Option<Value>,
    pub include_metadata: bool,
    pub include_values: bool,
}

/// Result of a batched upsert.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSummary {
    pub upserted_count: usize,
    pub namespace: Namespace,
}

/// Index-wide statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub dimension: usize,
    /// 0.0 (empty) to 1.0 (full).
    pub index_fullness: f64,
    pub total_record_count: u64,
    /// Namespace label to record count.
    pub namespaces: BTreeMap<String, u64>,
}

/// One row of a namespace listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
    pub name: String,
    pub vector_count: u64,
}

/// Control-plane description of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: Option<usize>,
    pub host: Option<String>,
    pub ready: bool,
    pub state: String,
}

/// Result of a connectivity check. Produced, never thrown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub index_ready: bool,
    pub index_name: String,
    pub message: String,
}

impl ConnectionStatus {
    /// Status reported when no vector store was configured at startup.
    pub fn not_initialized() -> Self {
        Self {
            connected: false,
            index_ready: false,
            index_name: String::new(),
            message: "vector index client not initialized: set PINECONE_API_KEY and PINECONE_INDEX_NAME"
                .into(),
        }
    }
}
