use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use dashmap::DashMap;
use docsearch::{DocsearchConfig, SemanticSearchService, StoreBackend};
use index::{IndexAdmin, InMemoryStore, PineconeStore, VectorIndex, VectorStore};
use semantic::{EmbeddingClient, EmbeddingService};
use std::sync::Arc;

/// Shared application state
///
/// Service slots stay empty when their configuration is missing. Handlers that need an
/// empty slot fail with [`ServerError::NotInitialized`] while the rest of the API keeps working.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: API key -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, std::time::Instant)>>,

    pub embeddings: Option<Arc<EmbeddingService>>,
    pub index: Option<Arc<VectorIndex>>,
    pub admin: Option<IndexAdmin>,
    pub search: Option<SemanticSearchService>,
}

impl ServerState {
    /// Build every service the configuration allows.
    pub async fn initialize(config: ServerConfig, app: &DocsearchConfig) -> Self {
        let embeddings = build_embeddings(app);
        let store = build_store(app).await;
        Self::from_parts(config, embeddings, store, app.index_dimension())
    }

    /// Assemble state from already built services.
    ///
    /// `dimension` takes precedence over the dimension the store reports.
    pub fn from_parts(
        config: ServerConfig,
        embeddings: Option<Arc<EmbeddingService>>,
        store: Option<Arc<dyn VectorStore>>,
        dimension: Option<usize>,
    ) -> Self {
        let index = store.as_ref().map(|store| {
            let dimension = dimension.or_else(|| store.dimension());
            Arc::new(VectorIndex::new(store.clone()).with_dimension(dimension))
        });
        let admin = store.map(IndexAdmin::new);
        let search = match (&embeddings, &index) {
            (Some(embeddings), Some(index)) => Some(SemanticSearchService::new(
                embeddings.clone(),
                index.clone(),
            )),
            _ => None,
        };

        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            embeddings,
            index,
            admin,
            search,
        }
    }

    pub fn embeddings(&self) -> ServerResult<&EmbeddingService> {
        self.embeddings
            .as_deref()
            .ok_or(ServerError::NotInitialized("embedding client"))
    }

    pub fn index(&self) -> ServerResult<&VectorIndex> {
        self.index
            .as_deref()
            .ok_or(ServerError::NotInitialized("vector index client"))
    }

    pub fn admin(&self) -> ServerResult<&IndexAdmin> {
        self.admin
            .as_ref()
            .ok_or(ServerError::NotInitialized("vector index client"))
    }

    pub fn search(&self) -> ServerResult<&SemanticSearchService> {
        self.search
            .as_ref()
            .ok_or(ServerError::NotInitialized("semantic search service"))
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Check rate limit for API key
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self.rate_limiter.entry(key.to_string()).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        // Reset if window has passed
        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

fn build_embeddings(app: &DocsearchConfig) -> Option<Arc<EmbeddingService>> {
    if !app.embedding.is_configured() {
        tracing::warn!("embedding client not initialized: set HF_API_TOKEN or use the stub mode");
        return None;
    }
    match EmbeddingClient::from_config(&app.embedding) {
        Ok(client) => {
            tracing::info!(model = client.model(), "embedding client initialized");
            let service = EmbeddingService::new(Arc::new(client))
                .with_batch_concurrency(app.embedding.batch_concurrency);
            Some(Arc::new(service))
        }
        Err(error) => {
            tracing::warn!(%error, "embedding client not initialized");
            None
        }
    }
}

async fn build_store(app: &DocsearchConfig) -> Option<Arc<dyn VectorStore>> {
    match app.store {
        StoreBackend::Memory => {
            let mut store = InMemoryStore::new(
                app.pinecone
                    .index_name
                    .clone()
                    .unwrap_or_else(|| "in-memory".to_string()),
            );
            if let Some(dimension) = app.index_dimension() {
                store = store.with_dimension(dimension);
            }
            tracing::info!("using in-memory vector store");
            Some(Arc::new(store))
        }
        StoreBackend::Pinecone => {
            if !app.pinecone.is_configured() {
                tracing::warn!(
                    "vector index client not initialized: set PINECONE_API_KEY and PINECONE_INDEX_NAME"
                );
                return None;
            }
            match PineconeStore::connect(&app.pinecone).await {
                Ok(store) => Some(Arc::new(store)),
                Err(error) => {
                    tracing::warn!(%error, "vector index client not initialized");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic::ExtractorMode;

    #[tokio::test]
    async fn missing_configuration_leaves_slots_empty() {
        let state = ServerState::initialize(ServerConfig::default(), &DocsearchConfig::default()).await;
        assert!(state.embeddings.is_none());
        assert!(state.index.is_none());
        assert!(matches!(
            state.search(),
            Err(ServerError::NotInitialized(_))
        ));
    }

    #[tokio::test]
    async fn stub_and_memory_fill_every_slot() {
        let mut app = DocsearchConfig::default();
        app.embedding.mode = ExtractorMode::Stub;
        app.embedding.expected_dimension = Some(8);
        app.store = StoreBackend::Memory;

        let state = ServerState::initialize(ServerConfig::default(), &app).await;
        assert!(state.embeddings().is_ok());
        assert_eq!(state.index().unwrap().dimension(), Some(8));
        assert!(state.admin().is_ok());
        assert!(state.search().is_ok());
    }

    #[test]
    fn index_dimension_falls_back_to_store() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new("local").with_dimension(5));
        let state = ServerState::from_parts(ServerConfig::default(), None, Some(store.clone()), None);
        assert_eq!(state.index().unwrap().dimension(), Some(5));

        let state = ServerState::from_parts(ServerConfig::default(), None, Some(store), Some(7));
        assert_eq!(state.index().unwrap().dimension(), Some(7));
    }

    #[test]
    fn rate_limit_window() {
        let config = ServerConfig {
            rate_limit_per_minute: 2,
            ..Default::default()
        };
        let state = ServerState::from_parts(config, None, None, None);
        assert!(state.check_rate_limit("k"));
        assert!(state.check_rate_limit("k"));
        assert!(!state.check_rate_limit("k"));
        assert!(state.check_rate_limit("other"));
    }
}
