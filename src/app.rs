//! Application wiring.
//!
//! [`AppContext`] owns every long-lived component, built once from a loaded
//! [`Config`] and passed down explicitly. Nothing here is global: two
//! contexts with different configs can coexist in one process, which is what
//! the tests rely on.

use std::sync::Arc;

use crate::agent::{ChatClient, TicketAgent};
use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::store::qdrant::QdrantStore;
use crate::store::VectorStore;

pub struct AppContext {
    pub config: Config,
    pub pipeline: Arc<Pipeline>,
    pub agent: Arc<TicketAgent>,
}

impl AppContext {
    /// Build the embedder, store, pipeline, and agent from configuration.
    pub fn init(config: Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding)?);
        let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.store)?);

        tracing::info!(
            model = embedder.model_name(),
            dims = embedder.dims(),
            collection = %config.store.collection,
            "initialized application context"
        );

        Self::with_components(config, embedder, store)
    }

    /// Assemble a context from pre-built components. Used by tests to swap
    /// in an in-memory store or a deterministic embedder.
    pub fn with_components(
        config: Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let pipeline = Arc::new(Pipeline::new(
            embedder,
            store,
            config.embedding.batch_size,
        ));

        let client = ChatClient::new(&config.agent)?;
        let agent = Arc::new(TicketAgent::new(
            client,
            Arc::clone(&pipeline),
            config.retrieval.k,
            config.agent.max_steps,
        ));

        Ok(Self {
            config,
            pipeline,
            agent,
        })
    }
}
