//! Retrieval pipeline orchestration.
//!
//! Coordinates formatter → embedder → vector store for both ingestion and
//! query. The embedder instance is pinned at construction, so ingestion and
//! search always use the same model and the same vector space.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::corpus::TicketRecord;
use crate::document::format_ticket;
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::store::{IndexedDocument, MatchResult, VectorStore};

/// Outcome of a batch ingestion run.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestReport {
    /// Documents written to the store.
    pub written: usize,
    /// Records skipped due to validation failures.
    pub skipped: usize,
}

pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
    /// Ingestion is idle → ingesting → idle; a second trigger while one is
    /// in flight is rejected, not queued.
    ingest_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, batch_size: usize) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
            ingest_lock: Mutex::new(()),
        }
    }

    /// Create or verify the store collection against the pinned embedding
    /// dimensionality.
    pub async fn init_collection(&self) -> Result<()> {
        self.store.create_collection(self.embedder.dims()).await
    }

    /// Format, embed, and write a batch of ticket records.
    ///
    /// Records failing validation are skipped (counted in the report) without
    /// aborting the batch. An embedding or store failure aborts the run with
    /// a provider error whose message includes the partial written count;
    /// already-written documents are not rolled back.
    pub async fn ingest(&self, records: &[TicketRecord]) -> Result<IngestReport> {
        let _guard = self
            .ingest_lock
            .try_lock()
            .map_err(|_| Error::IngestInProgress)?;

        let mut documents = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for record in records {
            match format_ticket(record) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping invalid ticket record");
                    skipped += 1;
                }
            }
        }

        let mut written = 0usize;

        for batch in documents.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();

            let vectors = self.embedder.embed(&texts).await.map_err(|e| {
                Error::Provider(format!(
                    "ingestion aborted after {written} documents written: {e}"
                ))
            })?;

            // One vector per text, in input order; the store write preserves it.
            let indexed: Vec<IndexedDocument> = batch
                .iter()
                .zip(vectors)
                .map(|(doc, embedding)| IndexedDocument {
                    id: doc.id.clone(),
                    text: doc.text.clone(),
                    embedding,
                })
                .collect();

            self.store.write(&indexed).await.map_err(|e| {
                Error::Provider(format!(
                    "ingestion aborted after {written} documents written: {e}"
                ))
            })?;

            written += indexed.len();
        }

        Ok(IngestReport { written, skipped })
    }

    /// Embed the query and return its `k` nearest neighbors, best-match-first.
    ///
    /// Zero matches is a valid outcome (`Ok(vec![])`), distinct from a
    /// provider failure. `k <= 0` is caller misuse.
    pub async fn search(&self, query: &str, k: i64) -> Result<Vec<MatchResult>> {
        if k <= 0 {
            return Err(Error::Usage(format!("k must be positive, got {k}")));
        }
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_query(query).await?;
        self.store.nearest(&vector, k).await
    }
}
