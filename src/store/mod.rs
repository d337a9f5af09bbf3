//! Vector store abstraction.
//!
//! The [`VectorStore`] trait defines the three operations the retrieval
//! pipeline needs from a managed vector database: collection creation,
//! ordered point writes, and nearest-neighbor queries. The production
//! backend is [`qdrant::QdrantStore`]; [`memory::InMemoryStore`] provides a
//! brute-force implementation for tests.

pub mod memory;
pub mod qdrant;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A nearest-neighbor match returned from the store.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Ticket id carried in the point payload, if present.
    pub document_id: Option<String>,
    /// The formatted document text stored alongside the vector.
    pub text: String,
    /// Similarity score, best-match-first ordering.
    pub score: f32,
}

/// A point to write: the formatted document plus its embedding.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Abstract vector store backend.
///
/// Writes are additive and idempotent by document id; re-ingesting the same
/// ticket overwrites its point rather than duplicating it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection with the given vector dimensionality, or verify
    /// an existing collection matches it. A dimension mismatch is a hard
    /// failure: vectors from a different embedding space must never be mixed
    /// into the collection.
    async fn create_collection(&self, dims: usize) -> Result<()>;

    /// Write documents in input order.
    async fn write(&self, documents: &[IndexedDocument]) -> Result<()>;

    /// Return the `k` nearest neighbors of `vector`, best-match-first.
    /// An empty collection yields an empty list, not an error.
    async fn nearest(&self, vector: &[f32], k: i64) -> Result<Vec<MatchResult>>;
}

/// Derive a stable numeric point id from a ticket id.
///
/// The store requires numeric or UUID point ids, while ticket ids are
/// arbitrary strings like `PG-2024-002`. Hashing keeps writes idempotent by
/// ticket id across re-ingestion runs.
pub fn point_id(document_id: &str) -> u64 {
    let digest = Sha256::digest(document_id.as_bytes());
    u64::from_le_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_stable() {
        assert_eq!(point_id("PG-2024-002"), point_id("PG-2024-002"));
        assert_ne!(point_id("PG-2024-002"), point_id("PG-2024-003"));
    }
}
