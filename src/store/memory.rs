//! In-memory [`VectorStore`] implementation for testing.
//!
//! Uses a `Vec` behind `std::sync::RwLock`; nearest-neighbor search is
//! brute-force cosine similarity over all stored vectors.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{IndexedDocument, MatchResult, VectorStore};

pub struct InMemoryStore {
    dims: RwLock<Option<usize>>,
    points: RwLock<Vec<IndexedDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            dims: RwLock::new(None),
            points: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored points. Test helper.
    pub fn len(&self) -> usize {
        self.points.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn create_collection(&self, dims: usize) -> Result<()> {
        let mut stored = self.dims.write().unwrap();
        match *stored {
            Some(existing) if existing != dims => Err(Error::Provider(format!(
                "collection has dimension {existing}, configured embedding has {dims}"
            ))),
            _ => {
                *stored = Some(dims);
                Ok(())
            }
        }
    }

    async fn write(&self, documents: &[IndexedDocument]) -> Result<()> {
        let dims = self.dims.read().unwrap();
        if let Some(expected) = *dims {
            for doc in documents {
                if doc.embedding.len() != expected {
                    return Err(Error::Provider(format!(
                        "vector for '{}' has dimension {}, collection expects {expected}",
                        doc.id,
                        doc.embedding.len()
                    )));
                }
            }
        }

        let mut points = self.points.write().unwrap();
        for doc in documents {
            // Idempotent by id, matching the production backend.
            points.retain(|p| p.id != doc.id);
            points.push(doc.clone());
        }
        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: i64) -> Result<Vec<MatchResult>> {
        let points = self.points.read().unwrap();
        let mut matches: Vec<MatchResult> = points
            .iter()
            .map(|p| MatchResult {
                document_id: Some(p.id.clone()),
                text: p.text.clone(),
                score: cosine_sim(vector, &p.embedding),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k as usize);
        Ok(matches)
    }
}
