//! Qdrant REST backend for [`VectorStore`].
//!
//! Talks to a Qdrant instance over its HTTP API:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `GET`  | `/collections/{name}` | Probe an existing collection and its dimensionality |
//! | `PUT`  | `/collections/{name}` | Create the collection (cosine distance) |
//! | `PUT`  | `/collections/{name}/points?wait=true` | Upsert points |
//! | `POST` | `/collections/{name}/points/search` | Nearest-neighbor query |
//!
//! Authentication uses the `QDRANT_API_KEY` environment variable when set;
//! credentials are never read from the config file.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::config::StoreConfig;
use crate::error::{Error, Result};

use super::{point_id, IndexedDocument, MatchResult, VectorStore};

pub struct QdrantStore {
    base_url: String,
    collection: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl QdrantStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key: std::env::var("QDRANT_API_KEY").ok(),
            timeout,
            client,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(ref key) = self.api_key {
            req = req.header("api-key", key);
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        req.send()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))
    }

    /// Returns the configured vector size of the collection, or `None` if it
    /// does not exist.
    async fn existing_dims(&self) -> Result<Option<usize>> {
        let path = format!("/collections/{}", self.collection);
        let response = self.send(self.request(reqwest::Method::GET, &path)).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "collection lookup failed ({status}): {body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))?;

        let size = json
            .pointer("/result/config/params/vectors/size")
            .and_then(|v| v.as_u64());

        match size {
            Some(s) => Ok(Some(s as usize)),
            None => Err(Error::Provider(
                "collection lookup returned no vector size".to_string(),
            )),
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn create_collection(&self, dims: usize) -> Result<()> {
        if let Some(existing) = self.existing_dims().await? {
            if existing != dims {
                return Err(Error::Provider(format!(
                    "collection '{}' has dimension {existing}, configured embedding has {dims}; \
                     refusing to mix embedding spaces",
                    self.collection
                )));
            }
            return Ok(());
        }

        let path = format!("/collections/{}", self.collection);
        let body = json!({
            "vectors": { "size": dims, "distance": "Cosine" }
        });

        let response = self
            .send(self.request(reqwest::Method::PUT, &path).json(&body))
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "failed to create collection ({status}): {text}"
            )));
        }

        Ok(())
    }

    async fn write(&self, documents: &[IndexedDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let points: Vec<serde_json::Value> = documents
            .iter()
            .map(|doc| {
                json!({
                    "id": point_id(&doc.id),
                    "vector": doc.embedding,
                    "payload": { "ticket_id": doc.id, "text": doc.text },
                })
            })
            .collect();

        let path = format!("/collections/{}/points?wait=true", self.collection);
        let response = self
            .send(
                self.request(reqwest::Method::PUT, &path)
                    .json(&json!({ "points": points })),
            )
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "failed to write points ({status}): {text}"
            )));
        }

        Ok(())
    }

    async fn nearest(&self, vector: &[f32], k: i64) -> Result<Vec<MatchResult>> {
        let path = format!("/collections/{}/points/search", self.collection);
        let body = json!({
            "vector": vector,
            "limit": k,
            "with_payload": true,
        });

        let response = self
            .send(self.request(reqwest::Method::POST, &path).json(&body))
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "search failed ({status}): {text}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::from_reqwest(e, self.timeout))?;

        let hits = json
            .get("result")
            .and_then(|r| r.as_array())
            .ok_or_else(|| Error::Provider("invalid search response: missing result".to_string()))?;

        let matches = hits
            .iter()
            .map(|hit| MatchResult {
                document_id: hit
                    .pointer("/payload/ticket_id")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                text: hit
                    .pointer("/payload/text")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                score: hit.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0) as f32,
            })
            .collect();

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> QdrantStore {
        QdrantStore::new(&StoreConfig {
            url: server.uri(),
            collection: "ticket_vectors".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn creates_missing_collection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/collections/ticket_vectors"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/collections/ticket_vectors"))
            .and(body_partial_json(serde_json::json!({
                "vectors": { "size": 768, "distance": "Cosine" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": true, "status": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).create_collection(768).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/collections/ticket_vectors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "config": { "params": { "vectors": { "size": 1536 } } } }
            })))
            .mount(&server)
            .await;

        let err = store_for(&server).create_collection(768).await.unwrap_err();
        assert!(err.to_string().contains("dimension"), "got: {err}");
    }

    #[tokio::test]
    async fn writes_points_with_payload() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/collections/ticket_vectors/points"))
            .and(query_param("wait", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "status": "completed" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let docs = vec![IndexedDocument {
            id: "PG-2024-002".to_string(),
            text: "ISSUE: division by zero".to_string(),
            embedding: vec![0.1, 0.2],
        }];
        store_for(&server).write(&docs).await.unwrap();
    }

    #[tokio::test]
    async fn parses_search_hits() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/collections/ticket_vectors/points/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {
                        "id": 17,
                        "score": 0.92,
                        "payload": { "ticket_id": "PG-2024-002", "text": "ISSUE: division by zero" }
                    },
                    { "id": 18, "score": 0.41, "payload": { "text": "ISSUE: other" } }
                ]
            })))
            .mount(&server)
            .await;

        let matches = store_for(&server).nearest(&[0.1, 0.2], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].document_id.as_deref(), Some("PG-2024-002"));
        assert!((matches[0].score - 0.92).abs() < 1e-6);
        assert_eq!(matches[1].document_id, None);
    }

    #[tokio::test]
    async fn search_failure_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/collections/ticket_vectors/points/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("storage offline"))
            .mount(&server)
            .await;

        let err = store_for(&server).nearest(&[0.1], 2).await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(err.to_string().contains("storage offline"));
    }
}
