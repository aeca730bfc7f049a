// Vector store - qdrant collection wrapper
use anyhow::{Context, Result};
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        vectors_config::Config, with_payload_selector::SelectorOptions, CreateCollection, Distance,
        PointStruct, ScrollPoints, SearchPoints, Value as QdrantValue, VectorParams, VectorsConfig,
        WithPayloadSelector,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

/// A chunk queued for storage
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, JsonValue>,
}

impl StoredChunk {
    /// Create a chunk with a fresh UUID
    pub fn new(text: String, embedding: Vec<f32>, metadata: HashMap<String, JsonValue>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            embedding,
            metadata,
        }
    }
}

/// A chunk returned from a similarity query or listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    /// Cosine similarity; 0.0 for plain listings
    pub score: f32,
    pub text: String,
    pub metadata: HashMap<String, JsonValue>,
}

/// Vector store over a single qdrant collection
pub struct VectorStore {
    client: QdrantClient,
    collection: String,
    dimension: u64,
}

impl VectorStore {
    /// Connect to qdrant and make sure the collection exists
    pub async fn connect(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .context("Failed to create qdrant client")?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension: dimension as u64,
        };

        store.ensure_collection().await?;

        Ok(store)
    }

    /// Create the collection (cosine distance) if it is missing
    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .context("Failed to list collections")?;
        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.collection.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(Config::Params(VectorParams {
                            size: self.dimension,
                            distance: Distance::Cosine.into(),
                            ..Default::default()
                        })),
                    }),
                    ..Default::default()
                })
                .await
                .context(format!("Failed to create collection: {}", self.collection))?;
        }

        Ok(())
    }

    /// Upsert a batch of chunks
    pub async fn add_batch(&self, chunks: Vec<StoredChunk>) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();

        let points: Vec<PointStruct> = chunks
            .into_iter()
            .map(|chunk| {
                let mut payload = HashMap::new();
                for (key, value) in chunk.metadata {
                    payload.insert(key, json_to_qdrant_value(value));
                }
                payload.insert("document".to_string(), QdrantValue::from(chunk.text));
                PointStruct::new(chunk.id, chunk.embedding, payload)
            })
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .context("Failed to upsert points")?;

        Ok(ids)
    }

    /// Query for the most similar chunks.
    ///
    /// Qdrant's cosine score is already a similarity in [0, 1]-ish range, so
    /// it is passed through unchanged. A threshold of 0.0 disables the cutoff.
    pub async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredChunk>> {
        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector: embedding.to_vec(),
                limit: top_k as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                score_threshold: if threshold > 0.0 { Some(threshold) } else { None },
                ..Default::default()
            })
            .await
            .context("Failed to search points")?;

        let results = search_result
            .result
            .into_iter()
            .map(|point| {
                let (text, metadata) = split_payload(point.payload);
                ScoredChunk {
                    id: point_id_to_string(&point.id),
                    score: point.score,
                    text,
                    metadata,
                }
            })
            .collect();

        Ok(results)
    }

    /// List stored chunks without ranking (scroll, no vectors)
    pub async fn list(&self, limit: usize) -> Result<Vec<ScoredChunk>> {
        let scroll_result = self
            .client
            .scroll(&ScrollPoints {
                collection_name: self.collection.clone(),
                limit: Some(scroll_limit(limit)),
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                ..Default::default()
            })
            .await
            .context("Failed to scroll collection")?;

        let results = scroll_result
            .result
            .into_iter()
            .map(|point| {
                let (text, metadata) = split_payload(point.payload);
                ScoredChunk {
                    id: point_id_to_string(&point.id),
                    score: 0.0,
                    text,
                    metadata,
                }
            })
            .collect();

        Ok(results)
    }

    /// Number of chunks currently stored
    pub async fn count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .context("Failed to get collection info")?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    /// Drop every chunk by deleting and recreating the collection
    pub async fn clear(&self) -> Result<()> {
        self.client
            .delete_collection(&self.collection)
            .await
            .context("Failed to delete collection")?;

        self.ensure_collection().await
    }

    /// Collection name this store writes to
    pub fn collection_name(&self) -> &str {
        &self.collection
    }
}

/// Saturate a listing limit into qdrant's u32 scroll limit
fn scroll_limit(limit: usize) -> u32 {
    u32::try_from(limit).unwrap_or(u32::MAX)
}

// Payload helpers: the chunk text lives beside its metadata under the
// reserved "document" key.

fn split_payload(
    payload: HashMap<String, QdrantValue>,
) -> (String, HashMap<String, JsonValue>) {
    let mut text = String::new();
    let mut metadata = HashMap::new();

    for (key, value) in payload {
        if key == "document" {
            if let Some(s) = qdrant_value_to_string(&value) {
                text = s;
            }
        } else if let Some(json_val) = qdrant_to_json_value(&value) {
            metadata.insert(key, json_val);
        }
    }

    (text, metadata)
}

fn json_to_qdrant_value(json: JsonValue) -> QdrantValue {
    match json {
        JsonValue::String(s) => QdrantValue::from(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                QdrantValue::from(i)
            } else if let Some(f) = n.as_f64() {
                QdrantValue::from(f)
            } else {
                QdrantValue::from(0)
            }
        }
        JsonValue::Bool(b) => QdrantValue::from(b),
        _ => QdrantValue::from(""),
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
            Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
            Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
            Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
            _ => None,
        }
    })
}

fn qdrant_value_to_string(value: &QdrantValue) -> Option<String> {
    value.kind.as_ref().and_then(|kind| {
        use qdrant_client::qdrant::value::Kind;
        match kind {
            Kind::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    })
}

fn point_id_to_string(point_id: &Option<qdrant_client::qdrant::PointId>) -> String {
    point_id
        .as_ref()
        .map(|id| {
            use qdrant_client::qdrant::point_id::PointIdOptions;
            match &id.point_id_options {
                Some(PointIdOptions::Num(n)) => n.to_string(),
                Some(PointIdOptions::Uuid(u)) => u.clone(),
                None => "unknown".to_string(),
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
}
