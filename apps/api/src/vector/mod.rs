//! Vector store: embedding storage and nearest-neighbor retrieval over a
//! flat collection.
//!
//! Retrieval is an exhaustive O(n·d) cosine scan — correctness over scale.
//! The trait is the replaceable seam: a production-scale index swaps in
//! behind `VectorStore` without touching any caller, since the contract is
//! retrieval-by-score, not an index structure.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Corpus type tags used by the matching engine.
pub const TYPE_ROLE_BENCHMARK: &str = "role_benchmark";
pub const TYPE_SKILL_MAPPING: &str = "skill_mapping";
/// Self-embeddings maintained on entity writes.
pub const TYPE_ROLE: &str = "role";
pub const TYPE_CANDIDATE: &str = "candidate";

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("vector storage fault: {0}")]
    Storage(String),
}

/// One retrieval hit, highest-similarity first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Value,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Idempotent upsert keyed by `vector_id`.
    async fn store(
        &self,
        vector_id: &str,
        vector: Vec<f32>,
        metadata: Value,
    ) -> Result<(), VectorStoreError>;

    /// Removes if present; `false` (not an error) when absent.
    async fn delete(&self, vector_id: &str) -> Result<bool, VectorStoreError>;

    /// Scores every record matching `type_filter` (all records if unset)
    /// against `query_vector` and returns the `top_k` by descending cosine
    /// similarity. Ties break by original storage order.
    async fn query(
        &self,
        query_vector: &[f32],
        top_k: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<VectorMatch>, VectorStoreError>;
}

/// Cosine similarity; defined as 0 when either norm is 0 (no division by
/// zero) and when dimensions disagree.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

struct StoredVector {
    vector_id: String,
    vector: Vec<f32>,
    metadata: Value,
    kind: String,
}

/// In-memory reference implementation. A `Vec` preserves insertion order,
/// which is what makes tie-breaking stable; upserts replace in place so a
/// re-stored vector keeps its original slot.
pub struct MemVectorStore {
    records: RwLock<Vec<StoredVector>>,
}

impl MemVectorStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_of(metadata: &Value) -> String {
    metadata
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

#[async_trait]
impl VectorStore for MemVectorStore {
    async fn store(
        &self,
        vector_id: &str,
        vector: Vec<f32>,
        metadata: Value,
    ) -> Result<(), VectorStoreError> {
        let kind = kind_of(&metadata);
        let record = StoredVector {
            vector_id: vector_id.to_string(),
            vector,
            metadata,
            kind,
        };
        let mut records = self
            .records
            .write()
            .map_err(|e| VectorStoreError::Storage(e.to_string()))?;
        match records.iter_mut().find(|r| r.vector_id == vector_id) {
            Some(existing) => {
                *existing = record;
                info!(vector_id, "updated vector");
            }
            None => {
                records.push(record);
                info!(vector_id, "stored vector");
            }
        }
        Ok(())
    }

    async fn delete(&self, vector_id: &str) -> Result<bool, VectorStoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| VectorStoreError::Storage(e.to_string()))?;
        let before = records.len();
        records.retain(|r| r.vector_id != vector_id);
        if records.len() < before {
            info!(vector_id, "deleted vector");
            Ok(true)
        } else {
            warn!(vector_id, "vector not found");
            Ok(false)
        }
    }

    async fn query(
        &self,
        query_vector: &[f32],
        top_k: usize,
        type_filter: Option<&str>,
    ) -> Result<Vec<VectorMatch>, VectorStoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| VectorStoreError::Storage(e.to_string()))?;
        let mut scored: Vec<VectorMatch> = records
            .iter()
            .filter(|r| type_filter.map_or(true, |t| r.kind == t))
            .map(|r| VectorMatch {
                id: r.vector_id.clone(),
                score: cosine_similarity(query_vector, &r.vector),
                metadata: r.metadata.clone(),
            })
            .collect();
        // Stable sort: equal scores keep storage order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cosine_is_symmetric() {
        let a = [1.0, 2.0, 3.0];
        let b = [-2.0, 0.5, 4.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn cosine_of_self_is_one() {
        let a = [0.3, -1.2, 4.5];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        let a = [1.0, 2.0];
        let zero = [0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn cosine_with_mismatched_dims_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[tokio::test]
    async fn query_returns_at_most_top_k_sorted_descending() {
        let store = MemVectorStore::new();
        store
            .store("a", vec![1.0, 0.0], json!({"type": "role_benchmark"}))
            .await
            .unwrap();
        store
            .store("b", vec![0.7, 0.7], json!({"type": "role_benchmark"}))
            .await
            .unwrap();
        store
            .store("c", vec![0.0, 1.0], json!({"type": "role_benchmark"}))
            .await
            .unwrap();

        let results = store.query(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "b");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn query_respects_type_filter() {
        let store = MemVectorStore::new();
        store
            .store("bench", vec![1.0, 0.0], json!({"type": "role_benchmark"}))
            .await
            .unwrap();
        store
            .store("skill", vec![1.0, 0.0], json!({"type": "skill_mapping"}))
            .await
            .unwrap();

        let results = store
            .query(&[1.0, 0.0], 10, Some("skill_mapping"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "skill");
    }

    #[tokio::test]
    async fn ties_break_by_storage_order() {
        let store = MemVectorStore::new();
        store
            .store("first", vec![1.0, 0.0], json!({}))
            .await
            .unwrap();
        store
            .store("second", vec![1.0, 0.0], json!({}))
            .await
            .unwrap();

        let results = store.query(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(results[0].id, "first");
        assert_eq!(results[1].id, "second");
    }

    #[tokio::test]
    async fn store_is_idempotent_upsert_preserving_slot() {
        let store = MemVectorStore::new();
        store.store("x", vec![1.0, 0.0], json!({})).await.unwrap();
        store.store("y", vec![1.0, 0.0], json!({})).await.unwrap();
        // Re-store "x": still one record per id, still first in order.
        store.store("x", vec![0.9, 0.1], json!({})).await.unwrap();

        let results = store.query(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "x");
    }

    #[tokio::test]
    async fn delete_reports_not_found_without_failing() {
        let store = MemVectorStore::new();
        store.store("x", vec![1.0], json!({})).await.unwrap();
        assert!(store.delete("x").await.unwrap());
        assert!(!store.delete("x").await.unwrap());
    }

    #[tokio::test]
    async fn missing_type_tag_defaults_to_unknown() {
        let store = MemVectorStore::new();
        store.store("x", vec![1.0], json!({})).await.unwrap();
        let results = store.query(&[1.0], 10, Some("unknown")).await.unwrap();
        assert_eq!(results.len(), 1);
    }
}
