//! Embedding function consumed by vector-store callers.
//!
//! The contract is deterministic: identical input text yields an identical
//! fixed-length vector. The default backend is a signed feature-hashing
//! embedder — no model service required, fully reproducible in tests. A
//! model-backed implementation slots in behind the same trait.

/// Fixed embedding dimensionality for every vector in the store.
pub const EMBEDDING_DIM: usize = 384;

pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Bag-of-words feature hashing: each lowercase alphanumeric token is
/// FNV-1a hashed into a bucket with a hash-derived sign, then the vector
/// is L2-normalized.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dim: EMBEDDING_DIM }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_is_deterministic() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("Senior Rust Engineer, distributed systems");
        let b = embedder.embed("Senior Rust Engineer, distributed systems");
        assert_eq!(a, b);
    }

    #[test]
    fn embed_has_fixed_dimension() {
        let embedder = HashEmbedder::new();
        assert_eq!(embedder.embed("python fastapi").len(), EMBEDDING_DIM);
        assert_eq!(embedder.embed("").len(), EMBEDDING_DIM);
    }

    #[test]
    fn embed_is_unit_length_for_nonempty_text() {
        let embedder = HashEmbedder::new();
        let v = embedder.embed("kubernetes aws terraform");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn embed_of_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new();
        assert!(embedder.embed("  ,;  ").iter().all(|&x| x == 0.0));
    }

    #[test]
    fn different_texts_embed_differently() {
        let embedder = HashEmbedder::new();
        assert_ne!(
            embedder.embed("frontend react javascript"),
            embedder.embed("backend postgres rust")
        );
    }
}
