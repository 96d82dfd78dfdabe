//! Text embeddings for description matching.
//!
//! The aligner never talks to an embedding provider directly: it is handed an
//! [`Embedder`]. [`TrigramEmbedder`] is a deterministic, dependency-free
//! implementation useful offline and in tests; service-backed embedders
//! implement the same trait.

use crate::error::EmbeddingError;
use crate::utils::normalize_text;

/// Default vector length of [`TrigramEmbedder`].
pub const DEFAULT_TRIGRAM_DIMENSION: usize = 256;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A provider of fixed-length text embeddings.
pub trait Embedder {
    /// Embeds a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds several texts at once, returning one vector per input in order.
    ///
    /// The default calls [`Embedder::embed`] for each text and fails on the
    /// first error. Providers with a batch endpoint should override it.
    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Distance between two embeddings. Defaults to cosine distance.
    fn distance(&self, left: &[f32], right: &[f32]) -> Result<f64, EmbeddingError> {
        cosine_distance(left, right)
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_many(texts)
    }

    fn distance(&self, left: &[f32], right: &[f32]) -> Result<f64, EmbeddingError> {
        (**self).distance(left, right)
    }
}

/// Cosine distance `1 - cos(left, right)`, in `[0, 2]`.
pub fn cosine_distance(left: &[f32], right: &[f32]) -> Result<f64, EmbeddingError> {
    if left.len() != right.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut left_norm = 0.0f64;
    let mut right_norm = 0.0f64;
    for (&l, &r) in left.iter().zip(right) {
        let (l, r) = (f64::from(l), f64::from(r));
        dot += l * r;
        left_norm += l * l;
        right_norm += r * r;
    }
    if left_norm == 0.0 || right_norm == 0.0 {
        return Err(EmbeddingError::ZeroVector);
    }

    let cosine = (dot / (left_norm.sqrt() * right_norm.sqrt())).clamp(-1.0, 1.0);
    Ok(1.0 - cosine)
}

/// Hashes character trigrams of the normalized text into a fixed-size,
/// L2-normalized count vector.
///
/// Texts sharing many trigrams end up close under cosine distance; identical
/// texts (after normalization) get identical vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrigramEmbedder {
    dimension: usize,
}

impl TrigramEmbedder {
    /// Creates an embedder producing vectors of `dimension` components (at least 1).
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for TrigramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGRAM_DIMENSION)
    }
}

impl Embedder for TrigramEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let padded: Vec<char> = format!(" {normalized} ").chars().collect();
        let mut vector = vec![0.0f32; self.dimension];
        for trigram in padded.windows(3) {
            let slot = (fnv1a(trigram) % self.dimension as u64) as usize;
            vector[slot] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        for value in &mut vector {
            *value /= norm;
        }
        Ok(vector)
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut buf = [0u8; 4];
    for ch in chars {
        for byte in ch.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_has_zero_distance() {
        let embedder = TrigramEmbedder::default();
        let a = embedder.embed("Age of the host in years").unwrap();
        let b = embedder.embed("age of the  host in years").unwrap();
        assert_eq!(a.len(), DEFAULT_TRIGRAM_DIMENSION);
        assert!(embedder.distance(&a, &b).unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_related_text_is_closer() {
        let embedder = TrigramEmbedder::default();
        let age = embedder.embed("host age in years").unwrap();
        let age2 = embedder.embed("age of host, years").unwrap();
        let site = embedder.embed("sampling body site").unwrap();
        assert!(cosine_distance(&age, &age2).unwrap() < cosine_distance(&age, &site).unwrap());
    }

    #[test]
    fn test_empty_text_fails() {
        let embedder = TrigramEmbedder::new(16);
        assert_eq!(embedder.embed("  "), Err(EmbeddingError::EmptyText));
    }

    #[test]
    fn test_cosine_distance_errors() {
        assert!(matches!(
            cosine_distance(&[1.0, 0.0], &[1.0]),
            Err(EmbeddingError::DimensionMismatch { left: 2, right: 1 })
        ));
        assert_eq!(
            cosine_distance(&[0.0, 0.0], &[1.0, 0.0]),
            Err(EmbeddingError::ZeroVector)
        );
        let opposite = cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert!((opposite - 2.0).abs() < 1e-12);
    }
}
