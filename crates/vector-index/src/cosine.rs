use crate::error::{Result, VectorIndexError};
use std::collections::HashMap;

/// Brute-force cosine-similarity index over `String`-keyed vectors.
///
/// The real collection engine (Qdrant or similar) lives behind the
/// [`crate::VectorStore`] port; this is the default in-process adapter,
/// adequate for the tool catalogs this router indexes (typically low
/// thousands of tools, not millions).
#[derive(Debug, Clone, Default)]
pub struct CosineIndex {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl CosineIndex {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn upsert(&mut self, id: String, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.insert(id, vector);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) {
        self.vectors.remove(id);
    }

    /// Search for the `k` nearest neighbors to `query`, restricted to
    /// `candidate_ids` (the result of applying the caller's filter),
    /// sorted by cosine similarity descending.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        candidate_ids: &[String],
    ) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scores: Vec<(String, f32)> = candidate_ids
            .iter()
            .filter_map(|id| self.vectors.get(id).map(|v| (id.clone(), cosine_similarity(query, v))))
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);
        Ok(scores)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.vectors.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_highest() {
        let mut index = CosineIndex::new(3);
        index.upsert("a".into(), vec![1.0, 0.0, 0.0]).unwrap();
        index.upsert("b".into(), vec![0.9, 0.1, 0.0]).unwrap();
        index.upsert("c".into(), vec![0.0, 1.0, 0.0]).unwrap();

        let ids: Vec<String> = index.ids().cloned().collect();
        let results = index.search(&[1.0, 0.0, 0.0], 2, &ids).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert!((results[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = CosineIndex::new(3);
        assert!(index.upsert("a".into(), vec![1.0, 0.0]).is_err());
    }

    #[test]
    fn search_is_restricted_to_candidate_ids() {
        let mut index = CosineIndex::new(2);
        index.upsert("a".into(), vec![1.0, 0.0]).unwrap();
        index.upsert("b".into(), vec![1.0, 0.0]).unwrap();
        let results = index.search(&[1.0, 0.0], 10, &["a".to_string()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
    }
}
