//! Brute-force cosine index over embedded payloads.
//!
//! One article yields tens of chunks and the router holds two tools, so a
//! linear scan is all either needs. The payload is generic: chunks for the
//! vector tool, tool positions for the router.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::error::IndexError;

/// A payload scored against a query embedding.
#[derive(Debug, Clone)]
pub struct SearchHit<T> {
    pub id: Uuid,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f64,
    pub payload: T,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    embedding: Vec<f32>,
    payload: T,
    /// Tie-breaker: earlier inserts rank first on equal scores.
    seq: u64,
}

#[derive(Debug)]
struct Slots<T> {
    by_id: HashMap<Uuid, Slot<T>>,
    next_seq: u64,
}

/// Shared, lock-guarded embedding store. Clones see the same slots.
#[derive(Debug, Clone)]
pub struct VectorIndex<T> {
    slots: Arc<RwLock<Slots<T>>>,
}

impl<T: Clone> VectorIndex<T> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots {
                by_id: HashMap::new(),
                next_seq: 0,
            })),
        }
    }

    /// Store `payload` under `id`, replacing whatever `id` held before.
    pub fn insert(&self, id: Uuid, embedding: Vec<f32>, payload: T) -> Result<(), IndexError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|e| IndexError::Storage(format!("Lock poisoned: {}", e)))?;
        let seq = slots.next_seq;
        slots.next_seq += 1;
        slots.by_id.insert(
            id,
            Slot {
                embedding,
                payload,
                seq,
            },
        );
        Ok(())
    }

    /// The `k` best matches for `query`, best first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<T>>, IndexError> {
        let slots = self
            .slots
            .read()
            .map_err(|e| IndexError::Storage(format!("Lock poisoned: {}", e)))?;

        let mut ranked: Vec<(u64, SearchHit<T>)> = slots
            .by_id
            .iter()
            .map(|(id, slot)| {
                let hit = SearchHit {
                    id: *id,
                    score: cosine_similarity(query, &slot.embedding),
                    payload: slot.payload.clone(),
                };
                (slot.seq, hit)
            })
            .collect();

        ranked.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });
        ranked.truncate(k);

        Ok(ranked.into_iter().map(|(_, hit)| hit).collect())
    }

    pub fn len(&self) -> usize {
        self.slots.read().map(|s| s.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for VectorIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 0.0 when the lengths differ or either side has no magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |acc, (x, y)| {
        let (x, y) = (f64::from(*x), f64::from(*y));
        (acc.0 + x * y, acc.1 + x * x, acc.2 + y * y)
    });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_index(chunks: &[(&'static str, [f32; 3])]) -> VectorIndex<&'static str> {
        let index = VectorIndex::new();
        for (text, embedding) in chunks {
            index.insert(Uuid::new_v4(), embedding.to_vec(), *text).unwrap();
        }
        index
    }

    #[test]
    fn test_nearest_chunk_ranks_first() {
        let index = chunk_index(&[
            ("Snowflake was founded in 2012.", [0.0, 1.0, 0.0]),
            ("Snowflake listed on the NYSE in 2020.", [1.0, 0.1, 0.0]),
            ("Headquarters moved to Bozeman.", [0.0, 0.0, 1.0]),
        ]);

        let hits = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload, "Snowflake listed on the NYSE in 2020.");
        assert!(hits[0].score > 0.99);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let index = VectorIndex::new();
        for position in 0..6usize {
            index.insert(Uuid::new_v4(), vec![0.5, 0.5], position).unwrap();
        }
        let order: Vec<usize> = index
            .search(&[0.5, 0.5], 6)
            .unwrap()
            .into_iter()
            .map(|hit| hit.payload)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_top_k_truncates_and_empty_index_returns_nothing() {
        let empty: VectorIndex<usize> = VectorIndex::default();
        assert!(empty.is_empty());
        assert!(empty.search(&[1.0, 0.0], 2).unwrap().is_empty());

        let index = chunk_index(&[
            ("a", [1.0, 0.0, 0.0]),
            ("b", [0.9, 0.1, 0.0]),
            ("c", [0.8, 0.2, 0.0]),
        ]);
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().len(), 0);
    }

    #[test]
    fn test_reinsert_replaces_payload() {
        let index = VectorIndex::new();
        let id = Uuid::new_v4();
        index.insert(id, vec![1.0, 0.0], "draft").unwrap();
        index.insert(id, vec![0.0, 1.0], "final").unwrap();
        assert_eq!(index.len(), 1);
        let hits = index.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!((hits[0].id, hits[0].payload), (id, "final"));
    }

    #[test]
    fn test_clones_observe_later_inserts() {
        let index: VectorIndex<&str> = VectorIndex::new();
        let shared = index.clone();
        index.insert(Uuid::new_v4(), vec![1.0], "tool").unwrap();
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert!((cosine_similarity(&[2.0, 2.0], &[1.0, 1.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[1.0, 1.0, 1.0]), 0.0);
    }
}
