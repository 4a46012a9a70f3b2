//! Exact (flat) nearest-neighbour index over dense embeddings.
//!
//! Rows are addressed by insertion position, so row `i` pairs with corpus
//! chunk `i`. The index is immutable; a new corpus means a new index.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use docqa_core::config::Metric;
use docqa_core::error::{Error, Result};

pub mod distance;

use distance::{cosine_distance, euclidean_distance_squared, magnitude};

/// One search result: a row id and its distance to the query (smaller is closer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f32,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Neighbor {
    // Total order: distance first, then row id so equal distances keep insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance).then_with(|| self.row.cmp(&other.row))
    }
}

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    rows: usize,
    metric: Metric,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl FlatIndex {
    /// Build from row vectors. All rows must share one length; an empty input
    /// yields an empty index.
    pub fn build(vectors: &[Vec<f32>], metric: Metric) -> Result<Self> {
        let dim = vectors.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(vectors.len() * dim);
        for (row, v) in vectors.iter().enumerate() {
            if v.len() != dim {
                return Err(Error::DimensionMismatch { what: format!("row {row}"), expected: dim, found: v.len() });
            }
            data.extend_from_slice(v);
        }
        let norms = match metric {
            Metric::Cosine => vectors.iter().map(|v| magnitude(v)).collect(),
            Metric::L2 => Vec::new(),
        };
        debug!(rows = vectors.len(), dim, ?metric, "Built flat index");
        Ok(Self { dim, rows: vectors.len(), metric, data, norms })
    }

    pub fn len(&self) -> usize { self.rows }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn dim(&self) -> usize { self.dim }

    pub fn metric(&self) -> Metric { self.metric }

    fn row(&self, i: usize) -> &[f32] { &self.data[i * self.dim..(i + 1) * self.dim] }

    /// The `k` nearest rows in ascending distance; `k` is clamped to `len()`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { what: "query".to_string(), expected: self.dim, found: query.len() });
        }
        let query_norm = match self.metric {
            Metric::Cosine => magnitude(query),
            Metric::L2 => 0.0,
        };

        // Max-heap of the k best seen so far; the root is the current worst.
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);
        for row in 0..self.len() {
            let distance = match self.metric {
                Metric::L2 => euclidean_distance_squared(query, self.row(row)),
                Metric::Cosine => cosine_distance(query, self.row(row), query_norm, self.norms[row]),
            };
            let candidate = Neighbor { row, distance };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }
        Ok(heap.into_sorted_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_distances_keep_row_order() {
        let index = FlatIndex::build(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]], Metric::L2).expect("build");
        let hits = index.search(&[1.0, 0.0], 3).expect("search");
        let rows: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![0, 2, 1]);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let index = FlatIndex::build(&[vec![10.0, 0.0], vec![0.5, 0.5]], Metric::Cosine).expect("build");
        let hits = index.search(&[1.0, 0.0], 1).expect("search");
        assert_eq!(hits[0].row, 0);
        assert!(hits[0].distance.abs() < 1e-6);
    }
}
