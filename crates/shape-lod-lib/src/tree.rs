//! Binary line generalization tree
//!
//! Stores every vertex of one ring tagged with the importance it held when the
//! builder evicted it. Querying with a threshold keeps the vertices at or above
//! it, always in original ring order, so the simplified ring only ever uses
//! whole original vertices.

use crate::VertexId;
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One vertex with the importance it was evicted at
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeEntry {
    pub vertex_id: VertexId,
    pub importance: f64,
    pub coord: Coord<f64>,
}

/// Importance index for a single ring or line part
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneralizationTree {
    /// Entries addressed by vertex id (original ring order)
    slots: Vec<Option<TreeEntry>>,
    /// Vertex ids in insertion order
    emission: Vec<VertexId>,
    /// Largest importance inserted so far (None while empty)
    max_importance: Option<f64>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GeneralizationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree sized for a ring of `vertices` points
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            slots: Vec::with_capacity(vertices),
            emission: Vec::with_capacity(vertices),
            max_importance: None,
        }
    }

    /// Record a vertex. Re-inserting an id replaces the earlier entry.
    pub fn insert(&mut self, vertex_id: VertexId, importance: f64, x: f64, y: f64) {
        if vertex_id >= self.slots.len() {
            self.slots.resize(vertex_id + 1, None);
        }

        let entry = TreeEntry {
            vertex_id,
            importance,
            coord: Coord { x, y },
        };
        if self.slots[vertex_id].replace(entry).is_some() {
            tracing::warn!("Vertex {vertex_id} inserted twice, replacing earlier entry");
            self.emission.retain(|id| *id != vertex_id);
            self.emission.push(vertex_id);
            self.max_importance = self.iter().map(|e| e.importance).reduce(f64::max);
            return;
        }

        self.emission.push(vertex_id);
        self.max_importance = Some(match self.max_importance {
            Some(max) => max.max(importance),
            None => importance,
        });
    }

    /// Number of vertices stored
    #[inline]
    pub fn len(&self) -> usize {
        self.emission.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.emission.is_empty()
    }

    /// Highest importance in the tree, the level of the residual vertices
    #[inline]
    pub fn max_importance(&self) -> Option<f64> {
        self.max_importance
    }

    pub fn get(&self, vertex_id: VertexId) -> Option<&TreeEntry> {
        self.slots.get(vertex_id)?.as_ref()
    }

    /// All entries in original ring order
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.slots.iter().flatten()
    }

    /// Vertex ids in the order they were inserted
    #[inline]
    pub fn emission_order(&self) -> &[VertexId] {
        &self.emission
    }

    /// Importances in the order they were inserted
    pub fn importances(&self) -> impl Iterator<Item = f64> + '_ {
        self.emission
            .iter()
            .filter_map(|id| self.get(*id).map(|e| e.importance))
    }

    /// Vertices with importance >= `threshold`, in original ring order.
    ///
    /// The threshold is capped at the tree's maximum importance, so even an
    /// infinite threshold still returns the residual vertices every level of
    /// detail needs.
    pub fn query(&self, threshold: f64) -> Vec<Coord<f64>> {
        self.retained(threshold).map(|e| e.coord).collect()
    }

    /// Like [`Self::query`] but returning vertex ids
    pub fn query_indices(&self, threshold: f64) -> Vec<VertexId> {
        self.retained(threshold).map(|e| e.vertex_id).collect()
    }

    fn retained(&self, threshold: f64) -> impl Iterator<Item = &TreeEntry> {
        let effective = match self.max_importance {
            Some(max) => threshold.min(max),
            None => threshold,
        };
        self.iter().filter(move |e| e.importance >= effective)
    }

    /// Threshold at which a query returns at least `count` vertices
    pub fn threshold_for_count(&self, count: usize) -> f64 {
        if count == 0 {
            return f64::INFINITY;
        }
        if count >= self.len() {
            return 0.0;
        }
        let mut importances: Vec<f64> = self.iter().map(|e| e.importance).collect();
        importances.sort_unstable_by(|a, b| b.total_cmp(a));
        importances[count - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> GeneralizationTree {
        // evicted out of ring order, the way a builder inserts
        let mut tree = GeneralizationTree::new();
        tree.insert(2, 1.0, 2.0, 0.0);
        tree.insert(0, 3.0, 0.0, 0.0);
        tree.insert(3, 10.0, 3.0, 1.0);
        tree.insert(1, 10.0, 1.0, 1.0);
        tree
    }

    #[test]
    fn test_query_zero_returns_everything_in_ring_order() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.query_indices(0.0), vec![0, 1, 2, 3]);
        assert_eq!(tree.query(0.0)[2], Coord { x: 2.0, y: 0.0 });
    }

    #[test]
    fn test_query_threshold_filters() {
        let tree = sample_tree();
        assert_eq!(tree.query_indices(2.0), vec![0, 1, 3]);
        assert_eq!(tree.query_indices(3.0), vec![0, 1, 3]);
        assert_eq!(tree.query_indices(5.0), vec![1, 3]);
    }

    #[test]
    fn test_infinite_threshold_returns_residual() {
        let tree = sample_tree();
        assert_eq!(tree.max_importance(), Some(10.0));
        assert_eq!(tree.query_indices(f64::INFINITY), vec![1, 3]);
    }

    #[test]
    fn test_emission_order_preserved() {
        let tree = sample_tree();
        assert_eq!(tree.emission_order(), &[2, 0, 3, 1]);
        assert_eq!(
            tree.importances().collect::<Vec<_>>(),
            vec![1.0, 3.0, 10.0, 10.0]
        );
    }

    #[test]
    fn test_threshold_for_count() {
        let tree = sample_tree();
        assert_eq!(tree.threshold_for_count(0), f64::INFINITY);
        assert_eq!(tree.threshold_for_count(2), 10.0);
        assert_eq!(tree.query_indices(tree.threshold_for_count(3)).len(), 3);
        assert_eq!(tree.threshold_for_count(4), 0.0);
        assert_eq!(tree.threshold_for_count(10), 0.0);
    }

    #[test]
    fn test_duplicate_insert_replaces() {
        let mut tree = sample_tree();
        tree.insert(3, 0.5, 3.0, 1.0);

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(3).unwrap().importance, 0.5);
        assert_eq!(tree.emission_order(), &[2, 0, 1, 3]);
        assert_eq!(tree.max_importance(), Some(10.0));
    }

    #[test]
    fn test_empty_tree() {
        let tree = GeneralizationTree::new();
        assert!(tree.is_empty());
        assert!(tree.query(0.0).is_empty());
        assert!(tree.query(f64::INFINITY).is_empty());
        assert!(tree.max_importance().is_none());
    }
}
