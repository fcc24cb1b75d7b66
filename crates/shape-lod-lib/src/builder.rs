//! Generalization tree construction
//!
//! Two strategies consume a [`VertexChain`] and feed every vertex into a
//! [`GeneralizationTree`]:
//!
//! - **Sort**: greedy Visvalingam-style eviction. Each pass validates stale
//!   importances, stable-sorts the live vertices, and evicts in order every
//!   vertex whose importance is still valid. Vertices left at the structural
//!   floor are flushed with the ring's maximum importance.
//! - **Sample**: walk the chain with a fixed stride and evict every
//!   `interval`-th vertex. Linear time, no ordering guarantee.

use crate::{GeneralizationTree, VertexChain, VertexId};
use geo::Rect;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stride used by [`BuildMethod::Sample`] when none is given
pub const DEFAULT_SAMPLE_INTERVAL: usize = 3;

/// Vertices kept by the sort strategy for lines
pub const LINE_FLOOR: usize = 2;

/// Vertices kept by the sort strategy when polygons must stay rings
pub const POLYGON_FLOOR: usize = 3;

/// Tree construction strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BuildMethod {
    /// Importance-sorted eviction (quality optimized)
    #[default]
    Sort,
    /// Fixed-stride eviction (cost optimized)
    Sample { interval: usize },
}

impl BuildMethod {
    pub fn sample() -> Self {
        BuildMethod::Sample {
            interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// Build `output` from `chain` with the given strategy
pub fn build_tree(chain: VertexChain, output: &mut GeneralizationTree, method: BuildMethod) {
    match method {
        BuildMethod::Sort => build_sorted(chain, output),
        BuildMethod::Sample { interval } => build_sampled(chain, output, interval),
    }
}

/// Importance given to the vertices that survive to the floor.
///
/// Area of the bounding box, or the squared half-perimeter when the box is
/// flat, or infinity for a single coincident point.
pub fn max_importance(bounds: Rect<f64>) -> f64 {
    let area = bounds.width() * bounds.height();
    if area > 0.0 {
        return area;
    }
    let length = bounds.width() + bounds.height();
    if length > 0.0 {
        length * length
    } else {
        f64::INFINITY
    }
}

/// Sort strategy with the line floor of two vertices
pub fn build_sorted(chain: VertexChain, output: &mut GeneralizationTree) {
    build_sorted_with_floor(chain, output, LINE_FLOOR);
}

/// Sort strategy keeping at least `floor` vertices before the residual flush
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn build_sorted_with_floor(mut chain: VertexChain, output: &mut GeneralizationTree, floor: usize) {
    let Some(bounds) = chain.bounding_rect() else {
        return;
    };
    let starting_len = chain.len();
    let max_importance = max_importance(bounds);

    // Highest importance evicted so far; recomputed importances never drop below it
    let mut high_water = 0.0_f64;
    let mut order: Vec<VertexId> = Vec::with_capacity(starting_len);
    let mut passes = 0usize;

    while chain.len() > floor {
        passes += 1;
        order.clear();
        order.extend(chain.iter());
        for &id in &order {
            chain.validate_importance_at_least(id, high_water);
        }
        // stable: ties keep chain order
        order.sort_by(|a, b| chain.importance(*a).total_cmp(&chain.importance(*b)));

        for &id in &order {
            if chain.len() <= floor {
                break;
            }
            // a neighbour was evicted earlier in this pass
            if !chain.is_importance_valid(id) {
                continue;
            }
            let removed = chain.remove(id);
            high_water = high_water.max(removed.importance);
            output.insert(
                removed.vertex_id,
                removed.importance,
                removed.coord.x,
                removed.coord.y,
            );
        }
    }

    let residual = max_importance.max(high_water);
    if residual > max_importance {
        tracing::debug!(
            "Eviction importance {} exceeded ring maximum {}, raising residual level",
            high_water,
            max_importance
        );
    }
    let residual_count = chain.len();
    while let Some(id) = chain.head() {
        let removed = chain.remove(id);
        output.insert(removed.vertex_id, residual, removed.coord.x, removed.coord.y);
    }

    tracing::trace!(
        "Sorted build: {} vertices, {} passes, {} residual at {}",
        starting_len,
        passes,
        residual_count,
        residual
    );
}

/// Sample strategy: evict every `interval`-th vertex until the chain is empty.
///
/// An interval of zero is treated as one.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn build_sampled(mut chain: VertexChain, output: &mut GeneralizationTree, interval: usize) {
    let Some(mut vertex) = chain.head() else {
        return;
    };
    let interval = interval.max(1);

    while !chain.is_empty() {
        for _ in 0..interval - 1 {
            vertex = chain.next(vertex);
        }
        let target = chain.next(vertex);
        chain.validate_importance(target);
        let removed = chain.remove(target);
        output.insert(
            removed.vertex_id,
            removed.importance,
            removed.coord.x,
            removed.coord.y,
        );
    }
}
