//! Circular vertex chain used while building generalization trees
//!
//! The chain is an arena: every vertex lives in a `Vec` slot addressed by its
//! original index in the ring, and `next`/`prev` are slot indices. Unlinking a
//! vertex rewrites two indices; the slot itself stays so its data can be handed
//! to the tree builder.

use geo::{Area, Coord, Rect, Triangle};

/// Stable vertex identity: the index of the vertex in its source ring.
/// Doubles as the handle into the chain.
pub type VertexId = usize;

#[derive(Clone, Copy, Debug)]
struct Link {
    coord: Coord<f64>,
    importance: f64,
    next: VertexId,
    prev: VertexId,
}

/// A vertex that has been unlinked from the chain
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemovedVertex {
    pub vertex_id: VertexId,
    /// Cached importance at the moment of removal. This is the triangle area
    /// unless the importance was last set through
    /// [`VertexChain::validate_importance_at_least`], in which case it may have
    /// been raised to that floor.
    pub importance: f64,
    pub coord: Coord<f64>,
}

/// Circular doubly-linked list of ring vertices with cached importance
#[derive(Clone, Debug)]
pub struct VertexChain {
    links: Vec<Link>,
    /// Importance cache validity, one flag per slot
    valid: Vec<bool>,
    /// Membership, one flag per slot
    live: Vec<bool>,
    head: Option<VertexId>,
    len: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl VertexChain {
    /// Link `points` into a cycle in the given order.
    ///
    /// Vertex ids are the input indices and every importance starts invalid.
    /// One- and two-point rings are accepted as they are.
    pub fn from_ring<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let coords: Vec<Coord<f64>> = points.into_iter().collect();
        let n = coords.len();
        let links = coords
            .into_iter()
            .enumerate()
            .map(|(i, coord)| Link {
                coord,
                importance: 0.0,
                next: (i + 1) % n,
                prev: (i + n - 1) % n,
            })
            .collect();

        Self {
            links,
            valid: vec![false; n],
            live: vec![true; n],
            head: (n > 0).then_some(0),
            len: n,
        }
    }

    /// Number of vertices still linked
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Any live vertex, kept valid across removals
    #[inline]
    pub fn head(&self) -> Option<VertexId> {
        self.head
    }

    #[inline]
    pub fn contains(&self, id: VertexId) -> bool {
        self.live.get(id).copied().unwrap_or(false)
    }

    #[inline]
    pub fn next(&self, id: VertexId) -> VertexId {
        self.links[id].next
    }

    #[inline]
    pub fn prev(&self, id: VertexId) -> VertexId {
        self.links[id].prev
    }

    #[inline]
    pub fn coord(&self, id: VertexId) -> Coord<f64> {
        self.links[id].coord
    }

    /// Cached importance; only meaningful while [`Self::is_importance_valid`]
    #[inline]
    pub fn importance(&self, id: VertexId) -> f64 {
        self.links[id].importance
    }

    #[inline]
    pub fn is_importance_valid(&self, id: VertexId) -> bool {
        self.valid[id]
    }

    /// Mark the cached importance of `id` stale
    #[inline]
    pub fn invalidate(&mut self, id: VertexId) {
        self.valid[id] = false;
    }

    /// Recompute the importance of `id` if it is stale
    pub fn validate_importance(&mut self, id: VertexId) {
        self.validate_importance_at_least(id, 0.0);
    }

    /// Recompute a stale importance, raising it to at least `floor`.
    ///
    /// The floor lets a builder keep eviction order non-decreasing: a vertex
    /// never becomes cheaper to remove than a vertex already removed.
    pub fn validate_importance_at_least(&mut self, id: VertexId, floor: f64) {
        if self.valid[id] {
            return;
        }
        self.links[id].importance = self.triangle_area(id).max(floor);
        self.valid[id] = true;
    }

    /// Area of the triangle formed with the current neighbours.
    ///
    /// Collapses to zero once fewer than three vertices remain, because the
    /// two neighbours (or the vertex itself) coincide.
    fn triangle_area(&self, id: VertexId) -> f64 {
        let link = &self.links[id];
        let prev = self.links[link.prev].coord;
        let next = self.links[link.next].coord;
        Triangle::new(prev, link.coord, next).unsigned_area()
    }

    /// Unlink `id`, invalidating both neighbours.
    ///
    /// # Panics
    /// If `id` is not in the chain.
    pub fn remove(&mut self, id: VertexId) -> RemovedVertex {
        assert!(self.contains(id), "vertex {id} is not in the chain");

        let Link {
            coord,
            importance,
            next,
            prev,
        } = self.links[id];
        self.links[prev].next = next;
        self.links[next].prev = prev;
        self.live[id] = false;
        self.valid[id] = false;
        self.valid[prev] = false;
        self.valid[next] = false;
        self.len -= 1;

        self.head = match self.len {
            0 => None,
            _ if self.head == Some(id) => Some(next),
            _ => self.head,
        };

        RemovedVertex {
            vertex_id: id,
            importance,
            coord,
        }
    }

    /// Walk the cycle once starting from the head
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            chain: self,
            current: self.head,
            remaining: self.len,
        }
    }

    /// Bounding rectangle of the live vertices
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        let mut ids = self.iter();
        let first = self.coord(ids.next()?);
        let (min, max) = ids.fold((first, first), |(min, max), id| {
            let c = self.coord(id);
            (
                Coord {
                    x: min.x.min(c.x),
                    y: min.y.min(c.y),
                },
                Coord {
                    x: max.x.max(c.x),
                    y: max.y.max(c.y),
                },
            )
        });
        Some(Rect::new(min, max))
    }
}

/// Iterator over live vertex ids in chain order
pub struct ChainIter<'a> {
    chain: &'a VertexChain,
    current: Option<VertexId>,
    remaining: usize,
}

impl Iterator for ChainIter<'_> {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        self.current = Some(self.chain.next(id));
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ChainIter<'_> {}
