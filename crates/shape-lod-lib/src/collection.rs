//! ShapeCollection - Top-level manager for decoded records and their trees
//!
//! This module provides the high-level API: decode a shapefile held in memory,
//! build one generalization tree per ring in parallel, and answer
//! level-of-detail queries.

use crate::builder::{self, BuildMethod, LINE_FLOOR, POLYGON_FLOOR};
use crate::{
    ByteCursor, GeneralizationTree, RecordReader, Result, Shape, ShapeHeader, ShapeRecord,
    ShapeType, VertexChain, utils,
};

use geo::{Coord, Intersects, Rect};
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for tree construction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Strategy used for every ring
    pub method: BuildMethod,
    /// Keep three vertices instead of two for polygon rings (sort strategy only)
    pub polygon_floor: bool,
}

/// Summary of a collection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    pub shape_type: ShapeType,
    pub record_count: usize,
    /// Number of rings/parts with a tree
    pub ring_count: usize,
    /// Vertices across all trees
    pub vertex_count: usize,
}

/// Tree for one ring of one record
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RingTree {
    /// Index into [`ShapeCollection::records`]
    pub record_index: usize,
    /// Index of the ring/part within the record
    pub ring_index: usize,
    pub tree: GeneralizationTree,
}

/// One record simplified to a threshold
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimplifiedShape {
    pub record_number: i32,
    pub shape_type: ShapeType,
    /// Simplified rings/parts, index-aligned with the record's rings (empty
    /// rings stay empty); point shapes carry their points unchanged as one part
    pub parts: Vec<Vec<Coord<f64>>>,
}

/// Decoded shapefile with a generalization tree per ring
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeCollection {
    header: ShapeHeader,
    records: Vec<ShapeRecord>,
    /// Sorted by (record_index, ring_index)
    trees: Vec<RingTree>,
    config: Config,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ShapeCollection {
    /// Decode `data` and build every tree.
    ///
    /// Fails on an invalid header or the first malformed record.
    pub fn from_bytes(data: &[u8], config: Config) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::from_bytes");

        let mut cursor = ByteCursor::new(data);
        let header = ShapeHeader::decode(&mut cursor)?;
        let records = RecordReader::new(cursor)
            .with_expected_type(header.shape_type)
            .collect::<Result<Vec<_>>>()?;

        let trees = Self::build_trees(&records, config);
        let collection = Self {
            header,
            records,
            trees,
            config,
        };

        let info = collection.info();
        tracing::info!(
            "Loaded {} {:?} records, {} rings, {} vertices",
            info.record_count,
            info.shape_type,
            info.ring_count,
            info.vertex_count
        );
        Ok(collection)
    }

    /// Read a whole file into memory, then decode it
    pub fn load_from_file<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_file");

        let data = std::fs::read(path.as_ref())?;
        tracing::debug!("Read {} bytes from {}", data.len(), path.as_ref().display());
        Self::from_bytes(&data, config)
    }

    /// Build one tree per ring in parallel; each worker owns its chain and tree
    fn build_trees(records: &[ShapeRecord], config: Config) -> Vec<RingTree> {
        let jobs: Vec<(usize, usize, &[Coord<f64>], bool)> = records
            .iter()
            .enumerate()
            .flat_map(|(record_index, record)| {
                let is_polygon = record.shape_type.is_polygon();
                record
                    .rings()
                    .iter()
                    .enumerate()
                    .filter(|(_, ring)| !ring.is_empty())
                    .map(move |(ring_index, ring)| {
                        (record_index, ring_index, ring.as_slice(), is_polygon)
                    })
            })
            .collect();

        jobs.into_par_iter()
            .map(|(record_index, ring_index, ring, is_polygon)| {
                let chain = VertexChain::from_ring(ring.iter().copied());
                let mut tree = GeneralizationTree::with_capacity(ring.len());
                match config.method {
                    BuildMethod::Sort => {
                        let floor = if config.polygon_floor && is_polygon {
                            POLYGON_FLOOR
                        } else {
                            LINE_FLOOR
                        };
                        builder::build_sorted_with_floor(chain, &mut tree, floor);
                    }
                    method => builder::build_tree(chain, &mut tree, method),
                }
                RingTree {
                    record_index,
                    ring_index,
                    tree,
                }
            })
            .collect()
    }

    /// Every non-null record simplified to `threshold`, in record order
    pub fn query(&self, threshold: f64) -> Vec<SimplifiedShape> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::query");

        self.simplify_where(threshold, |_| true)
    }

    /// Query at the level of detail for drawing `viewport` on `screen_size` pixels.
    ///
    /// Records are selected by their stored bounding box, so a polygon that
    /// covers the whole viewport is kept even with no vertex inside it.
    pub fn query_visible(
        &self,
        viewport: Rect<f64>,
        screen_size: (f64, f64),
        bias: f64,
    ) -> Vec<SimplifiedShape> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::query_visible");

        let threshold = utils::importance_threshold(viewport, screen_size, bias);
        tracing::debug!("Viewport query at importance threshold {threshold}");
        self.simplify_where(threshold, |record| {
            record
                .bounding_box()
                .is_some_and(|bbox| bbox.intersects(&viewport))
        })
    }

    /// Simplify the non-null records accepted by `keep`.
    ///
    /// Parts line up with [`ShapeRecord::rings`]; rings without a tree come
    /// out empty.
    fn simplify_where(
        &self,
        threshold: f64,
        keep: impl Fn(&ShapeRecord) -> bool,
    ) -> Vec<SimplifiedShape> {
        let mut trees = self.trees.iter().peekable();
        let mut results = Vec::new();

        for (record_index, record) in self.records.iter().enumerate() {
            // Drop trees of records skipped earlier
            while trees.next_if(|t| t.record_index < record_index).is_some() {}

            if !keep(record) {
                continue;
            }
            let parts = match &record.shape {
                Shape::Null => continue,
                Shape::Point(coord) => vec![vec![*coord]],
                Shape::MultiPoint { points, .. } => vec![points.clone()],
                Shape::PolyLine { .. } | Shape::Polygon { .. } => (0..record.rings().len())
                    .map(|ring_index| {
                        trees
                            .next_if(|t| (t.record_index, t.ring_index) == (record_index, ring_index))
                            .map(|ring_tree| ring_tree.tree.query(threshold))
                            .unwrap_or_default()
                    })
                    .collect(),
            };
            results.push(SimplifiedShape {
                record_number: record.record_number,
                shape_type: record.shape_type,
                parts,
            });
        }

        results
    }

    #[inline]
    pub fn header(&self) -> &ShapeHeader {
        &self.header
    }

    #[inline]
    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    #[inline]
    pub fn trees(&self) -> &[RingTree] {
        &self.trees
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tree for a given record and ring, if that ring had any vertices
    pub fn tree(&self, record_index: usize, ring_index: usize) -> Option<&GeneralizationTree> {
        self.trees
            .binary_search_by_key(&(record_index, ring_index), |t| {
                (t.record_index, t.ring_index)
            })
            .ok()
            .map(|i| &self.trees[i].tree)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            shape_type: self.header.shape_type,
            record_count: self.records.len(),
            ring_count: self.trees.len(),
            vertex_count: self.trees.iter().map(|t| t.tree.len()).sum(),
        }
    }
}
