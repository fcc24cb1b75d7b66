//! Shape record decoding
//!
//! Records follow the main header back to back. Each one is an 8-byte
//! big-endian frame (record number, content length in 16-bit words) around a
//! little-endian payload. The stream has no record count: it ends when fewer
//! than 8 bytes are left at a record boundary.

use crate::{BoundsXY, ByteCursor, Result, ShapeError, ShapeType};
use geo::{Coord, Rect};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size of the big-endian frame preceding every record payload
const RECORD_HEADER_LEN: usize = 8;

/// One ordered sequence of vertices (a polygon ring or a polyline part)
pub type Ring = Vec<Coord<f64>>;

/// Decoded geometry payload of a record
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    Null,
    Point(Coord<f64>),
    MultiPoint {
        bbox: BoundsXY,
        points: Vec<Coord<f64>>,
    },
    PolyLine {
        bbox: BoundsXY,
        parts: SmallVec<[Ring; 1]>,
    },
    Polygon {
        bbox: BoundsXY,
        rings: SmallVec<[Ring; 1]>,
    },
}

/// A single decoded record
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeRecord {
    /// 1-based record number as stored in the file
    pub record_number: i32,
    /// Shape type declared by the record itself
    pub shape_type: ShapeType,
    pub shape: Shape,
}

impl ShapeRecord {
    /// Rings for polygons, parts for polylines, empty otherwise
    pub fn rings(&self) -> &[Ring] {
        match &self.shape {
            Shape::PolyLine { parts, .. } => parts,
            Shape::Polygon { rings, .. } => rings,
            _ => &[],
        }
    }

    /// Bounding box stored in the record (computed for single points)
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        match &self.shape {
            Shape::Null => None,
            Shape::Point(coord) => Some(Rect::new(*coord, *coord)),
            Shape::MultiPoint { bbox, .. }
            | Shape::PolyLine { bbox, .. }
            | Shape::Polygon { bbox, .. } => Some(bbox.to_rect()),
        }
    }

    /// Total number of vertices in the payload
    pub fn vertex_count(&self) -> usize {
        match &self.shape {
            Shape::Null => 0,
            Shape::Point(_) => 1,
            Shape::MultiPoint { points, .. } => points.len(),
            Shape::PolyLine { parts, .. } => parts.iter().map(Vec::len).sum(),
            Shape::Polygon { rings, .. } => rings.iter().map(Vec::len).sum(),
        }
    }
}

/// Pull-based iterator over the records that follow the header.
///
/// Yields `Ok(record)` until the data is exhausted, then `None`. A malformed
/// record yields one `Err` and the iterator is fused afterwards; records
/// already yielded stay valid.
pub struct RecordReader<'a> {
    cursor: ByteCursor<'a>,
    expected_type: Option<ShapeType>,
    finished: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a> RecordReader<'a> {
    /// Read records starting at the cursor's current position
    pub fn new(cursor: ByteCursor<'a>) -> Self {
        Self {
            cursor,
            expected_type: None,
            finished: false,
        }
    }

    /// Log a warning for records whose type disagrees with the header
    pub fn with_expected_type(mut self, shape_type: ShapeType) -> Self {
        self.expected_type = Some(shape_type);
        self
    }

    /// Byte offset of the next record
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Parse the next record, `Ok(None)` once no record header fits
    fn read_record(&mut self) -> Result<Option<ShapeRecord>> {
        let remaining = self.cursor.remaining();
        if remaining < RECORD_HEADER_LEN {
            if remaining > 0 {
                tracing::debug!(
                    "Ignoring {} trailing bytes at offset {}",
                    remaining,
                    self.cursor.position()
                );
            }
            return Ok(None);
        }

        let record_number = self.cursor.read_i32_be()?;
        let content_words = self.cursor.read_i32_be()?;
        if content_words < 0 {
            return Err(ShapeError::malformed(
                record_number,
                format!("negative content length {content_words}"),
            ));
        }
        let content_len = content_words as usize * 2;
        let content = self.cursor.take(content_len).map_err(|_| {
            ShapeError::malformed(
                record_number,
                format!(
                    "declares {} content bytes but only {} remain",
                    content_len,
                    self.cursor.remaining()
                ),
            )
        })?;

        // Parse inside the declared content so trailing Z/M data is skipped
        // and an overrun cannot bleed into the next record.
        let mut body = ByteCursor::new(content);
        let shape_type = ShapeType::from_code(body.read_i32_le().map_err(|_| {
            ShapeError::malformed(record_number, "content too short for a shape type")
        })?);
        let shape = parse_shape(&mut body, shape_type, record_number).map_err(|err| match err {
            ShapeError::InsufficientData { .. } => ShapeError::malformed(
                record_number,
                format!("{shape_type:?} payload overruns {content_len} content bytes"),
            ),
            other => other,
        })?;

        if let Some(expected) = self.expected_type {
            if shape_type != expected && shape_type != ShapeType::Null {
                tracing::warn!(
                    "Record {} has shape type {:?}, header declares {:?}",
                    record_number,
                    shape_type,
                    expected
                );
            }
        }

        Ok(Some(ShapeRecord {
            record_number,
            shape_type,
            shape,
        }))
    }
}

impl Iterator for RecordReader<'_> {
    type Item = Result<ShapeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for RecordReader<'_> {}

fn parse_shape(body: &mut ByteCursor<'_>, shape_type: ShapeType, record_number: i32) -> Result<Shape> {
    match shape_type {
        ShapeType::Null => Ok(Shape::Null),
        t if t.is_point() => Ok(Shape::Point(read_coord(body)?)),
        t if t.is_multipoint() => {
            let bbox = BoundsXY::read(body)?;
            let num_points = read_count(body, record_number, "point")?;
            ensure_fits(body, num_points * 16, record_number)?;
            let points = (0..num_points)
                .map(|_| read_coord(body))
                .collect::<Result<Vec<_>>>()?;
            Ok(Shape::MultiPoint { bbox, points })
        }
        t if t.is_polyline() || t.is_polygon() => {
            let bbox = BoundsXY::read(body)?;
            let parts = read_parts(body, record_number, t == ShapeType::MultiPatch)?;
            if t.is_polygon() {
                Ok(Shape::Polygon { bbox, rings: parts })
            } else {
                Ok(Shape::PolyLine { bbox, parts })
            }
        }
        other => Err(ShapeError::malformed(
            record_number,
            format!("unsupported shape type code {}", other.code()),
        )),
    }
}

/// Part index table followed by the flat point array, split into rings
fn read_parts(
    body: &mut ByteCursor<'_>,
    record_number: i32,
    has_part_types: bool,
) -> Result<SmallVec<[Ring; 1]>> {
    let num_parts = read_count(body, record_number, "part")?;
    let num_points = read_count(body, record_number, "point")?;
    let table_words = if has_part_types { 2 } else { 1 };
    ensure_fits(
        body,
        num_parts * 4 * table_words + num_points * 16,
        record_number,
    )?;

    let mut starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        let start = body.read_i32_le()?;
        let start = usize::try_from(start)
            .ok()
            .filter(|s| *s < num_points)
            .ok_or_else(|| {
                ShapeError::malformed(
                    record_number,
                    format!("part start {start} outside 0..{num_points}"),
                )
            })?;
        if starts.last().is_some_and(|prev| start < *prev) {
            return Err(ShapeError::malformed(
                record_number,
                "part start indices are not sorted",
            ));
        }
        starts.push(start);
    }
    if has_part_types {
        body.skip(num_parts * 4)?;
    }

    let points = (0..num_points)
        .map(|_| read_coord(body))
        .collect::<Result<Vec<_>>>()?;

    let mut parts = SmallVec::with_capacity(num_parts);
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(num_points);
        parts.push(points[*start..end].to_vec());
    }
    Ok(parts)
}

fn read_count(body: &mut ByteCursor<'_>, record_number: i32, what: &str) -> Result<usize> {
    let count = body.read_i32_le()?;
    usize::try_from(count).map_err(|_| {
        ShapeError::malformed(record_number, format!("negative {what} count {count}"))
    })
}

/// Reject counts that cannot fit before allocating for them
fn ensure_fits(body: &ByteCursor<'_>, needed: usize, record_number: i32) -> Result<()> {
    if needed > body.remaining() {
        return Err(ShapeError::malformed(
            record_number,
            format!(
                "geometry needs {} bytes, record holds {}",
                needed,
                body.remaining()
            ),
        ));
    }
    Ok(())
}

#[inline]
fn read_coord(body: &mut ByteCursor<'_>) -> Result<Coord<f64>> {
    Ok(Coord {
        x: body.read_f64_le()?,
        y: body.read_f64_le()?,
    })
}
