//! Shapefile main header
//!
//! The header is a fixed 100-byte block. The signature and file length are
//! big-endian, everything from the version onwards is little-endian.

use crate::{ByteCursor, Result, ShapeError};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use geo::{Coord, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size of the main header in bytes
pub const HEADER_LEN: usize = 100;

/// Magic number at byte 0 of every shapefile
pub const FILE_SIGNATURE: i32 = 9994;

/// Geometry type code shared by the header and each record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
    /// A code outside the published set, kept verbatim
    Unknown(i32),
}

impl ShapeType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            31 => ShapeType::MultiPatch,
            other => ShapeType::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
            ShapeType::Unknown(code) => code,
        }
    }

    /// Closed rings (Polygon, PolygonZ, PolygonM, MultiPatch)
    pub fn is_polygon(self) -> bool {
        matches!(
            self,
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM | ShapeType::MultiPatch
        )
    }

    /// Open parts (PolyLine, PolyLineZ, PolyLineM)
    pub fn is_polyline(self) -> bool {
        matches!(
            self,
            ShapeType::PolyLine | ShapeType::PolyLineZ | ShapeType::PolyLineM
        )
    }

    pub fn is_point(self) -> bool {
        matches!(
            self,
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM
        )
    }

    pub fn is_multipoint(self) -> bool {
        matches!(
            self,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM
        )
    }
}

/// Minimum and maximum of a scalar measure (Z or M)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// XY extent exactly as stored on disk.
///
/// Corners are not reordered, so writers that store an inverted box for an
/// empty file encode back to the same bytes.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundsXY {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundsXY {
    pub fn new(min: Coord<f64>, max: Coord<f64>) -> Self {
        Self {
            xmin: min.x,
            ymin: min.y,
            xmax: max.x,
            ymax: max.y,
        }
    }

    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            xmin: cursor.read_f64_le()?,
            ymin: cursor.read_f64_le()?,
            xmax: cursor.read_f64_le()?,
            ymax: cursor.read_f64_le()?,
        })
    }

    /// Normalised rectangle for geometric use
    #[inline]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.xmin,
                y: self.ymin,
            },
            Coord {
                x: self.xmax,
                y: self.ymax,
            },
        )
    }
}

/// Parsed main file header
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeHeader {
    /// Declared total file size in 16-bit words
    pub file_length: u32,
    /// Format version, 1000 for every known writer
    pub version: i32,
    /// Geometry type of the records that follow
    pub shape_type: ShapeType,
    pub bounds_xy: BoundsXY,
    pub bounds_z: ValueRange,
    pub bounds_m: ValueRange,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ShapeHeader {
    /// Decode the header at the cursor's position.
    ///
    /// On success the cursor sits exactly 100 bytes after where it started.
    /// A bad signature or a short buffer is fatal; a declared file length that
    /// disagrees with the buffer is only logged, since records are framed
    /// individually.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let start = cursor.position();
        if cursor.remaining() < HEADER_LEN {
            return Err(ShapeError::InvalidHeader(format!(
                "need {HEADER_LEN} bytes, only {} available",
                cursor.remaining()
            )));
        }

        let signature = cursor.read_i32_be()?;
        if signature != FILE_SIGNATURE {
            return Err(ShapeError::InvalidSignature(signature));
        }

        // 5 unused words
        cursor.skip(5 * 4)?;
        let file_length = cursor.read_i32_be()? as u32;

        let version = cursor.read_i32_le()?;
        let shape_type = ShapeType::from_code(cursor.read_i32_le()?);

        let bounds_xy = BoundsXY::read(cursor)?;
        let bounds_z = ValueRange {
            min: cursor.read_f64_le()?,
            max: cursor.read_f64_le()?,
        };
        let bounds_m = ValueRange {
            min: cursor.read_f64_le()?,
            max: cursor.read_f64_le()?,
        };
        debug_assert_eq!(cursor.position(), start + HEADER_LEN);

        let header = ShapeHeader {
            file_length,
            version,
            shape_type,
            bounds_xy,
            bounds_z,
            bounds_m,
        };

        let available = cursor.len() - start;
        if header.file_length_bytes() != available {
            tracing::warn!(
                "Header declares {} bytes but source holds {}; continuing with per-record framing",
                header.file_length_bytes(),
                available
            );
        }
        if let ShapeType::Unknown(code) = shape_type {
            tracing::warn!("Unknown shape type {code} in header");
        }
        tracing::debug!(
            "Decoded header: {:?}, version {}, {} bytes",
            shape_type,
            version,
            header.file_length_bytes()
        );

        Ok(header)
    }

    /// Declared file length converted to bytes
    #[inline]
    pub fn file_length_bytes(&self) -> usize {
        self.file_length as usize * 2
    }

    /// Encode the header into its 100-byte on-disk form
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        BigEndian::write_i32(&mut buf[0..4], FILE_SIGNATURE);
        BigEndian::write_u32(&mut buf[24..28], self.file_length);
        LittleEndian::write_i32(&mut buf[28..32], self.version);
        LittleEndian::write_i32(&mut buf[32..36], self.shape_type.code());

        let values = [
            self.bounds_xy.xmin,
            self.bounds_xy.ymin,
            self.bounds_xy.xmax,
            self.bounds_xy.ymax,
            self.bounds_z.min,
            self.bounds_z.max,
            self.bounds_m.min,
            self.bounds_m.max,
        ];
        for (i, value) in values.iter().enumerate() {
            let offset = 36 + i * 8;
            LittleEndian::write_f64(&mut buf[offset..offset + 8], *value);
        }
        buf
    }
}
