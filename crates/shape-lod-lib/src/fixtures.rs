//! Byte-level builders for test shapefiles

use crate::{BoundsXY, HEADER_LEN, ShapeHeader, ShapeType, ValueRange};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use geo::Coord;

fn frame(record_number: i32, content: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + content.len());
    out.write_i32::<BigEndian>(record_number).unwrap();
    out.write_i32::<BigEndian>((content.len() / 2) as i32).unwrap();
    out.extend(content);
    out
}

fn write_bbox(content: &mut Vec<u8>, points: impl Iterator<Item = (f64, f64)>) {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    for v in [min_x, min_y, max_x, max_y] {
        content.write_f64::<LittleEndian>(v).unwrap();
    }
}

/// Range followed by one value per point, as stored for Z and M
fn write_measures(content: &mut Vec<u8>, num_points: usize) {
    content.write_f64::<LittleEndian>(0.0).unwrap();
    content.write_f64::<LittleEndian>(num_points as f64).unwrap();
    for i in 0..num_points {
        content.write_f64::<LittleEndian>(i as f64).unwrap();
    }
}

fn multipart_content(shape_type: ShapeType, parts: &[&[(f64, f64)]]) -> Vec<u8> {
    let mut content = Vec::new();
    content.write_i32::<LittleEndian>(shape_type.code()).unwrap();
    write_bbox(&mut content, parts.iter().flat_map(|p| p.iter().copied()));
    let num_points: usize = parts.iter().map(|p| p.len()).sum();
    content.write_i32::<LittleEndian>(parts.len() as i32).unwrap();
    content.write_i32::<LittleEndian>(num_points as i32).unwrap();
    let mut start = 0;
    for part in parts {
        content.write_i32::<LittleEndian>(start as i32).unwrap();
        start += part.len();
    }
    if shape_type == ShapeType::MultiPatch {
        // Alternate triangle strip (0) and outer ring (2) part types
        for i in 0..parts.len() {
            let part_type = if i % 2 == 0 { 0 } else { 2 };
            content.write_i32::<LittleEndian>(part_type).unwrap();
        }
    }
    for (x, y) in parts.iter().flat_map(|p| p.iter().copied()) {
        content.write_f64::<LittleEndian>(x).unwrap();
        content.write_f64::<LittleEndian>(y).unwrap();
    }
    content
}

pub(crate) fn polygon_record(record_number: i32, rings: &[&[(f64, f64)]]) -> Vec<u8> {
    frame(record_number, multipart_content(ShapeType::Polygon, rings))
}

pub(crate) fn polyline_record(record_number: i32, parts: &[&[(f64, f64)]]) -> Vec<u8> {
    frame(record_number, multipart_content(ShapeType::PolyLine, parts))
}

/// Single-ring PolygonZ with Z range and values appended after the XY payload
pub(crate) fn polygon_z_record(record_number: i32, ring: &[(f64, f64)]) -> Vec<u8> {
    let mut content = multipart_content(ShapeType::PolygonZ, &[ring]);
    write_measures(&mut content, ring.len());
    frame(record_number, content)
}

/// MultiPatch with a part type table and trailing Z and M blocks
pub(crate) fn multipatch_record(record_number: i32, parts: &[&[(f64, f64)]]) -> Vec<u8> {
    let mut content = multipart_content(ShapeType::MultiPatch, parts);
    let num_points = parts.iter().map(|p| p.len()).sum();
    write_measures(&mut content, num_points);
    write_measures(&mut content, num_points);
    frame(record_number, content)
}

/// MultiPoint, MultiPointZ or MultiPointM; Z and M variants carry one trailing measure block
pub(crate) fn multipoint_record(
    record_number: i32,
    shape_type: ShapeType,
    points: &[(f64, f64)],
) -> Vec<u8> {
    let mut content = Vec::new();
    content.write_i32::<LittleEndian>(shape_type.code()).unwrap();
    write_bbox(&mut content, points.iter().copied());
    content.write_i32::<LittleEndian>(points.len() as i32).unwrap();
    for (x, y) in points {
        content.write_f64::<LittleEndian>(*x).unwrap();
        content.write_f64::<LittleEndian>(*y).unwrap();
    }
    if shape_type != ShapeType::MultiPoint {
        write_measures(&mut content, points.len());
    }
    frame(record_number, content)
}

pub(crate) fn point_record(record_number: i32, x: f64, y: f64) -> Vec<u8> {
    let mut content = Vec::new();
    content.write_i32::<LittleEndian>(ShapeType::Point.code()).unwrap();
    content.write_f64::<LittleEndian>(x).unwrap();
    content.write_f64::<LittleEndian>(y).unwrap();
    frame(record_number, content)
}

pub(crate) fn null_record(record_number: i32) -> Vec<u8> {
    let mut content = Vec::new();
    content.write_i32::<LittleEndian>(ShapeType::Null.code()).unwrap();
    frame(record_number, content)
}

/// Complete file: header with a correct length followed by `records`
pub(crate) fn shapefile(shape_type: ShapeType, records: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = records.iter().map(Vec::len).sum();
    let header = ShapeHeader {
        file_length: ((HEADER_LEN + body_len) / 2) as u32,
        version: 1000,
        shape_type,
        bounds_xy: BoundsXY::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 }),
        bounds_z: ValueRange::default(),
        bounds_m: ValueRange::default(),
    };
    let mut out = header.to_bytes().to_vec();
    for record in records {
        out.extend_from_slice(record);
    }
    out
}
