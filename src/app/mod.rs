pub(crate) mod settings;

use settings::Settings;
use shape_lod_lib::{ShapeCollection, ShapeError, SimplifiedShape};

/// Errors surfaced by the command line tool
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load the file, build its trees and report the geometry at the chosen threshold
pub fn run(settings: &Settings) -> Result<(), AppError> {
    profiling::scope!("app::run");

    let collection = ShapeCollection::load_from_file(&settings.file, settings.config())?;
    let threshold = settings.threshold_for(collection.header().bounds_xy.to_rect());
    let shapes = collection.query(threshold);

    let info = collection.info();
    let kept = kept_vertices(&shapes);
    tracing::info!(
        "Kept {} of {} vertices at importance threshold {:.6}",
        kept,
        info.vertex_count,
        threshold
    );

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&shapes)?);
    } else {
        println!("{}", summary(&collection, &shapes, threshold));
    }
    Ok(())
}

/// Vertices in polygon and polyline parts after simplification
fn kept_vertices(shapes: &[SimplifiedShape]) -> usize {
    shapes
        .iter()
        .filter(|s| s.shape_type.is_polygon() || s.shape_type.is_polyline())
        .flat_map(|s| s.parts.iter())
        .map(Vec::len)
        .sum()
}

fn summary(collection: &ShapeCollection, shapes: &[SimplifiedShape], threshold: f64) -> String {
    let header = collection.header();
    let info = collection.info();
    let bounds = header.bounds_xy;
    format!(
        "shape type:  {:?} (version {})\n\
         bounds:      ({}, {}) - ({}, {})\n\
         records:     {} ({} with geometry)\n\
         rings:       {}\n\
         vertices:    {} -> {} at threshold {}",
        header.shape_type,
        header.version,
        bounds.xmin,
        bounds.ymin,
        bounds.xmax,
        bounds.ymax,
        info.record_count,
        shapes.len(),
        info.ring_count,
        info.vertex_count,
        kept_vertices(shapes),
        threshold
    )
}
