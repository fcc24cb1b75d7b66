//! Level-of-detail helpers mapping screen resolution to importance thresholds

use geo::Rect;

/// Smallest bias accepted before dividing by it
const MIN_BIAS: f64 = 1e-15;

/// Area of one screen pixel in world units
///
/// # Arguments
/// * `viewport` - Visible region in the data's coordinate system
/// * `screen_size` - Size of the drawing surface in pixels (width, height)
#[inline]
pub fn pixel_area(viewport: Rect<f64>, screen_size: (f64, f64)) -> f64 {
    let units_per_px_x = viewport.width() / screen_size.0.max(1.0);
    let units_per_px_y = viewport.height() / screen_size.1.max(1.0);
    units_per_px_x * units_per_px_y
}

/// Importance threshold for drawing `viewport` on a screen of `screen_size`.
///
/// Vertices whose removal changes the shape by less than one pixel of area
/// are dropped. Higher `bias` keeps more detail (lower threshold).
#[inline]
pub fn importance_threshold(viewport: Rect<f64>, screen_size: (f64, f64), bias: f64) -> f64 {
    pixel_area(viewport, screen_size) / bias.max(MIN_BIAS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn viewport() -> Rect<f64> {
        Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1000.0, y: 500.0 })
    }

    #[test]
    fn test_pixel_area() {
        // 10 x 5 world units per pixel
        assert_eq!(pixel_area(viewport(), (100.0, 100.0)), 50.0);
    }

    #[test]
    fn test_bias_lowers_threshold() {
        let normal = importance_threshold(viewport(), (100.0, 100.0), 1.0);
        let detailed = importance_threshold(viewport(), (100.0, 100.0), 4.0);
        assert_eq!(normal, 50.0);
        assert_eq!(detailed, 12.5);
    }

    #[test]
    fn test_larger_screen_lowers_threshold() {
        let small = importance_threshold(viewport(), (1024.0, 768.0), 1.0);
        let large = importance_threshold(viewport(), (3840.0, 2160.0), 1.0);
        assert!(large < small);
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        let threshold = importance_threshold(viewport(), (0.0, 0.0), 0.0);
        assert!(threshold.is_finite());
        assert!(threshold > 0.0);
    }
}
