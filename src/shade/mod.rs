//! Transfer functions: aggregate grid -> RGBA image.

mod categorical;
mod colormap;
mod image;
mod rescale;

pub use categorical::{shade_categorical, DEFAULT_MIN_ALPHA};
pub use colormap::{parse_color, Colormap, ColormapSpec, Rgba, SUPPORTED, TRANSPARENT};
pub use image::ImageBuffer;
pub use rescale::{rescale, Rescale};

use tracing::debug;

use crate::aggregate::Grid;
use crate::error::{RasterError, RasterResult};
use crate::raster::Canvas;

/// Shade a scalar grid through `colormap` after rescaling with `how`.
///
/// Cells without observations become fully transparent, never the
/// colormap's low color. Categorical grids shade their total counts.
pub fn shade(
    grid: &Grid,
    canvas: &Canvas,
    colormap: &Colormap,
    how: Rescale,
) -> RasterResult<ImageBuffer> {
    check_shape(grid, canvas)?;
    let scaled = rescale(&grid.values(), how)?;

    let pixels: Vec<Rgba> = scaled
        .iter()
        .map(|t| match t {
            Some(t) => colormap.sample(*t),
            None => TRANSPARENT,
        })
        .collect();

    let image = ImageBuffer::new(canvas.width, canvas.height, pixels, *canvas.extent());
    debug!(
        how = how.name(),
        opaque = image.count_opaque(),
        colors = colormap.len(),
        "shaded grid"
    );
    Ok(image)
}

pub(crate) fn check_shape(grid: &Grid, canvas: &Canvas) -> RasterResult<()> {
    if grid.shape() != canvas.shape() {
        return Err(RasterError::geometry(format!(
            "grid is {:?} but canvas is {:?}",
            grid.shape(),
            canvas.shape()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_points, Reducer};
    use crate::geo::Point;
    use crate::raster::make_canvas;

    fn quadrants() -> Vec<Point> {
        vec![
            Point::new(0.5, 0.5),
            Point::new(1.5, 0.5),
            Point::new(0.5, 1.5),
            Point::new(1.5, 1.5),
        ]
    }

    #[test]
    fn test_uniform_density_single_color() {
        let canvas = make_canvas(2, 2, (0.0, 2.0), (0.0, 2.0)).unwrap();
        let agg = aggregate_points(quadrants(), &canvas, &Reducer::Count);
        let img = shade(&agg.grid, &canvas, &Colormap::fire(), Rescale::Linear).unwrap();
        assert_eq!(img.count_opaque(), 4);
        assert_eq!(img.distinct_colors(), 1);
    }

    #[test]
    fn test_empty_cells_transparent_for_every_method() {
        let canvas = make_canvas(3, 3, (0.0, 3.0), (0.0, 3.0)).unwrap();
        let points = vec![Point::new(0.5, 0.5), Point::new(0.5, 0.5), Point::new(2.5, 2.5)];
        let agg = aggregate_points(points, &canvas, &Reducer::Count);

        for how in [Rescale::Linear, Rescale::Log, Rescale::EqHist] {
            let img = shade(&agg.grid, &canvas, &Colormap::greys(), how).unwrap();
            for row in 0..3 {
                for col in 0..3 {
                    let px = img.pixel(col, row).unwrap();
                    match agg.grid.value(col, row) {
                        None => assert_eq!(px[3], 0, "{how:?} ({col},{row})"),
                        Some(_) => assert_eq!(px[3], 255),
                    }
                }
            }
        }
    }

    #[test]
    fn test_min_value_cell_distinct_from_empty() {
        let canvas = make_canvas(2, 1, (0.0, 2.0), (0.0, 1.0)).unwrap();
        let points = vec![Point::weighted(0.5, 0.5, 0.0), Point::weighted(0.5, 0.5, 0.0)];
        let agg = aggregate_points(points, &canvas, &Reducer::sum("w"));
        let img = shade(&agg.grid, &canvas, &Colormap::greys(), Rescale::Linear).unwrap();
        // A cell summing to zero is data; the untouched cell is not
        assert_eq!(img.pixel(0, 0).unwrap()[3], 255);
        assert_eq!(img.pixel(1, 0), Some(TRANSPARENT));
    }

    #[test]
    fn test_eq_hist_keeps_distinct_colors() {
        let canvas = make_canvas(6, 1, (0.0, 6.0), (0.0, 1.0)).unwrap();
        // Long-tailed counts: 1, 2, 3, 4, 5, 500
        let mut points = Vec::new();
        for (col, n) in [1usize, 2, 3, 4, 5, 500].into_iter().enumerate() {
            points.extend((0..n).map(|_| Point::new(col as f64 + 0.5, 0.5)));
        }
        let agg = aggregate_points(points, &canvas, &Reducer::Count);
        let cmap = Colormap::blues();
        let linear = shade(&agg.grid, &canvas, &cmap, Rescale::Linear).unwrap();
        let eq = shade(&agg.grid, &canvas, &cmap, Rescale::EqHist).unwrap();
        assert!(eq.distinct_colors() >= linear.distinct_colors());
        assert_eq!(eq.distinct_colors(), 6);
    }

    #[test]
    fn test_eq_hist_survives_tied_top_values() {
        // Counts 1 and 2 next to 2000 cells of 101
        let canvas = make_canvas(2002, 1, (0.0, 2002.0), (0.0, 1.0)).unwrap();
        let mut points = vec![Point::new(0.5, 0.5), Point::new(1.5, 0.5), Point::new(1.5, 0.5)];
        for col in 2..2002 {
            points.extend((0..101).map(|_| Point::new(col as f64 + 0.5, 0.5)));
        }
        let agg = aggregate_points(points, &canvas, &Reducer::Count);
        let cmap = Colormap::fire();
        let linear = shade(&agg.grid, &canvas, &cmap, Rescale::Linear).unwrap();
        let eq = shade(&agg.grid, &canvas, &cmap, Rescale::EqHist).unwrap();
        assert_eq!(linear.distinct_colors(), 3);
        assert!(eq.distinct_colors() >= linear.distinct_colors());
    }

    #[test]
    fn test_log_negative_sum_fails() {
        let canvas = make_canvas(1, 1, (0.0, 1.0), (0.0, 1.0)).unwrap();
        let agg = aggregate_points(vec![Point::weighted(0.5, 0.5, -2.0)], &canvas, &Reducer::sum("w"));
        let err = shade(&agg.grid, &canvas, &Colormap::fire(), Rescale::Log).unwrap_err();
        assert!(matches!(err, RasterError::InvalidRange(_)));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let canvas = make_canvas(2, 2, (0.0, 2.0), (0.0, 2.0)).unwrap();
        let other = make_canvas(3, 2, (0.0, 2.0), (0.0, 2.0)).unwrap();
        let agg = aggregate_points(quadrants(), &canvas, &Reducer::Count);
        assert!(shade(&agg.grid, &other, &Colormap::fire(), Rescale::Linear).is_err());
    }
}
