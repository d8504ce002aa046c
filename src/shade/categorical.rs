use crate::aggregate::Grid;
use crate::error::{RasterError, RasterResult};
use crate::raster::Canvas;
use crate::shade::colormap::{Rgba, TRANSPARENT};
use crate::shade::image::ImageBuffer;
use crate::shade::rescale::{rescale, Rescale};
use crate::shade::check_shape;

/// Alpha given to the sparsest observed cell of a categorical render
pub const DEFAULT_MIN_ALPHA: u8 = 40;

/// Color-by-category shading.
///
/// Each cell takes the count-weighted mean of its categories' colors
/// (`color_key[code]`), and its alpha encodes total density rescaled with
/// `how` into `[min_alpha, 255]`. Empty cells stay transparent.
pub fn shade_categorical(
    grid: &Grid,
    canvas: &Canvas,
    color_key: &[Rgba],
    how: Rescale,
    min_alpha: u8,
) -> RasterResult<ImageBuffer> {
    check_shape(grid, canvas)?;
    let Grid::Categorical(cells) = grid else {
        return Err(RasterError::config(
            "categorical shading needs a categorical_count grid",
        ));
    };

    let density = rescale(&grid.values(), how)?;
    // Observed cells never reach alpha 0, which is reserved for "no data"
    let min_alpha = min_alpha.max(1);
    let alpha_span = (255 - min_alpha) as f64;

    let pixels = cells
        .cells()
        .iter()
        .zip(density)
        .map(|(counts, t)| {
            let Some(t) = t else {
                return Ok(TRANSPARENT);
            };
            let total = counts.total() as f64;
            let mut rgb = [0.0f64; 3];
            for (code, n) in counts.iter() {
                let color = color_key.get(code as usize).ok_or_else(|| {
                    RasterError::colormap(format!(
                        "no color for category {code} (key has {} colors)",
                        color_key.len()
                    ))
                })?;
                let w = n as f64 / total;
                for c in 0..3 {
                    rgb[c] += w * color[c] as f64;
                }
            }
            let alpha = (min_alpha as f64 + alpha_span * t).round() as u8;
            Ok([
                rgb[0].round() as u8,
                rgb[1].round() as u8,
                rgb[2].round() as u8,
                alpha,
            ])
        })
        .collect::<RasterResult<Vec<Rgba>>>()?;

    Ok(ImageBuffer::new(
        canvas.width,
        canvas.height,
        pixels,
        *canvas.extent(),
    ))
}
