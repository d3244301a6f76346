use ndarray::{Array, Array1, Array2, Array3, ArrayView, ArrayView1, ArrayView2, ArrayView3, Axis, Dimension};
use plotters::{coord::Shift, prelude::*};

use super::{PlotResult, Renderer, diverging_color, heat_color};
use crate::{error::Result, topology::PersistenceDiagram};

/// Colour of the points of homology dimension `dim`.
pub(crate) fn dim_color(dim: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(dim).rgb();
    RGBColor(r, g, b)
}

/// Scales `values` linearly onto `[0, 1]`. Constant inputs map to `0`.
fn min_max<D: Dimension>(values: ArrayView<f32, D>) -> Array<f32, D> {
    let lo = values.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = hi - lo;
    if range > 0.0 {
        values.mapv(|v| (v - lo) / range)
    } else {
        Array::zeros(values.raw_dim())
    }
}

/// Collapses the channels of an HWC tensor into an absolute magnitude normalised by its
/// maximum.
fn magnitude(hwc: ArrayView3<f32>) -> Array2<f32> {
    let summed = hwc.sum_axis(Axis(2)).mapv(f32::abs);
    let max = summed.iter().copied().fold(0.0, f32::max);
    if max > 0.0 { summed / max } else { summed }
}

/// Turns an HWC tensor with any amount of channels into RGB in `[0, 1]`.
fn to_rgb(hwc: ArrayView3<f32>) -> Array3<f32> {
    let (h, w, c) = hwc.dim();
    let mut rgb = Array3::zeros((h, w, 3));
    for k in 0..3 {
        // one channel images are grey, two channel ones get an empty blue
        let source = match c {
            0 => continue,
            1 => 0,
            _ if k < c => k,
            _ => continue,
        };
        rgb.index_axis_mut(Axis(2), k).assign(&hwc.index_axis(Axis(2), source));
    }

    min_max(rgb.view())
}

/// Paints one rectangle per pixel, row 0 at the top.
fn paint_pixels<F>(area: &DrawingArea<BitMapBackend<'_>, Shift>, (h, w): (usize, usize), color: F) -> PlotResult
where
    F: Fn(usize, usize) -> RGBColor,
{
    if h == 0 || w == 0 {
        return Ok(());
    }

    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(0f32..w as f32, 0f32..h as f32)?;

    chart.draw_series((0..h).flat_map(|y| (0..w).map(move |x| (y, x))).map(|(y, x)| {
        let top = (h - y) as f32;
        Rectangle::new([(x as f32, top - 1.0), (x as f32 + 1.0, top)], color(y, x).filled())
    }))?;

    Ok(())
}

impl Renderer {
    /// Scatter of `(birth, death)` with the diagonal, coloured by homology dimension.
    pub fn persistence_diagram(&self, diagram: &PersistenceDiagram) -> Result<Array3<f32>> {
        let top = diagram.max_death().unwrap_or(1.0).max(f32::EPSILON) * 1.05;

        self.rasterize(|root| {
            let mut chart = ChartBuilder::on(root)
                .margin(16)
                .build_cartesian_2d(0f32..top, 0f32..top)?;

            let axis = ShapeStyle::from(&BLACK).stroke_width(1);
            chart.draw_series([
                PathElement::new(vec![(0.0, 0.0), (top, 0.0)], axis),
                PathElement::new(vec![(0.0, 0.0), (0.0, top)], axis),
                PathElement::new(vec![(0.0, 0.0), (top, top)], ShapeStyle::from(&BLACK.mix(0.4))),
            ])?;

            chart.draw_series(
                diagram
                    .pairs()
                    .iter()
                    .map(|p| Circle::new((p.birth, p.death), 3, dim_color(p.dim).filled())),
            )?;

            Ok(())
        })
    }

    /// One cell per value, rows top to bottom, coloured on a sequential scale spanning
    /// the range of `values`.
    pub fn heat_map(&self, values: ArrayView2<f32>) -> Result<Array3<f32>> {
        let scaled = min_max(values);
        self.rasterize(|root| paint_pixels(root, scaled.dim(), |y, x| heat_color(scaled[[y, x]])))
    }

    /// Heat map of the channel summed magnitude of an `(H, W, C)` tensor.
    pub fn attribution_map(&self, hwc: ArrayView3<f32>) -> Result<Array3<f32>> {
        self.heat_map(magnitude(hwc).view())
    }

    /// Three panels side by side: the image, the attribution magnitude and the attribution
    /// blended over a grey copy of the image.
    ///
    /// # Arguments
    /// * `image` - An `(H, W, C)` image.
    /// * `attribution` - An `(H, W, C')` attribution over the same pixels.
    pub fn image_triptych(&self, image: ArrayView3<f32>, attribution: ArrayView3<f32>) -> Result<Array3<f32>> {
        let rgb = to_rgb(image);
        let heat = magnitude(attribution);
        let grey = rgb.mean_axis(Axis(2)).unwrap_or_else(|| Array2::zeros(heat.raw_dim()));
        let (h, w, _) = rgb.dim();

        self.rasterize(|root| {
            let panels = root.split_evenly((1, 3));

            paint_pixels(&panels[0], (h, w), |y, x| {
                let px = |k| (rgb[[y, x, k]] * 255.0).round() as u8;
                RGBColor(px(0), px(1), px(2))
            })?;

            paint_pixels(&panels[1], heat.dim(), |y, x| heat_color(heat[[y, x]]))?;

            paint_pixels(&panels[2], (h, w), |y, x| {
                let RGBColor(r, g, b) = heat_color(heat.get((y, x)).copied().unwrap_or(0.0));
                let g0 = grey.get((y, x)).copied().unwrap_or(0.0) * 255.0;
                let blend = |c: u8| (0.5 * f32::from(c) + 0.5 * g0).round() as u8;
                RGBColor(blend(r), blend(g), blend(b))
            })
        })
    }

    /// A strip of blocks, one per token, as wide as the token and tinted by the sign and
    /// weight of its attribution.
    pub fn token_strip(&self, tokens: &[String], attributions: ArrayView1<f32>) -> Result<Array3<f32>> {
        let max = attributions.iter().fold(0.0_f32, |m, a| m.max(a.abs()));
        let widths: Vec<f32> = tokens.iter().map(|t| t.chars().count().max(1) as f32).collect();
        let total = widths.iter().sum::<f32>() + widths.len() as f32 + 1.0;

        self.rasterize(|root| {
            let mut chart = ChartBuilder::on(root)
                .margin(8)
                .build_cartesian_2d(0f32..total, 0f32..1f32)?;

            let mut x = 1.0;
            let blocks = widths.iter().zip(attributions).map(|(&width, &a)| {
                let weight = if max > 0.0 { a / max } else { 0.0 };
                let block = Rectangle::new([(x, 0.3), (x + width, 0.7)], diverging_color(weight).filled());
                x += width + 1.0;
                block
            });
            chart.draw_series(blocks)?;

            Ok(())
        })
    }

    /// Grouped bars, one group per feature and one bar per series.
    pub fn feature_bars(&self, series: &[(Array1<f32>, RGBColor)]) -> Result<Array3<f32>> {
        const WIDTH: f32 = 0.14;

        let n_features = series.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
        let all = || series.iter().flat_map(|(s, _)| s.iter().copied());
        let lo = all().fold(0.0_f32, f32::min);
        let hi = all().fold(0.0_f32, f32::max);
        let (lo, hi) = if hi > lo { (lo, hi) } else { (-1.0, 1.0) };
        let right = n_features as f32 + series.len() as f32 * WIDTH;

        self.rasterize(|root| {
            let mut chart = ChartBuilder::on(root)
                .margin(16)
                .build_cartesian_2d(-0.5f32..right.max(0.5), lo..hi)?;

            chart.draw_series(std::iter::once(PathElement::new(
                vec![(-0.5, 0.0), (right, 0.0)],
                ShapeStyle::from(&BLACK).stroke_width(1),
            )))?;

            for (k, (values, color)) in series.iter().enumerate() {
                let offset = k as f32 * WIDTH;
                chart.draw_series(values.iter().enumerate().map(|(f, &v)| {
                    let x = f as f32 + offset;
                    Rectangle::new([(x, v.min(0.0)), (x + WIDTH, v.max(0.0))], color.mix(0.8).filled())
                }))?;
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PersistencePair;
    use ndarray::{arr1, arr2};

    fn renderer() -> Renderer {
        Renderer::new(64, 48)
    }

    fn is_white(pixels: &Array3<f32>) -> bool {
        pixels.iter().all(|&v| v == 1.0)
    }

    #[test]
    fn persistence_diagram_draws_points() {
        let diagram = PersistenceDiagram::new([PersistencePair {
            birth: 0.0,
            death: 1.0,
            dim: 0,
        }]);
        let pixels = renderer().persistence_diagram(&diagram).unwrap();
        assert_eq!(pixels.dim(), (48, 64, 3));
        assert!(!is_white(&pixels));
        assert!(pixels.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn empty_diagram_still_renders() {
        let pixels = renderer().persistence_diagram(&PersistenceDiagram::default()).unwrap();
        assert_eq!(pixels.dim(), (48, 64, 3));
    }

    #[test]
    fn heat_map_of_empty_matrix_is_blank() {
        let pixels = renderer().heat_map(Array2::zeros((0, 4)).view()).unwrap();
        assert!(is_white(&pixels));
    }

    #[test]
    fn heat_map_paints_cells() {
        let pixels = renderer().heat_map(arr2(&[[0.0, 1.0], [2.0, 3.0]]).view()).unwrap();
        assert!(!is_white(&pixels));
    }

    #[test]
    fn triptych_has_canvas_size() {
        let image = Array3::<f32>::ones((4, 4, 3));
        let attribution = Array3::<f32>::from_elem((4, 4, 3), 0.5);
        let pixels = renderer().image_triptych(image.view(), attribution.view()).unwrap();
        assert_eq!(pixels.dim(), (48, 64, 3));
        assert!(!is_white(&pixels));
    }

    #[test]
    fn token_strip_tints_blocks() {
        let tokens = vec!["good".to_string(), "bad".to_string()];
        let pixels = renderer().token_strip(&tokens, arr1(&[1.0, -1.0]).view()).unwrap();
        assert!(!is_white(&pixels));
    }

    #[test]
    fn feature_bars_render_with_all_zero_series() {
        let series = vec![(arr1(&[0.0, 0.0]), RGBColor(10, 20, 30))];
        let pixels = renderer().feature_bars(&series).unwrap();
        assert_eq!(pixels.dim(), (48, 64, 3));
    }

    #[test]
    fn to_rgb_replicates_grey_images() {
        let grey = arr2(&[[0.0_f32, 2.0]]).insert_axis(Axis(2));
        let rgb = to_rgb(grey.view());
        assert_eq!(rgb.dim(), (1, 2, 3));
        assert_eq!(rgb[[0, 1, 0]], 1.0);
        assert_eq!(rgb[[0, 1, 2]], 1.0);
        assert_eq!(rgb[[0, 0, 1]], 0.0);
    }
}
