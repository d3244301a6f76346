//! Attribution results handed over by an interpretability method.
//!
//! The caller picks the variant; nothing is inferred from the tensors themselves.
use ml_core::Tensor;
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, Ix2, Ix3};

use crate::{
    error::{Result, VisErr},
    sampling::flatten_rows,
};

/// Token level attributions of a text input.
#[derive(Debug, Clone, PartialEq)]
pub struct TextResult {
    pub method: String,
    pub tokens: Vec<String>,
    /// One score per token.
    pub attributions: Array1<f32>,
}

/// Pixel attributions of a `(C, H, W)` image, possibly with extra unit axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub method: String,
    pub x: Tensor,
    /// Either `(C, H, W)` like `x` or a coarser layer attribution to be upsampled.
    pub attribution: Tensor,
}

/// Feature attributions of a `(samples, features)` table, one tensor per algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularResult {
    pub method: String,
    pub x: Tensor,
    pub attributions: Vec<Tensor>,
    /// Legend entries, one per attribution tensor.
    pub features: Vec<String>,
}

/// Attributions of any shape, shown as images after normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericResult {
    pub method: String,
    pub x: Tensor,
    pub attribution: Tensor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Text(TextResult),
    Image(ImageResult),
    Tabular(TabularResult),
    Generic(GenericResult),
}

impl Interpretation {
    /// The name of the attribution method, used as dashboard tag.
    pub fn method(&self) -> &str {
        match self {
            Interpretation::Text(r) => &r.method,
            Interpretation::Image(r) => &r.method,
            Interpretation::Tabular(r) => &r.method,
            Interpretation::Generic(r) => &r.method,
        }
    }
}

/// Drops every axis of length one.
fn squeeze(tensor: &Tensor) -> Tensor {
    let shape: Vec<usize> = tensor.shape().iter().copied().filter(|&n| n != 1).collect();
    tensor
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order(shape)
        .unwrap_or_else(|_| tensor.clone())
}

/// Converts a `(C, H, W)` or `(H, W)` image, with any extra unit axes, to `(H, W, C)`.
pub(crate) fn image_hwc(x: &Tensor) -> Result<Array3<f32>> {
    let squeezed = squeeze(x);
    match squeezed.ndim() {
        2 => Ok(squeezed
            .into_dimensionality::<Ix2>()
            .map_err(|_| shape_err("image", x))?
            .insert_axis(Axis(2))),
        3 => Ok(squeezed
            .into_dimensionality::<Ix3>()
            .map_err(|_| shape_err("image", x))?
            .permuted_axes([1, 2, 0])
            .as_standard_layout()
            .into_owned()),
        _ => Err(shape_err("image", x)),
    }
}

/// Brings an image attribution onto the `(h, w)` pixel grid of its input.
///
/// Three axis attributions are read as `(C, H, W)`. Anything else is averaged down to its
/// last two axes, upsampled and repeated into three channels.
pub(crate) fn attribution_hwc(attribution: &Tensor, (h, w): (usize, usize)) -> Result<Array3<f32>> {
    let squeezed = squeeze(attribution);
    if squeezed.ndim() == 3 {
        let chw = squeezed
            .into_dimensionality::<Ix3>()
            .map_err(|_| shape_err("image attribution", attribution))?;
        let channels: Vec<_> = chw.outer_iter().map(|c| nearest_resize(c, (h, w))).collect();
        let views: Vec<_> = channels.iter().map(|c| c.view()).collect();
        return ndarray::stack(Axis(2), &views).map_err(|_| shape_err("image attribution", attribution));
    }

    let mut plane = squeezed;
    while plane.ndim() > 2 {
        plane = plane
            .mean_axis(Axis(0))
            .ok_or_else(|| shape_err("image attribution", attribution))?;
    }
    let plane = plane
        .into_dimensionality::<Ix2>()
        .map_err(|_| shape_err("image attribution", attribution))?;

    let resized = nearest_resize(plane.view(), (h, w));
    let views = [resized.view(), resized.view(), resized.view()];
    ndarray::stack(Axis(2), &views).map_err(|_| shape_err("image attribution", attribution))
}

/// Nearest neighbour interpolation of a plane onto an `(h, w)` grid.
fn nearest_resize(plane: ArrayView2<f32>, (h, w): (usize, usize)) -> Array2<f32> {
    let (src_h, src_w) = plane.dim();
    if (src_h, src_w) == (h, w) || src_h == 0 || src_w == 0 {
        return plane.to_owned();
    }
    Array2::from_shape_fn((h, w), |(y, x)| plane[[y * src_h / h, x * src_w / w]])
}

/// Sums every attribution over its samples and scales it to unit L1 norm.
pub(crate) fn feature_series(attributions: &[Tensor]) -> Result<Vec<Array1<f32>>> {
    attributions
        .iter()
        .map(|a| {
            let summed = flatten_rows(a)?.sum_axis(Axis(0));
            let norm = summed.mapv(f32::abs).sum();
            Ok(if norm > 0.0 { summed / norm } else { summed })
        })
        .collect()
}

fn shape_err(what: &'static str, tensor: &Tensor) -> VisErr {
    VisErr::Shape {
        what,
        shape: tensor.shape().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn, arr1, arr2};

    #[test]
    fn chw_images_become_hwc() {
        let x = Array::from_shape_fn(IxDyn(&[1, 3, 2, 4]), |i| i[1] as f32);
        let hwc = image_hwc(&x).unwrap();
        assert_eq!(hwc.dim(), (2, 4, 3));
        assert_eq!(hwc[[1, 3, 2]], 2.0);
    }

    #[test]
    fn grey_images_get_one_channel() {
        let x = Array::zeros(IxDyn(&[1, 1, 5, 6]));
        assert_eq!(image_hwc(&x).unwrap().dim(), (5, 6, 1));
    }

    #[test]
    fn matching_attributions_are_only_permuted() {
        let attr = Array::from_shape_fn(IxDyn(&[3, 2, 2]), |i| (i[0] * 10 + i[1] * 2 + i[2]) as f32);
        let hwc = attribution_hwc(&attr, (2, 2)).unwrap();
        assert_eq!(hwc.dim(), (2, 2, 3));
        assert_eq!(hwc[[1, 0, 2]], 22.0);
    }

    #[test]
    fn layer_attributions_are_upsampled_and_repeated() {
        let attr = arr2(&[[1.0_f32, 2.0], [3.0, 4.0]]).into_shape_with_order(IxDyn(&[1, 1, 2, 2])).unwrap();
        let hwc = attribution_hwc(&attr, (4, 4)).unwrap();

        assert_eq!(hwc.dim(), (4, 4, 3));
        assert_eq!(hwc[[0, 1, 0]], 1.0);
        assert_eq!(hwc[[3, 3, 1]], 4.0);
        assert_eq!(hwc[[2, 0, 2]], 3.0);
    }

    #[test]
    fn feature_series_have_unit_l1_norm() {
        let attr = arr2(&[[1.0_f32, -1.0, 1.0], [0.0, 0.0, 1.0]]).into_dyn();
        let series = feature_series(&[attr]).unwrap();
        assert_eq!(series[0], arr1(&[0.25, -0.25, 0.5]));
    }

    #[test]
    fn all_zero_series_stay_zero() {
        let series = feature_series(&[Array::zeros(IxDyn(&[2, 2]))]).unwrap();
        assert_eq!(series[0], arr1(&[0.0, 0.0]));
    }

    #[test]
    fn method_names_are_exposed() {
        let result = Interpretation::Text(TextResult {
            method: "IntegratedGradients".into(),
            tokens: vec![],
            attributions: arr1(&[]),
        });
        assert_eq!(result.method(), "IntegratedGradients");
    }
}
