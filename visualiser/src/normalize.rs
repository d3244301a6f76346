use ml_core::Tensor;
use ndarray::{Array3, Axis, Ix3, s};

use crate::error::{Result, VisErr};

/// Coerces an arbitrary rank tensor into a displayable `(H, W, C)` image.
///
/// * Rank 4 tensors are read as a batch, only the first element is kept.
/// * Rank 5 and above also keep only the first entry of the last axis.
/// * The three remaining axes are ordered from largest to smallest extent, then the first
///   two are swapped, so the smallest axis ends up as channels.
/// * Two channel images get a third, all zero, channel; otherwise at most four channels are
///   kept.
///
/// Values are never modified.
///
/// # Errors
/// `VisErr::Shape` if the reduced tensor doesn't have exactly three axes.
pub fn normalize_for_image_display(tensor: &Tensor) -> Result<Array3<f32>> {
    let shape_err = || VisErr::Shape {
        what: "image display tensor",
        shape: tensor.shape().to_vec(),
    };

    let mut view = tensor.view();
    if view.ndim() >= 4 {
        view = view.index_axis_move(Axis(0), 0);
    }
    if tensor.ndim() >= 5 {
        let last = view.ndim() - 1;
        view = view.index_axis_move(Axis(last), 0);
    }
    let view = view.into_dimensionality::<Ix3>().map_err(|_| shape_err())?;

    let shape = view.shape();
    let mut order = [0, 1, 2];
    order.sort_by_key(|&axis| shape[axis]);
    order.reverse();
    let view = view.permuted_axes(order);

    let (a, b, channels) = view.dim();
    let image = if channels == 2 {
        let mut padded = Array3::zeros((a, b, 3));
        padded.slice_mut(s![.., .., ..2]).assign(&view);
        padded
    } else {
        view.slice(s![.., .., ..channels.min(4)]).to_owned()
    };

    Ok(image.permuted_axes([1, 0, 2]).as_standard_layout().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    fn ramp(shape: &[usize]) -> Tensor {
        let n = shape.iter().product::<usize>();
        Array::from_iter((0..n).map(|v| v as f32))
            .into_shape_with_order(IxDyn(shape))
            .unwrap()
    }

    #[test]
    fn hwc_images_are_left_untouched() {
        let image = ramp(&[5, 7, 3]);
        let out = normalize_for_image_display(&image).unwrap();
        assert_eq!(out.into_dyn(), image);
    }

    #[test]
    fn three_axis_inputs_only_move_values() {
        let image = ramp(&[3, 5, 7]);
        let out = normalize_for_image_display(&image).unwrap();

        let mut before: Vec<_> = image.iter().copied().collect();
        let mut after: Vec<_> = out.iter().copied().collect();
        before.sort_by(f32::total_cmp);
        after.sort_by(f32::total_cmp);
        assert_eq!(before, after);
        assert_eq!(out.dim(), (5, 7, 3));
    }

    #[test]
    fn two_channels_get_a_zero_third_channel() {
        let batch = ramp(&[4, 2, 6, 8]);
        let out = normalize_for_image_display(&batch).unwrap();

        assert_eq!(out.dim(), (6, 8, 3));
        assert!(out.index_axis(Axis(2), 2).iter().all(|&v| v == 0.0));
        // first channel of the first image, pixel (1, 2)
        assert_eq!(out[[1, 2, 0]], (1 * 8 + 2) as f32);
    }

    #[test]
    fn extra_channels_are_dropped() {
        let batch = ramp(&[2, 5, 6, 8]);
        let out = normalize_for_image_display(&batch).unwrap();
        assert_eq!(out.dim(), (6, 8, 4));
        assert_eq!(out[[0, 0, 3]], (3 * 6 * 8) as f32);
    }

    #[test]
    fn rank_five_drops_the_last_axis() {
        let volume = ramp(&[2, 3, 6, 8, 4]);
        let out = normalize_for_image_display(&volume).unwrap();
        assert_eq!(out.dim(), (6, 8, 3));
        assert_eq!(out[[0, 1, 0]], 4.0);
    }

    #[test]
    fn low_rank_inputs_are_rejected() {
        let err = normalize_for_image_display(&ramp(&[4, 4])).unwrap_err();
        assert!(matches!(err, VisErr::Shape { .. }));
    }
}
