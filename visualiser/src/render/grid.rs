use ndarray::{Array3, ArrayView4, Axis, s};

use crate::error::{Result, VisErr};

/// Tiles a batch of `(N, C, H, W)` images into a single `(C', H', W')` image.
///
/// Images are laid out row major, `nrow` per row, separated and surrounded by `padding`
/// zero pixels. Single channel images are repeated into three channels.
///
/// # Errors
/// `VisErr::EmptyInput` if there are no images or `nrow` is zero.
pub fn make_grid(images: ArrayView4<f32>, nrow: usize, padding: usize) -> Result<Array3<f32>> {
    let (n, c, h, w) = images.dim();
    if n == 0 {
        return Err(VisErr::EmptyInput("image batch"));
    }
    if nrow == 0 {
        return Err(VisErr::EmptyInput("grid row"));
    }

    let images = if c == 1 {
        images.broadcast((n, 3, h, w)).ok_or(VisErr::Shape {
            what: "single channel image batch",
            shape: vec![n, c, h, w],
        })?
    } else {
        images
    };
    let channels = images.len_of(Axis(1));

    let xmaps = nrow.min(n);
    let ymaps = n.div_ceil(xmaps);
    let (cell_h, cell_w) = (h + padding, w + padding);
    let mut grid = Array3::zeros((channels, ymaps * cell_h + padding, xmaps * cell_w + padding));

    for (k, image) in images.outer_iter().enumerate() {
        let (y, x) = (k / xmaps, k % xmaps);
        let (top, left) = (y * cell_h + padding, x * cell_w + padding);
        grid.slice_mut(s![.., top..top + h, left..left + w])
            .assign(&image);
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn grid_layout_matches_rows_and_padding() {
        let images = Array4::<f32>::ones((10, 3, 4, 5));
        let grid = make_grid(images.view(), 8, 2).unwrap();

        // 8 columns and 2 rows of (4 + 2) x (5 + 2) cells plus the outer padding
        assert_eq!(grid.dim(), (3, 2 * 6 + 2, 8 * 7 + 2));
        assert_eq!(grid[[0, 0, 0]], 0.0);
        assert_eq!(grid[[0, 2, 2]], 1.0);
        // third image of the second row is missing
        assert_eq!(grid[[0, 8, 2 + 2 * 7]], 0.0);
    }

    #[test]
    fn single_channel_is_repeated() {
        let images = Array4::<f32>::from_elem((2, 1, 2, 2), 0.5);
        let grid = make_grid(images.view(), 8, 0).unwrap();
        assert_eq!(grid.dim(), (3, 2, 4));
        assert!(grid.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn empty_batch_is_an_error() {
        let images = Array4::<f32>::zeros((0, 1, 2, 2));
        assert!(make_grid(images.view(), 8, 2).is_err());
    }
}
