//! Score and refinement kernels shared by every decision boundary search.
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

use crate::{MlError, Tensor};

/// Reduces model outputs to a signed score whose zero level set is the decision boundary.
///
/// * Single output models are read as probabilities: `score = y - 0.5`.
/// * Multi output models are read as logits of a binary problem: `score = y[1] - y[0]`.
///
/// # Errors
/// `MlError::InvalidInput` if `outputs` is not a `(batch, n)` tensor with `n >= 1`.
pub fn decision_scores(outputs: &Tensor) -> Result<Array1<f32>, MlError> {
    let outputs = outputs
        .view()
        .into_dimensionality::<ndarray::Ix2>()
        .map_err(|_| MlError::InvalidInput("model outputs must be a (batch, n) tensor"))?;

    match outputs.ncols() {
        0 => Err(MlError::InvalidInput("model outputs have no columns")),
        1 => Ok(outputs.column(0).mapv(|y| y - 0.5)),
        _ => Ok(&outputs.column(1) - &outputs.column(0)),
    }
}

/// Moves every segment `[lo_i, hi_i]` towards the zero of `score` by bisection.
///
/// Each row of `lo` and `hi` is one segment; the score of `lo_i` and `hi_i` must have
/// opposite signs for the result to converge onto the boundary.
///
/// # Arguments
/// * `lo` - One end of every segment.
/// * `hi` - The other end of every segment.
/// * `epochs` - The amount of halving steps.
/// * `score` - Scores a batch of points, one score per row.
///
/// # Returns
/// The midpoints of the refined segments.
pub fn bisect<F>(
    lo: ArrayView2<f32>,
    hi: ArrayView2<f32>,
    epochs: usize,
    mut score: F,
) -> Result<Array2<f32>, MlError>
where
    F: FnMut(ArrayView2<f32>) -> Result<Array1<f32>, MlError>,
{
    if lo.dim() != hi.dim() {
        return Err(MlError::ShapeMismatch {
            what: "bisection segment ends",
            got: hi.len(),
            expected: lo.len(),
        });
    }

    let mut lo = lo.to_owned();
    let mut hi = hi.to_owned();
    let lo_sign = score(lo.view())?.mapv(f32::signum);

    for _ in 0..epochs {
        let mid = (&lo + &hi) * 0.5;
        let mid_scores = score(mid.view())?;

        Zip::from(lo.rows_mut())
            .and(hi.rows_mut())
            .and(mid.rows())
            .and(&mid_scores)
            .and(&lo_sign)
            .for_each(|mut lo, mut hi, mid, &s, &sign| {
                if s.signum() == sign {
                    lo.assign(&mid);
                } else {
                    hi.assign(&mid);
                }
            });
    }

    Ok((&lo + &hi) * 0.5)
}

/// Returns, for each row of `points`, the index of the closest row with a score of
/// opposite sign.
pub fn nearest_opposite(points: ArrayView2<f32>, scores: &Array1<f32>) -> Vec<Option<usize>> {
    points
        .axis_iter(Axis(0))
        .zip(scores)
        .map(|(p, &s)| {
            points
                .axis_iter(Axis(0))
                .zip(scores)
                .enumerate()
                .filter(|(_, (_, t))| (s > 0.0) != (**t > 0.0))
                .map(|(j, (q, _))| (j, (&p - &q).mapv(|d| d * d).sum()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(j, _)| j)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn single_output_scores_are_centered_on_one_half() {
        let out = arr2(&[[0.5_f32], [0.9], [0.1]]).into_dyn();
        let scores = decision_scores(&out).unwrap();
        assert!(scores[0].abs() < 1e-6);
        assert!(scores[1] > 0.0);
        assert!(scores[2] < 0.0);
    }

    #[test]
    fn two_output_scores_compare_logits() {
        let out = arr2(&[[1.0_f32, 3.0], [2.0, 2.0]]).into_dyn();
        assert_eq!(decision_scores(&out).unwrap(), arr1(&[2.0, 0.0]));
    }

    #[test]
    fn scores_reject_non_matrix_outputs() {
        let out = arr1(&[1.0_f32]).into_dyn();
        assert!(decision_scores(&out).is_err());
    }

    #[test]
    fn bisection_finds_linear_root() {
        // score(x) = x0 - 0.3, root at x0 = 0.3
        let lo = arr2(&[[0.0_f32, 5.0], [1.0, -2.0]]);
        let hi = arr2(&[[1.0_f32, 5.0], [-1.0, -2.0]]);
        let mid = bisect(lo.view(), hi.view(), 30, |x| Ok(x.column(0).mapv(|v| v - 0.3))).unwrap();

        assert!((mid[[0, 0]] - 0.3).abs() < 1e-4);
        assert!((mid[[1, 0]] - 0.3).abs() < 1e-4);
        assert_eq!(mid[[0, 1]], 5.0);
    }

    #[test]
    fn nearest_opposite_skips_same_sign_points() {
        let points = arr2(&[[0.0_f32], [0.1], [5.0]]);
        let scores = arr1(&[1.0_f32, 1.0, -1.0]);
        let nearest = nearest_opposite(points.view(), &scores);
        assert_eq!(nearest, vec![Some(2), Some(2), Some(1)]);
    }

    #[test]
    fn nearest_opposite_is_none_without_candidates() {
        let points = arr2(&[[0.0_f32], [1.0]]);
        let scores = arr1(&[1.0_f32, 2.0]);
        assert_eq!(nearest_opposite(points.view(), &scores), vec![None, None]);
    }
}
