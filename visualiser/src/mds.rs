use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{Result, VisErr};

/// Classical (Torgerson) multidimensional scaling over a precomputed dissimilarity matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicalMds {
    n_components: usize,
    max_iter: usize,
}

impl ClassicalMds {
    const TOLERANCE: f64 = 1e-9;

    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            max_iter: 300,
        }
    }

    /// Embeds the points described by `dissimilarities` into `n_components` dimensions.
    ///
    /// The squared dissimilarities are double centred and their leading eigenpairs are
    /// extracted by power iteration with deflation. Components past the amount of positive
    /// eigenvalues are zero.
    ///
    /// # Returns
    /// An `(n, n_components)` matrix.
    ///
    /// # Errors
    /// `VisErr::Shape` if `dissimilarities` is not square.
    pub fn fit_transform(&self, dissimilarities: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (n, m) = dissimilarities.dim();
        if n != m {
            return Err(VisErr::Shape {
                what: "dissimilarity matrix",
                shape: vec![n, m],
            });
        }

        let mut embedding = Array2::zeros((n, self.n_components));
        if n == 0 {
            return Ok(embedding);
        }

        let mut b = double_centre(dissimilarities);
        // Shifting by a bound of the spectral radius makes the largest eigenvalue the
        // dominant one.
        let shift = b
            .rows()
            .into_iter()
            .map(|r| r.iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0, f64::max);

        for k in 0..self.n_components {
            let (value, vector) = self.leading_eigenpair(&b, shift);
            if value <= Self::TOLERANCE {
                break;
            }

            embedding
                .column_mut(k)
                .assign(&vector.mapv(|v| (v * value.sqrt()) as f32));

            let outer = vector
                .view()
                .insert_axis(Axis(1))
                .dot(&vector.view().insert_axis(Axis(0)));
            b.scaled_add(-value, &outer);
        }

        Ok(embedding)
    }

    fn leading_eigenpair(&self, b: &Array2<f64>, shift: f64) -> (f64, Array1<f64>) {
        let n = b.nrows();
        // deterministic start, not orthogonal to any eigenvector in practice
        let mut v = Array1::from_shape_fn(n, |i| 1.0 + (i as f64 * 0.618_033_988_7).fract());
        v /= v.dot(&v).sqrt();

        for _ in 0..self.max_iter {
            let mut next = b.dot(&v) + shift * &v;
            let norm = next.dot(&next).sqrt();
            if norm == 0.0 {
                return (0.0, v);
            }
            next /= norm;

            let delta = (&next - &v).mapv(f64::abs).sum();
            v = next;
            if delta < Self::TOLERANCE {
                break;
            }
        }

        (v.dot(&b.dot(&v)), v)
    }
}

/// Returns `-1/2 J D² J` with `J` the centring matrix.
fn double_centre(d: ArrayView2<f32>) -> Array2<f64> {
    let squared = d.mapv(|v| f64::from(v) * f64::from(v));
    let rows = squared.mean_axis(Axis(1)).unwrap_or_default();
    let cols = squared.mean_axis(Axis(0)).unwrap_or_default();
    let all = squared.mean().unwrap_or_default();

    Array2::from_shape_fn(squared.dim(), |(i, j)| {
        -0.5 * (squared[[i, j]] - rows[i] - cols[j] + all)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn distances(points: &Array2<f32>) -> Array2<f32> {
        let n = points.nrows();
        Array2::from_shape_fn((n, n), |(i, j)| {
            (&points.row(i) - &points.row(j)).mapv(|x| x * x).sum().sqrt()
        })
    }

    #[test]
    fn collinear_points_keep_their_distances() {
        let points = arr2(&[[0.0_f32], [1.0], [3.0], [7.0]]);
        let d = distances(&points);

        let embedding = ClassicalMds::new(2).fit_transform(d.view()).unwrap();
        assert_eq!(embedding.dim(), (4, 2));

        let recovered = distances(&embedding);
        for (a, b) in recovered.iter().zip(&d) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
        // a line needs a single component
        assert!(embedding.column(1).iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn planar_points_are_recovered_up_to_isometry() {
        let points = arr2(&[[0.0_f32, 0.0], [2.0, 0.0], [0.0, 1.0], [2.0, 1.0], [1.0, 3.0]]);
        let d = distances(&points);

        let embedding = ClassicalMds::new(3).fit_transform(d.view()).unwrap();
        let recovered = distances(&embedding);
        for (a, b) in recovered.iter().zip(&d) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn rejects_non_square_input() {
        assert!(ClassicalMds::new(2).fit_transform(Array2::zeros((2, 3)).view()).is_err());
    }

    #[test]
    fn empty_input_gives_empty_embedding() {
        let embedding = ClassicalMds::new(3).fit_transform(Array2::zeros((0, 0)).view()).unwrap();
        assert_eq!(embedding.dim(), (0, 3));
    }
}
