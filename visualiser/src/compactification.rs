//! Decision boundaries seen through a compactification of the input space.
//!
//! Inputs are mapped into the open unit ball with `y = x / (1 + |x|)`, so boundaries that
//! reach infinity become bounded surfaces whose pairwise distances can be embedded.
use log::{debug, info};
use ml_core::{
    Device, MlError, ModelExtractor, Tensor,
    boundary::{bisect, decision_scores, nearest_opposite},
};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VisErr};

/// Hyper parameters of the compactified boundary sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compactification {
    /// Points whose score is at most this far from zero are labelled as boundary points.
    pub precision: f32,
    pub n_samples: usize,
    /// Points are sampled in the ball of radius `1 - epsilon`.
    pub epsilon: f32,
    /// Bisection steps towards the boundary.
    pub n_epochs: usize,
}

impl Default for Compactification {
    fn default() -> Self {
        Self {
            precision: 0.1,
            n_samples: 500,
            epsilon: 0.051,
            n_epochs: 100,
        }
    }
}

/// The result of [`Compactification::create_final_distance_matrix`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompactBoundary {
    /// `(n_samples, n_samples)` euclidean distances in compactified coordinates.
    pub distances: Array2<f32>,
    /// `1` for points that reached the boundary, `0` otherwise.
    pub labels: Array1<u8>,
    /// The sampled points in compactified coordinates.
    pub points: Array2<f32>,
}

/// Maps a point of the open unit ball back to the input space.
fn decompactify(y: ArrayView2<f32>) -> Array2<f32> {
    let mut x = y.to_owned();
    for mut row in x.rows_mut() {
        let norm = row.dot(&row).sqrt();
        row /= (1.0 - norm).max(f32::EPSILON);
    }
    x
}

impl Compactification {
    /// Samples points in the compactified input space, moves them onto the decision
    /// boundary and measures them.
    ///
    /// # Arguments
    /// * `extractor` - Scores the points through its `forward` pass.
    /// * `n_features` - The dimension of the input space.
    /// * `device` - Passed to every extractor call.
    /// * `rng` - The random number generator.
    ///
    /// # Errors
    /// `VisErr::EmptyInput` for a zero dimensional input space, `VisErr::Ml` if the model
    /// rejects the points.
    pub fn create_final_distance_matrix<E, R>(
        &self,
        extractor: &E,
        n_features: usize,
        device: Device,
        rng: &mut R,
    ) -> Result<CompactBoundary>
    where
        E: ModelExtractor + ?Sized,
        R: Rng,
    {
        if n_features == 0 {
            return Err(VisErr::EmptyInput("input space"));
        }

        let score = |y: ArrayView2<f32>| -> std::result::Result<Array1<f32>, MlError> {
            let x: Tensor = decompactify(y).into_dyn();
            decision_scores(&extractor.forward(&x, device)?)
        };

        let start = self.sample_ball(n_features, rng);
        let start_scores = score(start.view())?;

        let mut points = start.clone();
        let pairs: Vec<(usize, usize)> = nearest_opposite(start.view(), &start_scores)
            .into_iter()
            .enumerate()
            .filter_map(|(i, j)| j.map(|j| (i, j)))
            .collect();

        if !pairs.is_empty() {
            let (from, to): (Vec<_>, Vec<_>) = pairs.iter().copied().unzip();
            let lo = start.select(Axis(0), &from);
            let hi = start.select(Axis(0), &to);
            let moved = bisect(lo.view(), hi.view(), self.n_epochs, &score)?;
            for (row, &i) in moved.rows().into_iter().zip(&from) {
                points.row_mut(i).assign(&row);
            }
        } else {
            debug!(n_samples = self.n_samples; "no sign change among compactified samples");
        }

        let final_scores = score(points.view())?;
        let labels = final_scores.mapv(|s| u8::from(s.abs() <= self.precision));
        let distances = pairwise_distances(points.view());

        info!(
            n_samples = self.n_samples,
            on_boundary = labels.iter().filter(|&&l| l == 1).count();
            "built compactified distance matrix"
        );

        Ok(CompactBoundary {
            distances,
            labels,
            points,
        })
    }

    /// Uniform samples in the ball of radius `1 - epsilon`.
    fn sample_ball<R: Rng>(&self, n_features: usize, rng: &mut R) -> Array2<f32> {
        let radius = 1.0 - self.epsilon;
        let mut points = Array2::<f32>::zeros((self.n_samples, n_features));

        for mut row in points.rows_mut() {
            row.mapv_inplace(|_| StandardNormal.sample(rng));
            let norm = row.dot(&row).sqrt().max(f32::EPSILON);
            let r = radius * rng.random::<f32>().powf(1.0 / n_features as f32);
            row *= r / norm;
        }

        points
    }
}

fn pairwise_distances(points: ArrayView2<f32>) -> Array2<f32> {
    let n = points.nrows();
    let mut d = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = &points.row(i) - &points.row(j);
            let v = diff.dot(&diff).sqrt();
            d[[i, j]] = v;
            d[[j, i]] = v;
        }
    }
    d
}
