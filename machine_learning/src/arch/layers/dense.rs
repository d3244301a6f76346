use ndarray::{Array1, Array2, ArrayView2, linalg};
use ndarray_rand::{RandomExt, rand_distr::Uniform};
use rand::Rng;

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer: `a = act_fn(x · w + b)`.
#[derive(Debug, Clone)]
pub struct Dense {
    weights: Array2<f32>,
    biases: Array1<f32>,
    act_fn: Option<ActFn>,
}

impl Dense {
    /// Creates a new `Dense` layer from its parameters.
    ///
    /// # Arguments
    /// * `weights` - A `(fan_in, fan_out)` matrix.
    /// * `biases` - A `fan_out` vector.
    /// * `act_fn` - The activation applied after the affine map, if any.
    ///
    /// # Returns
    /// A new `Dense` or `MlErr::ShapeMismatch` if the biases don't match the weights.
    pub fn new(
        weights: Array2<f32>,
        biases: Array1<f32>,
        act_fn: Option<ActFn>,
    ) -> Result<Self> {
        if weights.ncols() != biases.len() {
            return Err(MlErr::ShapeMismatch {
                what: "dense biases",
                got: biases.len(),
                expected: weights.ncols(),
            });
        }

        Ok(Self {
            weights,
            biases,
            act_fn,
        })
    }

    /// Creates a layer whose weights are all zero and whose biases are drawn from
    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    pub fn zero_weights<R: Rng>(
        dim: (usize, usize),
        act_fn: Option<ActFn>,
        rng: &mut R,
    ) -> Result<Self> {
        let biases = Array1::random_using(dim.1, fan_in_uniform(dim.0)?, rng);
        Self::new(Array2::zeros(dim), biases, act_fn)
    }

    /// Creates a layer whose weights and biases are drawn from
    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    pub fn random<R: Rng>(
        dim: (usize, usize),
        act_fn: Option<ActFn>,
        rng: &mut R,
    ) -> Result<Self> {
        let distribution = fan_in_uniform(dim.0)?;
        let weights = Array2::random_using(dim, distribution.clone(), rng);
        let biases = Array1::random_using(dim.1, distribution, rng);
        Self::new(weights, biases, act_fn)
    }

    /// Returns the `(fan_in, fan_out)` dimensions of this layer.
    pub fn dim(&self) -> (usize, usize) {
        self.weights.dim()
    }

    pub fn act_fn(&self) -> Option<&ActFn> {
        self.act_fn.as_ref()
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (fan_in, fan_out) = self.dim();
        if x.ncols() != fan_in {
            return Err(MlErr::ShapeMismatch {
                what: "dense input",
                got: x.ncols(),
                expected: fan_in,
            });
        }

        let mut z = Array2::zeros((x.nrows(), fan_out));
        linalg::general_mat_mul(1.0, &x, &self.weights, 0.0, &mut z);
        z += &self.biases;

        if let Some(act_fn) = &self.act_fn {
            act_fn.apply(z.view_mut());
        }

        Ok(z)
    }
}

fn fan_in_uniform(fan_in: usize) -> Result<Uniform<f32>> {
    if fan_in == 0 {
        return Err(MlErr::InvalidInput("dense layers need at least one input"));
    }

    let k = 1.0 / (fan_in as f32).sqrt();
    Uniform::new(-k, k).map_err(|_| MlErr::InvalidInput("invalid initialisation range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn forward_applies_affine_map_and_activation() {
        let dense = Dense::new(
            arr2(&[[1.0, -1.0], [2.0, 0.0]]),
            arr1(&[0.5, 0.0]),
            Some(ActFn::leaky_relu()),
        )
        .unwrap();

        let y = dense.forward(arr2(&[[1.0, 1.0]]).view()).unwrap();
        assert_eq!(y[[0, 0]], 3.5);
        assert!((y[[0, 1]] + 0.01).abs() < 1e-7);
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let dense = Dense::new(Array2::zeros((3, 2)), Array1::zeros(2), None).unwrap();
        let err = dense.forward(Array2::zeros((4, 2)).view()).unwrap_err();
        assert!(matches!(
            err,
            MlErr::ShapeMismatch {
                got: 2,
                expected: 3,
                ..
            }
        ));
    }

    #[test]
    fn new_rejects_mismatched_biases() {
        assert!(Dense::new(Array2::zeros((3, 2)), Array1::zeros(3), None).is_err());
    }

    #[test]
    fn zero_weights_keeps_biases_in_range() {
        let dense = Dense::zero_weights((4, 8), None, &mut rand::rng()).unwrap();
        assert_eq!(dense.size(), 4 * 8 + 8);

        let y = dense.forward(Array2::ones((1, 4)).view()).unwrap();
        assert!(y.iter().all(|b| b.abs() <= 0.5));
    }
}
