use log::debug;
use ml_core::{
    Device, LayerDescriptor, ModelExtractor, Tensor,
    boundary::{bisect, decision_scores, nearest_opposite},
};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    MlErr, Result,
    arch::{Sequential, loss::LossFn},
};

/// Settings of the decision boundary search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySearch {
    /// The amount of random points thrown around the example.
    pub n_samples: usize,
    /// The amount of bisection steps towards the boundary.
    pub n_epochs: usize,
    /// Points whose score is at most this far from zero are kept.
    pub precision: f32,
}

impl Default for BoundarySearch {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            n_epochs: 100,
            precision: 0.1,
        }
    }
}

/// [`ModelExtractor`] over a [`Sequential`] model.
pub struct SequentialExtractor<L: LossFn> {
    model: Sequential,
    loss_fn: L,
    search: BoundarySearch,
    rng: StdRng,
}

impl<L: LossFn> SequentialExtractor<L> {
    /// Creates a new `SequentialExtractor`.
    ///
    /// # Arguments
    /// * `model` - The model to inspect.
    /// * `loss_fn` - The loss the model was trained with.
    /// * `seed` - Seed for the boundary search, `None` draws one from the OS.
    pub fn new(model: Sequential, loss_fn: L, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            model,
            loss_fn,
            search: BoundarySearch::default(),
            rng,
        }
    }

    pub fn with_search(mut self, search: BoundarySearch) -> Self {
        self.search = search;
        self
    }

    pub fn model(&self) -> &Sequential {
        &self.model
    }

    /// Evaluates the loss of the model over a batch.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if the targets don't match the model outputs.
    pub fn loss(&self, inputs: &Tensor, targets: ArrayView2<f32>) -> Result<f32> {
        let y_pred = self.model.forward(self.flatten(inputs)?.view())?;
        if y_pred.dim() != targets.dim() {
            return Err(MlErr::ShapeMismatch {
                what: "loss targets",
                got: targets.len(),
                expected: y_pred.len(),
            });
        }

        Ok(self.loss_fn.loss(y_pred.view(), targets))
    }

    fn check_device(device: Device) -> Result<()> {
        match device {
            Device::Cpu => Ok(()),
            other => Err(MlErr::UnsupportedDevice(other)),
        }
    }

    /// Reshapes a `(batch, *features)` tensor into the `(batch, input_dim)` matrix the
    /// model consumes.
    fn flatten(&self, inputs: &Tensor) -> Result<Array2<f32>> {
        let batch = inputs
            .shape()
            .first()
            .copied()
            .ok_or(MlErr::InvalidInput("inputs must have a batch axis"))?;
        let width = inputs.len().checked_div(batch).unwrap_or(0);
        let expected = self.model.input_dim();

        if width != expected {
            return Err(MlErr::ShapeMismatch {
                what: "model input",
                got: width,
                expected,
            });
        }

        let flat = inputs
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order((batch, width))
            .map_err(|_| MlErr::InvalidInput("inputs cannot be flattened"))?;

        Ok(flat)
    }

    fn scores(&self, points: ArrayView2<f32>) -> Result<Array1<f32>> {
        let outputs = self.model.forward(points)?.into_dyn();
        decision_scores(&outputs)
    }
}

impl<L: LossFn> ModelExtractor for SequentialExtractor<L> {
    fn layers(&self) -> Vec<LayerDescriptor> {
        self.model.describe()
    }

    fn forward(&self, inputs: &Tensor, device: Device) -> Result<Tensor> {
        Self::check_device(device)?;
        Ok(self.model.forward(self.flatten(inputs)?.view())?.into_dyn())
    }

    fn get_activations(&self, inputs: &Tensor, device: Device) -> Result<Vec<Tensor>> {
        Self::check_device(device)?;
        let trace = self.model.trace(self.flatten(inputs)?.view())?;
        Ok(trace.into_iter().map(Array2::into_dyn).collect())
    }

    fn get_decision_boundary(
        &mut self,
        example: &Tensor,
        device: Device,
    ) -> Result<Tensor> {
        Self::check_device(device)?;

        let dim = self.model.input_dim();
        if example.len() != dim {
            return Err(MlErr::ShapeMismatch {
                what: "decision boundary example",
                got: example.len(),
                expected: dim,
            });
        }

        // Points are thrown in a cube centered on the example, wide enough to reach the
        // origin from it.
        let center: Vec<f32> = example.iter().copied().collect();
        let half_width = 1.0 + center.iter().fold(0.0_f32, |m, x| m.max(x.abs()));
        let BoundarySearch {
            n_samples,
            n_epochs,
            precision,
        } = self.search;

        let points = Array2::from_shape_fn((n_samples, dim), |(_, j)| {
            center[j] + half_width * (2.0 * self.rng.random::<f32>() - 1.0)
        });
        let scores = self.scores(points.view())?;

        let pairs: Vec<(usize, usize)> = nearest_opposite(points.view(), &scores)
            .into_iter()
            .enumerate()
            .filter_map(|(i, j)| j.map(|j| (i, j)))
            .collect();

        if pairs.is_empty() {
            debug!(n_samples = n_samples; "no sign change around the example");
            return Ok(Array2::<f32>::zeros((0, dim)).into_dyn());
        }

        let lo = points.select(Axis(0), &pairs.iter().map(|p| p.0).collect::<Vec<_>>());
        let hi = points.select(Axis(0), &pairs.iter().map(|p| p.1).collect::<Vec<_>>());
        let mid = bisect(lo.view(), hi.view(), n_epochs, |x| self.scores(x))?;
        let mid_scores = self.scores(mid.view())?;

        let kept: Vec<usize> = mid_scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.abs() < precision)
            .map(|(i, _)| i)
            .collect();

        debug!(kept = kept.len(), candidates = pairs.len(); "decision boundary sampled");
        Ok(mid.select(Axis(0), &kept).into_dyn())
    }
}
