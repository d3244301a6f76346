use std::f32::consts::TAU;

use ml_core::{DataError, Dataset, Label, Sample, Tensor};
use ndarray::{Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::{MlErr, Result};

/// A minimal in-memory dataset.
///
/// Design goals:
/// - deterministic and test-friendly
/// - small API surface
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    inputs: Tensor,
    labels: Vec<Label>,
}

impl InMemoryDataset {
    /// Creates a new dataset from owned buffers.
    ///
    /// # Arguments
    /// * `inputs` - All the samples stacked along the leading axis.
    /// * `labels` - One label per sample.
    ///
    /// # Returns
    /// The dataset or `MlErr::ShapeMismatch` if there isn't exactly one label per sample.
    pub fn new(inputs: Tensor, labels: Vec<Label>) -> Result<Self> {
        let rows = inputs.shape().first().copied().unwrap_or(0);
        if rows != labels.len() {
            return Err(MlErr::ShapeMismatch {
                what: "dataset labels",
                got: labels.len(),
                expected: rows,
            });
        }

        Ok(Self { inputs, labels })
    }

    /// Two noisy concentric rings in the plane, labelled `0` (inner, radius 1) and `1`
    /// (outer, radius 2).
    ///
    /// # Arguments
    /// * `per_ring` - The amount of samples on each ring.
    /// * `noise` - The standard deviation of the radial noise.
    /// * `rng` - The random number generator.
    pub fn two_rings<R: Rng>(per_ring: usize, noise: f32, rng: &mut R) -> Result<Self> {
        let normal = Normal::new(0.0, noise)
            .map_err(|_| MlErr::InvalidInput("noise must be finite and non negative"))?;

        let mut inputs = Array2::zeros((2 * per_ring, 2));
        let mut labels = Vec::with_capacity(2 * per_ring);

        for (i, mut row) in inputs.axis_iter_mut(Axis(0)).enumerate() {
            let class = i / per_ring;
            let angle = rng.random::<f32>() * TAU;
            let radius = (class + 1) as f32 + normal.sample(rng);
            row[0] = radius * angle.cos();
            row[1] = radius * angle.sin();
            labels.push(Label::Class(class as i64));
        }

        Self::new(inputs.into_dyn(), labels)
    }

    #[inline]
    pub fn inputs(&self) -> &Tensor {
        &self.inputs
    }

    #[inline]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> Option<usize> {
        Some(self.labels.len())
    }

    fn get(&self, index: usize) -> std::result::Result<Sample, DataError> {
        let label = self
            .labels
            .get(index)
            .ok_or(DataError::OutOfBounds { index })?;

        Ok(Sample {
            input: self.inputs.index_axis(Axis(0), index).to_owned(),
            label: label.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn dataset_basic() {
        let ds = InMemoryDataset::new(
            arr2(&[[1.0_f32, 2.0], [3.0, 5.0]]).into_dyn(),
            vec![Label::Class(0), Label::Class(1)],
        )
        .unwrap();

        assert_eq!(ds.len(), Some(2));
        let sample = ds.get(1).unwrap();
        assert_eq!(sample.input.as_slice(), Some(&[3.0, 5.0][..]));
        assert_eq!(sample.label, Label::Class(1));
        assert!(matches!(ds.get(2), Err(DataError::OutOfBounds { index: 2 })));
    }

    #[test]
    fn dataset_rejects_missing_labels() {
        let err = InMemoryDataset::new(Array2::<f32>::zeros((3, 2)).into_dyn(), vec![]);
        assert!(err.is_err());
    }

    #[test]
    fn two_rings_places_classes_on_their_radius() {
        let ds = InMemoryDataset::two_rings(50, 0.0, &mut rand::rng()).unwrap();
        assert_eq!(ds.num_samples(), 100);

        for i in 0..100 {
            let sample = ds.get(i).unwrap();
            let radius = sample.input.mapv(|x| x * x).sum().sqrt();
            let expected = if i < 50 { 1.0 } else { 2.0 };
            assert!((radius - expected).abs() < 1e-4);
        }
    }
}
