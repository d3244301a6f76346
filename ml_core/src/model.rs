use serde::{Deserialize, Serialize};

use crate::{Device, MlError, Tensor};

/// A structural description of one layer, used to build model graph records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub name: String,
    pub kind: String,
    pub input_dim: usize,
    pub output_dim: usize,
    pub activation: Option<String>,
}

/// Read access to the internals of a trained model.
///
/// An extractor wraps a model together with its loss function and exposes the pieces the
/// visualisation layer needs. It does not:
/// - train the model,
/// - decide which samples are fed to it,
/// - render anything.
pub trait ModelExtractor {
    /// Returns the structure of the wrapped model, input layer first.
    fn layers(&self) -> Vec<LayerDescriptor>;

    /// Computes the model output for a batch of inputs.
    ///
    /// # Errors
    /// Returns `MlError` on shape mismatches or an unsupported `device`.
    fn forward(&self, inputs: &Tensor, device: Device) -> Result<Tensor, MlError>;

    /// Computes the output of every layer for a batch of inputs.
    ///
    /// # Returns
    /// One tensor per layer, in forward order, each of shape `(batch, *features)`.
    ///
    /// # Errors
    /// Returns `MlError` on shape mismatches or an unsupported `device`.
    fn get_activations(&self, inputs: &Tensor, device: Device) -> Result<Vec<Tensor>, MlError>;

    /// Samples points lying on the decision boundary of the model in the neighbourhood of
    /// `example`.
    ///
    /// # Returns
    /// A `(points, features)` tensor.
    ///
    /// # Errors
    /// Returns `MlError` on shape mismatches or an unsupported `device`.
    fn get_decision_boundary(&mut self, example: &Tensor, device: Device)
        -> Result<Tensor, MlError>;
}
