use ml_core::LayerDescriptor;
use ndarray::{Array2, ArrayView2};

use super::layers::Layer;
use crate::{MlErr, Result};

/// A sequential model: information flows forward through its layers, each one consuming
/// the output of the previous.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` or an error if two adjacent layers have incompatible widths.
    pub fn new<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<_> = layers.into_iter().collect();
        if layers.is_empty() {
            return Err(MlErr::InvalidInput("a sequential needs at least one layer"));
        }

        for pair in layers.windows(2) {
            let (_, prev_out) = pair[0].dim();
            let (next_in, _) = pair[1].dim();
            if prev_out != next_in {
                return Err(MlErr::ShapeMismatch {
                    what: "adjacent layer widths",
                    got: next_in,
                    expected: prev_out,
                });
            }
        }

        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns the width of the input this model expects.
    pub fn input_dim(&self) -> usize {
        self.layers[0].dim().0
    }

    /// Returns the amount of parameters in the model.
    pub fn size(&self) -> usize {
        self.layers.iter().map(Layer::size).sum()
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `x` - The input data, one sample per row.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut trace = self.trace(x)?;
        // `new` guarantees at least one layer.
        Ok(trace.pop().unwrap_or_else(|| x.to_owned()))
    }

    /// Makes a forward pass keeping the output of every layer.
    ///
    /// # Arguments
    /// * `x` - The input data, one sample per row.
    ///
    /// # Returns
    /// The output of each layer, in forward order.
    pub fn trace(&self, x: ArrayView2<f32>) -> Result<Vec<Array2<f32>>> {
        let mut outputs: Vec<Array2<f32>> = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let next = match outputs.last() {
                Some(prev) => layer.forward(prev.view())?,
                None => layer.forward(x)?,
            };
            outputs.push(next);
        }

        Ok(outputs)
    }

    /// Describes every layer of the model, input layer first.
    pub fn describe(&self) -> Vec<LayerDescriptor> {
        self.layers
            .iter()
            .enumerate()
            .map(|(i, layer)| layer.describe(i))
            .collect()
    }
}
