use ml_core::LayerDescriptor;
use ndarray::{Array2, ArrayView2};

use super::{Dense, Dropout};
use crate::{Result, arch::activations::ActFn};

#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    Dropout(Dropout),
}
use Layer::*;

impl Layer {
    pub fn dense(dense: Dense) -> Self {
        Self::Dense(dense)
    }

    pub fn dropout(dim: usize, p: f32) -> Self {
        Self::Dropout(Dropout::new(dim, p))
    }

    /// Returns the amount of parameters in this layer.
    pub fn size(&self) -> usize {
        match self {
            Dense(l) => l.size(),
            Dropout(_) => 0,
        }
    }

    /// Returns the `(input, output)` widths of this layer.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Dense(l) => l.dim(),
            Dropout(l) => (l.dim(), l.dim()),
        }
    }

    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.forward(x),
            Dropout(l) => Ok(l.forward(x)),
        }
    }

    /// Describes this layer as the `index`-th one of its model.
    pub fn describe(&self, index: usize) -> LayerDescriptor {
        let (input_dim, output_dim) = self.dim();
        let (kind, activation) = match self {
            Dense(l) => ("dense", l.act_fn().map(ActFn::name)),
            Dropout(_) => ("dropout", None),
        };

        LayerDescriptor {
            name: format!("{kind}_{index}"),
            kind: kind.to_string(),
            input_dim,
            output_dim,
            activation: activation.map(str::to_string),
        }
    }
}
