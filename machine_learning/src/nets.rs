//! Small fixed-topology networks used to exercise the visualisation pipeline.
use rand::Rng;

use crate::{
    Result,
    arch::{
        Sequential,
        activations::ActFn,
        layers::{Dense, Layer},
    },
};

/// How the weights of the sample networks are initialised. Biases are always drawn from
/// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WeightInit {
    /// All weights start at zero.
    #[default]
    Zeros,
    /// Weights drawn from the same distribution as the biases.
    FanIn,
}

fn dense<R: Rng>(
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    init: WeightInit,
    rng: &mut R,
) -> Result<Layer> {
    let dense = match init {
        WeightInit::Zeros => Dense::zero_weights(dim, act_fn, rng)?,
        WeightInit::FanIn => Dense::random(dim, act_fn, rng)?,
    };
    Ok(Layer::dense(dense))
}

/// A `2 - nodes_layer_1 - 2` network with leaky relu activations and a dropout layer
/// between the two dense layers.
pub fn simple_nn<R: Rng>(
    nodes_layer_1: usize,
    dropout_p: f32,
    init: WeightInit,
    rng: &mut R,
) -> Result<Sequential> {
    Sequential::new([
        dense((2, nodes_layer_1), Some(ActFn::leaky_relu()), init, rng)?,
        Layer::dropout(nodes_layer_1, dropout_p),
        dense((nodes_layer_1, 2), Some(ActFn::leaky_relu()), init, rng)?,
    ])
}

/// A `2 - 16 - 32 - 64 - 2` network with leaky relu activations and dropout after every
/// hidden layer.
pub fn deeper_nn<R: Rng>(
    dropout_p: f32,
    init: WeightInit,
    rng: &mut R,
) -> Result<Sequential> {
    let widths = [2, 16, 32, 64, 2];
    let mut layers = Vec::new();

    for (i, pair) in widths.windows(2).enumerate() {
        layers.push(dense((pair[0], pair[1]), Some(ActFn::leaky_relu()), init, rng)?);
        if i + 2 < widths.len() {
            layers.push(Layer::dropout(pair[1], dropout_p));
        }
    }

    Sequential::new(layers)
}

/// A single sigmoid unit over `dim_input` features.
pub fn logistic_regression<R: Rng>(dim_input: usize, rng: &mut R) -> Result<Sequential> {
    Sequential::new([dense(
        (dim_input, 1),
        Some(ActFn::sigmoid(1.0)),
        WeightInit::FanIn,
        rng,
    )?])
}
