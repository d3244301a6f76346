//! Dashboard visualisations of a neural network: embeddings of its data and activations,
//! the topology of the activations, its decision boundary and attribution figures.
pub mod compactification;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod mds;
pub mod normalize;
mod pipeline;
pub mod render;
pub mod sampling;
pub mod topology;
mod visualiser;
pub mod writer;

pub use config::VisualiserConfig;
pub use error::{Result, VisErr};
pub use normalize::normalize_for_image_display;
pub use pipeline::Pipeline;
pub use visualiser::{BettiSurface, DecisionBoundary, Visualiser};
