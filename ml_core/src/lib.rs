pub mod boundary;
mod data;
mod error;
mod model;
mod tensor;

pub use data::{Batch, DataError, DataLoader, Dataset, Label, Sample};
pub use error::MlError;
pub use model::{LayerDescriptor, ModelExtractor};
pub use tensor::{DType, Device, Tensor};
