pub mod arch;
pub mod data;
pub mod error;
mod extractor;
pub mod nets;

pub use error::{MlErr, Result};
pub use extractor::{BoundarySearch, SequentialExtractor};
