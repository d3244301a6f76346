/// The machine learning module's error type, shared with the core crate so models and
/// extractors report failures the same way.
pub use ml_core::MlError as MlErr;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;
