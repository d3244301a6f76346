use std::fmt;

use crate::Device;

/// Errors produced by ML plugins when inputs are invalid.
#[derive(Debug)]
pub enum MlError {
    /// An input is invalid for semantic or domain reasons.
    InvalidInput(&'static str),

    /// A shape invariant was violated (e.g. mismatched lengths).
    ShapeMismatch {
        /// Human-readable context for the mismatch (e.g. "layer input", "batch").
        what: &'static str,
        /// Observed value.
        got: usize,
        /// Expected value.
        expected: usize,
    },

    /// The extractor cannot run on the requested device.
    UnsupportedDevice(Device),

    /// A value could not be represented in the requested dtype.
    InvalidCast {
        /// Name of the target dtype.
        dtype: &'static str,
        /// The offending value.
        value: f32,
    },
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            MlError::ShapeMismatch {
                what,
                got,
                expected,
            } => {
                write!(f, "shape mismatch for {what}: got {got}, expected {expected}")
            }
            MlError::UnsupportedDevice(device) => write!(f, "unsupported device: {device}"),
            MlError::InvalidCast { dtype, value } => {
                write!(f, "cannot cast {value} to {dtype}")
            }
        }
    }
}

impl std::error::Error for MlError {}
