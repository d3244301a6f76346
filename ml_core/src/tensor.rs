use std::fmt;

use half::{bf16, f16};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::MlError;

/// The dense tensor type shared by the whole workspace.
///
/// Values are always stored as `f32`; lower precision dtypes are emulated by rounding
/// through the target representation (see [`DType::cast`]).
pub type Tensor = ArrayD<f32>;

/// The element type a tensor should be converted to before being fed to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    F32,
    F16,
    Bf16,
    I64,
}

impl DType {
    /// Returns the canonical name of this dtype.
    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::F16 => "f16",
            DType::Bf16 => "bf16",
            DType::I64 => "i64",
        }
    }

    /// Casts every element of `tensor` to this dtype.
    ///
    /// # Arguments
    /// * `tensor` - The tensor to convert.
    ///
    /// # Returns
    /// A new tensor holding the converted values.
    ///
    /// # Errors
    /// `MlError::InvalidCast` if a value has no representation in the target dtype, which
    /// only happens for `I64` with non finite or out of range values.
    pub fn cast(self, tensor: &Tensor) -> Result<Tensor, MlError> {
        match self {
            DType::F32 => Ok(tensor.clone()),
            DType::F16 => Ok(tensor.mapv(|x| f16::from_f32(x).to_f32())),
            DType::Bf16 => Ok(tensor.mapv(|x| bf16::from_f32(x).to_f32())),
            DType::I64 => {
                if let Some(&value) = tensor
                    .iter()
                    .find(|x| !x.is_finite() || x.abs() >= i64::MAX as f32)
                {
                    return Err(MlError::InvalidCast {
                        dtype: self.name(),
                        value,
                    });
                }

                Ok(tensor.mapv(|x| x.trunc()))
            }
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the extractor should run its computations.
///
/// There is no ambient "current device": every call that touches a model receives it
/// explicitly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Accelerator {
        ordinal: usize,
    },
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Accelerator { ordinal } => write!(f, "accelerator:{ordinal}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, IxDyn};

    #[test]
    fn f32_cast_is_identity() {
        let t = arr1(&[0.1_f32, -2.5, 3.3]).into_dyn();
        assert_eq!(DType::F32.cast(&t).unwrap(), t);
    }

    #[test]
    fn f16_cast_rounds_to_half_precision() {
        let t = arr1(&[0.1_f32, 1.0]).into_dyn();
        let cast = DType::F16.cast(&t).unwrap();
        assert_eq!(cast[1], 1.0);
        assert_ne!(cast[0], 0.1);
        assert!((cast[0] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn i64_cast_truncates_towards_zero() {
        let t = arr1(&[1.9_f32, -1.9, 0.0]).into_dyn();
        let cast = DType::I64.cast(&t).unwrap();
        assert_eq!(cast, arr1(&[1.0_f32, -1.0, 0.0]).into_dyn());
    }

    #[test]
    fn i64_cast_rejects_non_finite_values() {
        let mut t = Tensor::zeros(IxDyn(&[2, 2]));
        t[[1, 0]] = f32::NAN;
        let err = DType::I64.cast(&t).unwrap_err();
        assert!(matches!(err, MlError::InvalidCast { dtype: "i64", .. }));
    }

    #[test]
    fn device_display() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Accelerator { ordinal: 1 }.to_string(), "accelerator:1");
    }
}
