use ndarray::ArrayViewMut2;

/// The nonlinearity applied after a dense layer's affine map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActFn {
    /// `amp / (1 + e^-z)`.
    Sigmoid { amp: f32 },
    /// `z` for non negative inputs, `slope * z` otherwise.
    LeakyRelu { slope: f32 },
}

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid { amp }
    }

    /// Leaky relu with the usual negative slope of `0.01`.
    pub fn leaky_relu() -> Self {
        Self::LeakyRelu { slope: 0.01 }
    }

    #[inline]
    pub fn f(&self, z: f32) -> f32 {
        match *self {
            Self::Sigmoid { amp } => amp / (1.0 + (-z).exp()),
            Self::LeakyRelu { slope } if z < 0.0 => slope * z,
            Self::LeakyRelu { .. } => z,
        }
    }

    /// Applies the function to every pre-activation of a batch.
    pub fn apply(&self, mut z: ArrayViewMut2<f32>) {
        z.mapv_inplace(|z| self.f(z));
    }

    /// Returns the name used in layer descriptors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sigmoid { .. } => "sigmoid",
            Self::LeakyRelu { .. } => "leaky_relu",
        }
    }
}
