use ndarray::{ArrayView2, Axis};

/// The loss a model was trained with, evaluated over a batch.
pub trait LossFn {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;
}

/// Mean squared error over every output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        (&y_pred - &y).mapv(|e| e * e).mean().unwrap_or_default()
    }
}

/// Softmax cross entropy over logits, averaged over the batch.
///
/// `y` holds one probability distribution per row, usually one-hot.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl LossFn for CrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        if y_pred.nrows() == 0 {
            return 0.0;
        }

        let total: f32 = y_pred
            .axis_iter(Axis(0))
            .zip(y.axis_iter(Axis(0)))
            .map(|(logits, target)| {
                let max = logits.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
                let log_sum_exp = logits.mapv(|x| (x - max).exp()).sum().ln() + max;
                target
                    .iter()
                    .zip(logits)
                    .map(|(&t, &z)| -t * (z - log_sum_exp))
                    .sum::<f32>()
            })
            .sum();

        total / y_pred.nrows() as f32
    }
}
