//! Bounded draws of samples out of the training pipeline's data.
use ml_core::{Batch, DataError, DataLoader, Dataset, Label, Tensor};
use ndarray::{Array2, Axis};

use crate::error::{Result, VisErr};

/// Takes the first `limit` samples a loader yields, in loader order.
///
/// # Returns
/// The samples stacked into a single batch, `None` if the loader yields nothing.
///
/// # Errors
/// `VisErr::Data` if a batch doesn't carry one label per row, `VisErr::Shape` if the
/// loader's samples don't share a shape.
pub fn draw_samples(loader: &dyn DataLoader, limit: usize) -> Result<Option<Batch>> {
    let mut inputs: Vec<Tensor> = Vec::new();
    let mut labels: Vec<Label> = Vec::new();

    for batch in loader.batches() {
        if labels.len() >= limit {
            break;
        }
        batch.validate()?;
        let take = (limit - labels.len()).min(batch.len());
        inputs.extend(batch.inputs.outer_iter().take(take).map(|row| row.to_owned()));
        labels.extend(batch.labels.into_iter().take(take));
    }

    let Some(inputs) = stack(inputs)? else {
        return Ok(None);
    };
    Ok(Some(Batch { inputs, labels }))
}

/// Reads the first `limit` rows of a dataset by index, ignoring any loader order.
///
/// Datasets of unknown length are read until they report an out of bounds index.
pub fn take_dataset_rows(dataset: &dyn Dataset, limit: usize) -> Result<Option<Tensor>> {
    let end = dataset.len().map_or(limit, |len| len.min(limit));
    let mut inputs = Vec::with_capacity(end);

    for index in 0..end {
        match dataset.get(index) {
            Ok(sample) => inputs.push(sample.input),
            Err(DataError::OutOfBounds { .. }) if dataset.len().is_none() => break,
            Err(e) => return Err(e.into()),
        }
    }

    stack(inputs)
}

/// Returns the first sample of the first batch of a loader.
pub fn first_sample(loader: &dyn DataLoader) -> Option<Tensor> {
    loader
        .batches()
        .find(|b| !b.is_empty())
        .and_then(|b| b.inputs.outer_iter().next().map(|x| x.to_owned()))
}

fn stack(rows: Vec<Tensor>) -> Result<Option<Tensor>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let views: Vec<_> = rows.iter().map(|t| t.view()).collect();
    ndarray::stack(Axis(0), &views)
        .map(Some)
        .map_err(|_| VisErr::Shape {
            what: "stacked samples",
            shape: first.shape().to_vec(),
        })
}

/// Reshapes a `(batch, *features)` tensor into a `(batch, features)` matrix.
///
/// # Errors
/// `VisErr::Shape` for rank zero tensors.
pub fn flatten_rows(tensor: &Tensor) -> Result<Array2<f32>> {
    let shape_err = || VisErr::Shape {
        what: "batched tensor",
        shape: tensor.shape().to_vec(),
    };

    let rows = *tensor.shape().first().ok_or_else(shape_err)?;
    let cols: usize = tensor.shape()[1..].iter().product();

    tensor
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((rows, cols))
        .map_err(|_| shape_err())
}
