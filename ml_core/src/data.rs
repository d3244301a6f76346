use std::fmt;

use crate::Tensor;

/// Errors produced while accessing dataset samples.
#[derive(Debug)]
pub enum DataError {
    /// The requested sample index is out of bounds.
    OutOfBounds { index: usize },

    /// The dataset could not provide a valid sample due to domain constraints.
    InvalidSample(&'static str),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::OutOfBounds { index } => write!(f, "sample index {index} is out of bounds"),
            DataError::InvalidSample(msg) => write!(f, "invalid sample: {msg}"),
        }
    }
}

impl std::error::Error for DataError {}

/// The target attached to a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Class(i64),
    Value(f64),
    Text(String),
    /// A tensor-like target, e.g. one-hot vectors or regression outputs.
    Vector(Vec<f32>),
}

impl Label {
    /// Converts the label into its display string.
    ///
    /// # Returns
    /// `None` when the label has no scalar representation, that is, a vector with a number
    /// of elements other than one.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Label::Class(c) => Some(c.to_string()),
            Label::Value(v) => Some(v.to_string()),
            Label::Text(s) => Some(s.clone()),
            Label::Vector(v) => match v.as_slice() {
                [x] => Some(x.to_string()),
                _ => None,
            },
        }
    }
}

/// A single (input, label) pair.
#[derive(Debug, Clone)]
pub struct Sample {
    pub input: Tensor,
    pub label: Label,
}

/// A group of samples stacked along the leading axis of `inputs`.
///
/// `labels.len()` always equals `inputs.shape()[0]`.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Tensor,
    pub labels: Vec<Label>,
}

impl Batch {
    /// Returns the amount of samples in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Checks that there is exactly one label per input row.
    ///
    /// # Errors
    /// `DataError::InvalidSample` if the batch has no leading axis or the counts differ.
    pub fn validate(&self) -> Result<(), DataError> {
        match self.inputs.shape().first() {
            Some(&rows) if rows == self.labels.len() => Ok(()),
            Some(_) => Err(DataError::InvalidSample("batch labels don't match its input rows")),
            None => Err(DataError::InvalidSample("batch inputs have no leading axis")),
        }
    }

    /// Splits the batch back into its samples.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.inputs
            .outer_iter()
            .zip(&self.labels)
            .map(|(input, label)| Sample {
                input: input.to_owned(),
                label: label.clone(),
            })
    }
}

/// A collection of samples with random access.
///
/// A `Dataset` is responsible only for *providing access* to samples.
/// It does not define:
/// - how samples are batched,
/// - in which order they are visited.
pub trait Dataset {
    /// Returns the total number of samples if known.
    ///
    /// Streaming or infinite datasets should return `None`.
    fn len(&self) -> Option<usize> {
        None
    }

    /// Fetches a sample by index.
    ///
    /// This method is only required to be valid when `len()` returns `Some`.
    ///
    /// # Errors
    /// Returns `DataError::OutOfBounds` if `index` is invalid.
    fn get(&self, index: usize) -> Result<Sample, DataError>;
}

/// Produces batches out of a dataset, in whatever order the loader decides.
///
/// Every call to `batches` starts a fresh pass over the data.
pub trait DataLoader {
    /// The dataset this loader reads from.
    fn dataset(&self) -> &dyn Dataset;

    /// Starts a new pass over the data.
    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_>;
}
