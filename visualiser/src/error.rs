use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use ml_core::{DataError, MlError};
use plotters::drawing::DrawingAreaErrorKind;
use plotters_bitmap::BitMapBackendError;

/// The result type used in the entire visualiser crate.
pub type Result<T> = std::result::Result<T, VisErr>;

/// The visualiser's error type.
#[derive(Debug)]
pub enum VisErr {
    /// The model extractor failed, including dtype casts of its inputs.
    Ml(MlError),
    /// A dataset could not provide a sample.
    Data(DataError),
    /// A tensor doesn't have the shape an operation needs.
    Shape {
        what: &'static str,
        shape: Vec<usize>,
    },
    /// The rasteriser failed to draw a plot.
    Render(String),
    Io(io::Error),
    Json(serde_json::Error),
    /// An operation needs at least one element of something it didn't get.
    EmptyInput(&'static str),
    InvalidConfig(String),
}

impl Display for VisErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisErr::Ml(e) => write!(f, "model error: {e}"),
            VisErr::Data(e) => write!(f, "data error: {e}"),
            VisErr::Shape { what, shape } => write!(f, "unexpected shape {shape:?} for {what}"),
            VisErr::Render(msg) => write!(f, "render error: {msg}"),
            VisErr::Io(e) => write!(f, "io error: {e}"),
            VisErr::Json(e) => write!(f, "json error: {e}"),
            VisErr::EmptyInput(what) => write!(f, "{what} is empty"),
            VisErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for VisErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            VisErr::Ml(e) => Some(e),
            VisErr::Data(e) => Some(e),
            VisErr::Io(e) => Some(e),
            VisErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlError> for VisErr {
    fn from(e: MlError) -> Self {
        VisErr::Ml(e)
    }
}

impl From<DataError> for VisErr {
    fn from(e: DataError) -> Self {
        VisErr::Data(e)
    }
}

impl From<io::Error> for VisErr {
    fn from(e: io::Error) -> Self {
        VisErr::Io(e)
    }
}

impl From<serde_json::Error> for VisErr {
    fn from(e: serde_json::Error) -> Self {
        VisErr::Json(e)
    }
}

impl From<DrawingAreaErrorKind<BitMapBackendError>> for VisErr {
    fn from(e: DrawingAreaErrorKind<BitMapBackendError>) -> Self {
        VisErr::Render(e.to_string())
    }
}
