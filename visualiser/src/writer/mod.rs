//! Dashboard sinks.
//!
//! The visualiser never owns its writer: it appends tagged, step indexed [`Record`]s to a
//! borrowed [`SummaryWriter`] and flushes it after each logical group of writes.
mod jsonl;
mod memory;

pub use jsonl::JsonlWriter;
pub use memory::MemoryWriter;

use ml_core::{LayerDescriptor, Tensor};
use ndarray::Array2;
use serde::Serialize;

use crate::{error::Result, render::Figure};

/// Axis layout of the pixels of an image record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataFormat {
    Chw,
    Hwc,
    Nchw,
    Nhwc,
}

/// A point cloud for the dashboard's projector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embedding {
    /// One row per point.
    pub matrix: Array2<f32>,
    /// One string per row.
    pub metadata: Option<Vec<String>>,
    /// One `(C, H, W)` thumbnail per row, stacked along the leading axis.
    pub label_images: Option<Tensor>,
}

impl Embedding {
    pub fn new(matrix: Array2<f32>) -> Self {
        Self {
            matrix,
            metadata: None,
            label_images: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_label_images(mut self, images: Tensor) -> Self {
        self.label_images = Some(images);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    Graph {
        layers: Vec<LayerDescriptor>,
        input_shape: Option<Vec<usize>>,
    },
    Image {
        pixels: Tensor,
        format: DataFormat,
    },
    Images {
        pixels: Tensor,
        format: DataFormat,
    },
    Embedding(Embedding),
    Figure(Figure),
}

/// One entry of the dashboard log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub tag: String,
    pub step: u64,
    #[serde(flatten)]
    pub body: RecordBody,
}

impl Record {
    pub fn embedding(&self) -> Option<&Embedding> {
        match &self.body {
            RecordBody::Embedding(e) => Some(e),
            _ => None,
        }
    }

    pub fn figure(&self) -> Option<&Figure> {
        match &self.body {
            RecordBody::Figure(f) => Some(f),
            _ => None,
        }
    }

    /// Returns the pixels of image and image batch records.
    pub fn pixels(&self) -> Option<(&Tensor, DataFormat)> {
        match &self.body {
            RecordBody::Image { pixels, format } | RecordBody::Images { pixels, format } => {
                Some((pixels, *format))
            }
            _ => None,
        }
    }
}

/// An append only dashboard sink.
///
/// Implementors only provide `append` and `flush`; the `add_*` helpers build the records.
pub trait SummaryWriter {
    /// Appends a record. Records may be buffered until the next `flush`.
    ///
    /// # Errors
    /// Implementation defined, usually `VisErr::Io` or `VisErr::Json`.
    fn append(&mut self, record: Record) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn add_graph(&mut self, layers: Vec<LayerDescriptor>, input_shape: Option<Vec<usize>>) -> Result<()> {
        self.append(Record {
            tag: "model".into(),
            step: 0,
            body: RecordBody::Graph {
                layers,
                input_shape,
            },
        })
    }

    fn add_image(&mut self, tag: &str, pixels: Tensor, format: DataFormat, step: u64) -> Result<()> {
        self.append(Record {
            tag: tag.into(),
            step,
            body: RecordBody::Image { pixels, format },
        })
    }

    fn add_images(&mut self, tag: &str, pixels: Tensor, format: DataFormat, step: u64) -> Result<()> {
        self.append(Record {
            tag: tag.into(),
            step,
            body: RecordBody::Images { pixels, format },
        })
    }

    fn add_embedding(&mut self, tag: &str, embedding: Embedding, step: u64) -> Result<()> {
        self.append(Record {
            tag: tag.into(),
            step,
            body: RecordBody::Embedding(embedding),
        })
    }

    fn add_figure(&mut self, tag: &str, figure: Figure, step: u64) -> Result<()> {
        self.append(Record {
            tag: tag.into(),
            step,
            body: RecordBody::Figure(figure),
        })
    }
}
