//! Rasterisation of plots into normalised pixel tensors.
//!
//! Every plot is drawn with the bitmap backend into an RGB buffer and returned as a
//! `(height, width, 3)` tensor with values in `[0, 1]`. No text is drawn.
mod colormap;
mod grid;
mod plots;

pub use colormap::{diverging_color, heat_color};
pub use grid::make_grid;

use ndarray::Array3;
use plotters::{coord::Shift, prelude::*};
use plotters_bitmap::BitMapBackendError;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VisErr};

pub(crate) type PlotResult = std::result::Result<(), DrawingAreaErrorKind<BitMapBackendError>>;

/// One entry of a figure's legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: [u8; 3],
}

/// A rendered figure: `(height, width, 3)` pixels plus what its colours stand for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub pixels: Array3<f32>,
    pub legend: Vec<LegendEntry>,
}

impl Figure {
    pub fn new(pixels: Array3<f32>) -> Self {
        Self {
            pixels,
            legend: Vec::new(),
        }
    }
}

/// Size of the canvas every plot is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Renderer {
    pub width: u32,
    pub height: u32,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Draws on a white canvas and returns the result as a normalised HWC tensor.
    fn rasterize<F>(&self, draw: F) -> Result<Array3<f32>>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> PlotResult,
    {
        let (width, height) = (self.width as usize, self.height as usize);
        let mut buffer = vec![0u8; width * height * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            root.fill(&WHITE)?;
            draw(&root)?;
            root.present()?;
        }

        let pixels = Array3::from_shape_vec((height, width, 3), buffer).map_err(|_| VisErr::Shape {
            what: "bitmap buffer",
            shape: vec![height, width, 3],
        })?;

        Ok(pixels.mapv(|v| f32::from(v) / 255.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_canvas_is_white() {
        let pixels = Renderer::new(8, 4).rasterize(|_| Ok(())).unwrap();
        assert_eq!(pixels.dim(), (4, 8, 3));
        assert!(pixels.iter().all(|&v| v == 1.0));
    }
}
