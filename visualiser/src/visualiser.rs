use log::{debug, info, warn};
use ml_core::{Batch, DType, Label, ModelExtractor, Tensor};
use ndarray::{Array1, Array2, Array3, Array4, Axis};
use plotters::style::RGBColor;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    compactification::CompactBoundary,
    config::VisualiserConfig,
    error::{Result, VisErr},
    interpreter::{
        GenericResult, ImageResult, Interpretation, TabularResult, TextResult, attribution_hwc,
        feature_series, image_hwc,
    },
    mds::ClassicalMds,
    normalize::normalize_for_image_display,
    pipeline::Pipeline,
    render::{Figure, LegendEntry, make_grid},
    sampling::{draw_samples, first_sample, flatten_rows, take_dataset_rows},
    topology::{BettiCurve, PersistenceBackend, PersistenceDiagram, persistence_diagrams_of_activations},
    writer::{DataFormat, Embedding, SummaryWriter},
};

const DATASET_TAG: &str = "dataset";
const PERSISTENCE_TAG: &str = "persistence_diagrams_of_activations";
const BOUNDARY_TAG: &str = "decision_boundary";
const COMPACT_BOUNDARY_TAG: &str = "compactified_decision_boundary";
const LABEL_PLACEHOLDER: &str = "Label not available";
const GRID_NROW: usize = 8;
const GRID_PADDING: usize = 2;
const MDS_COMPONENTS: usize = 3;
const DEFAULT_HOMOLOGY_DIMENSIONS: [usize; 2] = [0, 1];

/// The Betti numbers of one homology dimension across every layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BettiSurface {
    pub dim: usize,
    /// `(layers, bins)` Betti numbers.
    pub values: Array2<f32>,
    /// The filtration value of every bin.
    pub samplings: Array1<f32>,
    pub pixels: Array3<f32>,
}

impl BettiSurface {
    /// A surface with no layers and no bins.
    fn empty(dim: usize) -> Self {
        Self {
            dim,
            values: Array2::zeros((0, 0)),
            samplings: Array1::zeros(0),
            pixels: Array3::zeros((0, 0, 3)),
        }
    }
}

/// What [`Visualiser::render_decision_boundary`] found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionBoundary {
    /// The boundary points, or their MDS embedding for the compactified boundary.
    pub embedding: Array2<f32>,
    /// Only for the compactified boundary.
    pub distances: Option<Array2<f32>>,
    /// Only for the compactified boundary, `1` for points on the boundary.
    pub labels: Option<Array1<u8>>,
}

/// Where the inputs of the persistence diagrams come from.
#[derive(Debug, Clone, Copy)]
enum DiagramSource {
    /// The first samples yielded by the primary loader.
    LoaderSamples,
    /// The first rows of the primary loader's dataset.
    DatasetRows,
}

/// Sends visualisations of a model and its data to the pipeline's dashboard writer.
///
/// The persistence diagrams of the activations are computed once and reused by every
/// later call until [`invalidate`](Self::invalidate) is called, e.g. after the model was
/// trained further.
pub struct Visualiser<'a, E, W: ?Sized> {
    pipe: Pipeline<'a, E, W>,
    config: VisualiserConfig,
    backend: Box<dyn PersistenceBackend>,
    rng: StdRng,
    persistence_diagrams: Option<Vec<PersistenceDiagram>>,
}

impl<'a, E, W> Visualiser<'a, E, W>
where
    E: ModelExtractor,
    W: SummaryWriter + ?Sized,
{
    /// Creates a new `Visualiser` computing persistence with the configured Vietoris-Rips
    /// settings.
    pub fn new(pipe: Pipeline<'a, E, W>, config: VisualiserConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            pipe,
            backend: Box::new(config.rips.clone()),
            config,
            rng,
            persistence_diagrams: None,
        }
    }

    /// Replaces the persistence algorithm. Drops any cached diagram.
    pub fn with_backend(mut self, backend: impl PersistenceBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self.persistence_diagrams = None;
        self
    }

    pub fn config(&self) -> &VisualiserConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline<'a, E, W> {
        &self.pipe
    }

    pub fn into_pipeline(self) -> Pipeline<'a, E, W> {
        self.pipe
    }

    /// The cached persistence diagrams, one per layer, if computed.
    pub fn persistence_diagrams(&self) -> Option<&[PersistenceDiagram]> {
        self.persistence_diagrams.as_deref()
    }

    /// Forgets the cached persistence diagrams, the next call needing them recomputes them.
    pub fn invalidate(&mut self) {
        if self.persistence_diagrams.take().is_some() {
            debug!("dropped cached persistence diagrams");
        }
    }

    /// Sends the model graph and an embedding of the raw dataset.
    ///
    /// Up to `overview_sample_limit` samples are embedded, labelled with their stringified
    /// labels. Samples with at least two axes are also tiled into a `"dataset"` image and
    /// attached to the embedding as thumbnails. An empty or missing loader yields a graph
    /// without input shape and an empty embedding.
    pub fn render_dataset_overview(&mut self) -> Result<()> {
        let (input_shape, samples) = match self.pipe.primary_loader() {
            Some(loader) => (
                loader.batches().next().map(|b| b.inputs.shape().to_vec()),
                draw_samples(loader, self.config.overview_sample_limit)?,
            ),
            None => (None, None),
        };

        self.pipe
            .writer
            .add_graph(self.pipe.extractor.layers(), input_shape)?;

        let Some(Batch { inputs, labels }) = samples else {
            warn!("no samples for the dataset overview");
            let empty = Embedding::new(Array2::zeros((0, 0))).with_metadata(Vec::new());
            self.pipe.writer.add_embedding(DATASET_TAG, empty, 0)?;
            return self.pipe.writer.flush();
        };

        let mut embedding = Embedding::new(flatten_rows(&inputs)?).with_metadata(metadata(&labels));
        if inputs.ndim() >= 3 {
            let images = image_batch(&inputs)?;
            let grid = make_grid(images.view(), GRID_NROW, GRID_PADDING)?;
            self.pipe
                .writer
                .add_image(DATASET_TAG, grid.into_dyn(), DataFormat::Chw, 0)?;
            embedding = embedding.with_label_images(images.into_dyn());
        }

        info!(samples = labels.len(); "sending dataset overview");
        self.pipe.writer.add_embedding(DATASET_TAG, embedding, 0)?;
        self.pipe.writer.flush()
    }

    /// Sends one `"activations_{layer}"` embedding per layer, flushing after each.
    ///
    /// Without samples every layer still gets an embedding, with no rows.
    ///
    /// # Arguments
    /// * `dtype` - The dtype the inputs are cast to before being fed to the model.
    ///
    /// # Errors
    /// Cast and extraction failures are returned as `VisErr::Ml`.
    pub fn render_activation_embeddings(&mut self, dtype: Option<DType>) -> Result<()> {
        let Some(Batch { inputs, labels }) = self.draw_primary(self.config.activation_sample_limit)? else {
            warn!("no samples to compute activations on");
            return self.send_empty_activations();
        };

        let inputs = cast(inputs, dtype)?;
        let activations = self
            .pipe
            .extractor
            .get_activations(&inputs, self.config.device)?;
        let metadata = metadata(&labels);
        let total = activations.len();

        for (layer, activation) in activations.iter().enumerate() {
            debug!(layer = layer + 1, total = total; "sending activation embedding");
            let embedding = Embedding::new(flatten_rows(activation)?).with_metadata(metadata.clone());
            self.pipe
                .writer
                .add_embedding(&format!("activations_{layer}"), embedding, 0)?;
            self.pipe.writer.flush()?;
        }

        info!(layers = total, samples = labels.len(); "sent activation embeddings");
        Ok(())
    }

    /// Sends the persistence diagram of every layer as a single NHWC image batch.
    ///
    /// The diagrams are computed from the first `activation_sample_limit` samples unless
    /// already cached. Without samples the batch is sent with no images.
    pub fn render_persistence_diagrams(&mut self, dtype: Option<DType>) -> Result<()> {
        let images = if self.ensure_diagrams(DiagramSource::LoaderSamples, dtype)? {
            let diagrams = self.persistence_diagrams.as_deref().unwrap_or_default();
            diagrams
                .iter()
                .map(|d| self.config.render.persistence_diagram(d))
                .collect::<Result<Vec<_>>>()?
        } else {
            warn!("no samples to compute persistence diagrams on");
            Vec::new()
        };

        let batch = if images.is_empty() {
            let (width, height) = (self.config.render.width, self.config.render.height);
            Array4::zeros((0, height as usize, width as usize, 3))
        } else {
            let views: Vec<_> = images.iter().map(|a| a.view()).collect();
            ndarray::stack(Axis(0), &views).map_err(|_| VisErr::Shape {
                what: "persistence diagram images",
                shape: images[0].shape().to_vec(),
            })?
        };

        self.pipe
            .writer
            .add_images(PERSISTENCE_TAG, batch.into_dyn(), DataFormat::Nhwc, 0)?;
        self.pipe.writer.flush()
    }

    /// Sends and returns one Betti surface per homology dimension.
    ///
    /// Unless already cached, the diagrams are computed from the first
    /// `betti_sample_limit` rows of the primary loader's dataset. Without rows every
    /// requested dimension gets an empty surface.
    ///
    /// # Arguments
    /// * `homology_dimensions` - The dimensions to draw, `[0, 1]` when `None`.
    /// * `dtype` - The dtype the inputs are cast to before being fed to the model.
    pub fn render_betti_surfaces(
        &mut self,
        homology_dimensions: Option<Vec<usize>>,
        dtype: Option<DType>,
    ) -> Result<Vec<BettiSurface>> {
        let dims = homology_dimensions.unwrap_or_else(|| DEFAULT_HOMOLOGY_DIMENSIONS.to_vec());
        if !self.ensure_diagrams(DiagramSource::DatasetRows, dtype)? {
            warn!("no dataset rows to compute persistence diagrams on");
            return self.send_empty_surfaces(&dims);
        }

        let diagrams = self.persistence_diagrams.as_deref().unwrap_or_default();
        let (curve, curves) = BettiCurve::fit_transform(diagrams, &dims, self.config.betti_bins)?;

        let mut surfaces = Vec::with_capacity(dims.len());
        for &dim in &dims {
            let Some(values) = curve.surface(&curves, dim) else {
                continue;
            };
            let pixels = self.config.render.heat_map(values)?;
            let samplings = curve.sampling(dim).cloned().unwrap_or_default();

            self.pipe.writer.add_image(
                &format!("betti_surface_dim_{dim}"),
                pixels.clone().into_dyn(),
                DataFormat::Hwc,
                0,
            )?;
            surfaces.push(BettiSurface {
                dim,
                values: values.to_owned(),
                samplings,
                pixels,
            });
        }

        self.pipe.writer.flush()?;
        Ok(surfaces)
    }

    /// Sends an embedding of the decision boundary around the first sample of the primary
    /// loader.
    ///
    /// The direct path embeds the points the extractor finds on the boundary. The
    /// compactified path samples the whole compactified input space, measures it and
    /// embeds the distance matrix in three dimensions with MDS.
    pub fn render_decision_boundary(&mut self, use_compactification: bool) -> Result<DecisionBoundary> {
        let tag = if use_compactification {
            COMPACT_BOUNDARY_TAG
        } else {
            BOUNDARY_TAG
        };

        let Some(x) = self.pipe.primary_loader().and_then(first_sample) else {
            warn!("no sample to locate the decision boundary around");
            self.pipe
                .writer
                .add_embedding(tag, Embedding::new(Array2::zeros((0, 0))), 0)?;
            self.pipe.writer.flush()?;
            return Ok(DecisionBoundary::default());
        };

        let device = self.config.device;
        let boundary = if use_compactification {
            let CompactBoundary {
                distances, labels, ..
            } = self.config.compactification.create_final_distance_matrix(
                &self.pipe.extractor,
                x.len(),
                device,
                &mut self.rng,
            )?;
            let embedding = ClassicalMds::new(MDS_COMPONENTS).fit_transform(distances.view())?;

            DecisionBoundary {
                embedding,
                distances: Some(distances),
                labels: Some(labels),
            }
        } else {
            let points = self.pipe.extractor.get_decision_boundary(&x, device)?;
            DecisionBoundary {
                embedding: flatten_rows(&points)?,
                distances: None,
                labels: None,
            }
        };

        info!(points = boundary.embedding.nrows(); "sending decision boundary");
        self.pipe
            .writer
            .add_embedding(tag, Embedding::new(boundary.embedding.clone()), 0)?;
        self.pipe.writer.flush()?;
        Ok(boundary)
    }

    /// Sends a strip of the token attributions as an image tagged with the method name.
    pub fn render_interpreter_text(&mut self, result: &TextResult) -> Result<Figure> {
        if result.tokens.len() != result.attributions.len() {
            return Err(VisErr::Shape {
                what: "token attributions",
                shape: result.attributions.shape().to_vec(),
            });
        }

        let pixels = self
            .config
            .render
            .token_strip(&result.tokens, result.attributions.view())?;
        self.pipe
            .writer
            .add_image(&result.method, pixels.clone().into_dyn(), DataFormat::Hwc, 0)?;
        self.pipe.writer.flush()?;

        Ok(Figure::new(pixels))
    }

    /// Sends the image, its attribution and their blend as a figure tagged with the method
    /// name.
    pub fn render_interpreter_image(&mut self, result: &ImageResult) -> Result<Figure> {
        let image = image_hwc(&result.x)?;
        let (h, w, _) = image.dim();
        let attribution = attribution_hwc(&result.attribution, (h, w))?;

        let pixels = self
            .config
            .render
            .image_triptych(image.view(), attribution.view())?;
        let figure = Figure::new(pixels);

        self.pipe.writer.add_figure(&result.method, figure.clone(), 0)?;
        self.pipe.writer.flush()?;
        Ok(figure)
    }

    /// Sends a bar chart comparing the normalised feature attributions of every algorithm,
    /// each drawn in a random colour.
    pub fn render_feature_importance(&mut self, result: &TabularResult) -> Result<Figure> {
        let series: Vec<(Array1<f32>, RGBColor)> = feature_series(&result.attributions)?
            .into_iter()
            .map(|s| (s, random_color(&mut self.rng)))
            .collect();

        let pixels = self.config.render.feature_bars(&series)?;
        let legend = series
            .iter()
            .enumerate()
            .map(|(i, (_, color))| LegendEntry {
                label: result
                    .features
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("attribution {i}")),
                color: [color.0, color.1, color.2],
            })
            .collect();
        let figure = Figure { pixels, legend };

        self.pipe.writer.add_figure(&result.method, figure.clone(), 0)?;
        self.pipe.writer.flush()?;
        Ok(figure)
    }

    /// Sends heat maps of the input and of its attribution after coercing both into
    /// displayable images.
    ///
    /// # Returns
    /// The input figure and the attribution figure.
    pub fn render_attribution(&mut self, result: &GenericResult) -> Result<(Figure, Figure)> {
        let datum = normalize_for_image_display(&result.x)?;
        let attribution = normalize_for_image_display(&result.attribution)?;

        let datum = Figure::new(self.config.render.attribution_map(datum.view())?);
        let attribution = Figure::new(self.config.render.attribution_map(attribution.view())?);

        let writer = &mut *self.pipe.writer;
        writer.add_figure(&format!("{}/Datum x", result.method), datum.clone(), 0)?;
        writer.add_figure(
            &format!("{}/Generic attribution of x", result.method),
            attribution.clone(),
            0,
        )?;
        writer.flush()?;

        Ok((datum, attribution))
    }

    /// Routes an interpretation to its renderer.
    pub fn render_interpretation(&mut self, interpretation: &Interpretation) -> Result<Vec<Figure>> {
        debug!(method = interpretation.method(); "rendering interpretation");
        match interpretation {
            Interpretation::Text(r) => self.render_interpreter_text(r).map(|f| vec![f]),
            Interpretation::Image(r) => self.render_interpreter_image(r).map(|f| vec![f]),
            Interpretation::Tabular(r) => self.render_feature_importance(r).map(|f| vec![f]),
            Interpretation::Generic(r) => self.render_attribution(r).map(|(a, b)| vec![a, b]),
        }
    }

    fn send_empty_activations(&mut self) -> Result<()> {
        for (layer, descriptor) in self.pipe.extractor.layers().iter().enumerate() {
            let embedding =
                Embedding::new(Array2::zeros((0, descriptor.output_dim))).with_metadata(Vec::new());
            self.pipe
                .writer
                .add_embedding(&format!("activations_{layer}"), embedding, 0)?;
            self.pipe.writer.flush()?;
        }
        Ok(())
    }

    fn send_empty_surfaces(&mut self, dims: &[usize]) -> Result<Vec<BettiSurface>> {
        let surfaces: Vec<_> = dims.iter().map(|&dim| BettiSurface::empty(dim)).collect();
        for surface in &surfaces {
            self.pipe.writer.add_image(
                &format!("betti_surface_dim_{}", surface.dim),
                surface.pixels.clone().into_dyn(),
                DataFormat::Hwc,
                0,
            )?;
        }

        self.pipe.writer.flush()?;
        Ok(surfaces)
    }

    fn draw_primary(&self, limit: usize) -> Result<Option<Batch>> {
        match self.pipe.primary_loader() {
            Some(loader) => draw_samples(loader, limit),
            None => Ok(None),
        }
    }

    /// Fills the diagram cache if empty.
    ///
    /// # Returns
    /// Whether diagrams are available.
    fn ensure_diagrams(&mut self, source: DiagramSource, dtype: Option<DType>) -> Result<bool> {
        if self.persistence_diagrams.is_some() {
            debug!("reusing cached persistence diagrams");
            return Ok(true);
        }

        let inputs = match source {
            DiagramSource::LoaderSamples => self
                .draw_primary(self.config.activation_sample_limit)?
                .map(|b| b.inputs),
            DiagramSource::DatasetRows => match self.pipe.primary_loader() {
                Some(loader) => take_dataset_rows(loader.dataset(), self.config.betti_sample_limit)?,
                None => None,
            },
        };
        let Some(inputs) = inputs else {
            return Ok(false);
        };

        let inputs = cast(inputs, dtype)?;
        let activations = self
            .pipe
            .extractor
            .get_activations(&inputs, self.config.device)?;
        let diagrams = persistence_diagrams_of_activations(&activations, self.backend.as_ref())?;

        info!(layers = diagrams.len(), samples = inputs.len_of(Axis(0)); "computed persistence diagrams");
        self.persistence_diagrams = Some(diagrams);
        Ok(true)
    }
}

fn cast(inputs: Tensor, dtype: Option<DType>) -> Result<Tensor> {
    match dtype {
        Some(dtype) => Ok(dtype.cast(&inputs)?),
        None => Ok(inputs),
    }
}

fn metadata(labels: &[Label]) -> Vec<String> {
    labels
        .iter()
        .map(|l| l.to_text().unwrap_or_else(|| LABEL_PLACEHOLDER.to_string()))
        .collect()
}

/// Views a `(N, *sample)` batch of at least two axis samples as `(N, C, H, W)` images, all
/// leading sample axes folded into channels.
fn image_batch(inputs: &Tensor) -> Result<Array4<f32>> {
    let shape = inputs.shape();
    let shape_err = || VisErr::Shape {
        what: "image batch",
        shape: shape.to_vec(),
    };

    let [n, rest @ .., h, w] = shape else {
        return Err(shape_err());
    };
    let channels = rest.iter().product();

    inputs
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((*n, channels, *h, *w))
        .map_err(|_| shape_err())
}

fn random_color<R: Rng>(rng: &mut R) -> RGBColor {
    RGBColor(rng.random(), rng.random(), rng.random())
}
