use std::{env, num::NonZeroUsize};

use anyhow::Context;
use log::info;
use machine_learning::{
    SequentialExtractor,
    arch::loss::Mse,
    data::{InMemoryDataset, InMemoryLoader},
    nets::{WeightInit, simple_nn},
};
use ndarray::{Array, Array2, IxDyn, arr1};
use rand::{Rng, SeedableRng, rngs::StdRng};
use visualiser::{
    Pipeline, Visualiser, VisualiserConfig,
    interpreter::{GenericResult, ImageResult, Interpretation, TabularResult, TextResult},
    writer::JsonlWriter,
};

const SAMPLES_PER_RING: usize = 200;
const BATCH_SIZE: usize = 32;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match config_path(env::args().skip(1), env::var("VISUALISER_CONFIG").ok()) {
        Some(path) => VisualiserConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => VisualiserConfig::default(),
    };

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let dataset = InMemoryDataset::two_rings(SAMPLES_PER_RING, 0.1, &mut rng)?;
    let batch_size = NonZeroUsize::new(BATCH_SIZE).context("batch size must be positive")?;
    let loader = InMemoryLoader::shuffled(dataset, batch_size, rng.random());

    let model = simple_nn(10, 0.0, WeightInit::FanIn, &mut rng)?;
    let extractor = SequentialExtractor::new(model, Mse::new(), config.seed);

    let mut writer = JsonlWriter::create(&config.log_dir)?;
    info!("writing records to {}", writer.path().display());

    let pipe = Pipeline::new(extractor, &mut writer).with_loader(loader);
    let mut vis = Visualiser::new(pipe, config);

    vis.render_dataset_overview()?;
    vis.render_activation_embeddings(None)?;
    vis.render_persistence_diagrams(None)?;
    let surfaces = vis.render_betti_surfaces(None, None)?;
    info!(surfaces = surfaces.len(); "rendered betti surfaces");

    let direct = vis.render_decision_boundary(false)?;
    let compact = vis.render_decision_boundary(true)?;
    info!(
        direct = direct.embedding.nrows(),
        compact = compact.embedding.nrows();
        "rendered decision boundaries"
    );

    for interpretation in sample_interpretations() {
        vis.render_interpretation(&interpretation)?;
    }

    Ok(())
}

/// The first argument, falling back to the `VISUALISER_CONFIG` environment variable.
fn config_path(mut args: impl Iterator<Item = String>, from_env: Option<String>) -> Option<String> {
    args.next().or(from_env)
}

/// Made up attributions, one per kind of input.
fn sample_interpretations() -> Vec<Interpretation> {
    let ramp = Array::from_shape_fn(IxDyn(&[3, 16, 16]), |ix| (ix[1] * 16 + ix[2]) as f32 / 255.0);

    vec![
        Interpretation::Text(TextResult {
            method: "occlusion".into(),
            tokens: ["the", "rings", "are", "separable"].map(String::from).to_vec(),
            attributions: arr1(&[0.05, 0.7, -0.1, 0.4]),
        }),
        Interpretation::Image(ImageResult {
            method: "integrated_gradients".into(),
            x: ramp.clone(),
            attribution: ramp.mapv(|v| v - 0.5),
        }),
        Interpretation::Tabular(TabularResult {
            method: "feature_ablation".into(),
            x: Array2::<f32>::ones((8, 2)).into_dyn(),
            attributions: vec![
                Array2::from_shape_fn((8, 2), |(i, j)| (i + j) as f32).into_dyn(),
                Array2::from_shape_fn((8, 2), |(i, j)| i as f32 - j as f32 * 4.0).into_dyn(),
            ],
            features: vec!["ablation".into(), "shapley".into()],
        }),
        Interpretation::Generic(GenericResult {
            method: "saliency".into(),
            x: ramp.clone(),
            attribution: ramp.mapv(f32::abs),
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_config_path_wins_over_the_environment() {
        let args = ["a.json".to_string()].into_iter();
        assert_eq!(config_path(args, Some("b.json".into())).as_deref(), Some("a.json"));
    }

    #[test]
    fn environment_config_path_is_the_fallback() {
        assert_eq!(config_path(std::iter::empty(), Some("b.json".into())).as_deref(), Some("b.json"));
        assert_eq!(config_path(std::iter::empty(), None), None);
    }
}
