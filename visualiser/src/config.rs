use std::path::{Path, PathBuf};

use ml_core::Device;
use serde::{Deserialize, Serialize};

use crate::{
    compactification::Compactification,
    error::{Result, VisErr},
    render::Renderer,
    topology::VietorisRips,
};

/// Every knob of a [`Visualiser`](crate::Visualiser).
///
/// Missing fields take their default value when deserializing, so an empty JSON object is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualiserConfig {
    /// Passed to every extractor call.
    pub device: Device,
    /// Samples embedded by the dataset overview.
    pub overview_sample_limit: usize,
    /// Samples fed to the model for activation embeddings and persistence diagrams.
    pub activation_sample_limit: usize,
    /// Dataset rows fed to the model when the Betti surfaces compute the diagrams.
    pub betti_sample_limit: usize,
    pub betti_bins: usize,
    pub rips: VietorisRips,
    pub compactification: Compactification,
    pub render: Renderer,
    /// Seed for bar colours and the compactification sampling, `None` draws one from the OS.
    pub seed: Option<u64>,
    pub log_dir: PathBuf,
}

impl Default for VisualiserConfig {
    fn default() -> Self {
        Self {
            device: Device::Cpu,
            overview_sample_limit: 1000,
            activation_sample_limit: 101,
            betti_sample_limit: 100,
            betti_bins: 100,
            rips: VietorisRips::default(),
            compactification: Compactification::default(),
            render: Renderer::default(),
            seed: None,
            log_dir: PathBuf::from("runs"),
        }
    }
}

impl VisualiserConfig {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    /// `VisErr::Io` if the file can't be read, `VisErr::Json` if it isn't valid JSON and
    /// `VisErr::InvalidConfig` if a value is out of range.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values a deserialized configuration can get wrong.
    pub fn validate(&self) -> Result<()> {
        if self.betti_bins == 0 {
            return Err(VisErr::InvalidConfig("betti_bins must be positive".into()));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(VisErr::InvalidConfig(format!(
                "render size must be positive, got {}x{}",
                self.render.width, self.render.height
            )));
        }

        let cc = &self.compactification;
        if !(0.0..1.0).contains(&cc.epsilon) {
            return Err(VisErr::InvalidConfig(format!(
                "compactification epsilon must be in [0, 1), got {}",
                cc.epsilon
            )));
        }
        if cc.precision < 0.0 {
            return Err(VisErr::InvalidConfig(format!(
                "compactification precision must be non negative, got {}",
                cc.precision
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config: VisualiserConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, VisualiserConfig::default());
        assert_eq!(config.rips.homology_dimensions, vec![0, 1]);
        assert_eq!(config.compactification.n_samples, 500);
    }

    #[test]
    fn partial_config_overrides_only_given_fields() {
        let json = r#"{
            "device": { "accelerator": { "ordinal": 1 } },
            "betti_bins": 20,
            "compactification": { "n_samples": 50 },
            "seed": 7
        }"#;
        let config: VisualiserConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.device, Device::Accelerator { ordinal: 1 });
        assert_eq!(config.betti_bins, 20);
        assert_eq!(config.compactification.n_samples, 50);
        assert_eq!(config.compactification.epsilon, 0.051);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.activation_sample_limit, 101);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "log_dir": "out", "betti_sample_limit": 10 }}"#).unwrap();

        let config = VisualiserConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("out"));
        assert_eq!(config.betti_sample_limit, 10);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "compactification": {{ "epsilon": 1.5 }} }}"#).unwrap();

        let err = VisualiserConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, VisErr::InvalidConfig(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VisualiserConfig::from_json_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, VisErr::Io(_)));
    }
}
