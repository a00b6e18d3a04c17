use std::{fs, num::NonZeroUsize, path::PathBuf};

use machine_learning::dataset::DataFormat;
use serde::Deserialize;

use crate::error::NodeErr;

/// The format of the dataset files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatConfig {
    Libsvm,
    Tsv,
}

impl From<FormatConfig> for DataFormat {
    fn from(value: FormatConfig) -> Self {
        match value {
            FormatConfig::Libsvm => DataFormat::LibSvm,
            FormatConfig::Tsv => DataFormat::Tsv,
        }
    }
}

/// The gradient descent engine used for training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerConfig {
    #[default]
    Sgd,
    Fgd,
}

/// Two generated gaussian blobs, used instead of dataset files.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SyntheticConfig {
    pub points_per_class: usize,
    pub center: f32,
    pub noise: f32,
    pub seed: u64,
}

/// Where the training and test records come from, resolved from a `NodeConfig`.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSource {
    Files {
        train: PathBuf,
        test: PathBuf,
        format: DataFormat,
        sparse: bool,
    },
    Synthetic(SyntheticConfig),
}

/// The configuration of an SVM training run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub workers: NonZeroUsize,
    pub train: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub format: Option<FormatConfig>,
    #[serde(default)]
    pub is_sparse: bool,
    pub synthetic: Option<SyntheticConfig>,
    pub n_iter: usize,
    pub lambda: f32,
    pub alpha: f32,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub report_per_round: bool,
    #[serde(default)]
    pub early_stopping: bool,
}

impl NodeConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_file(path: &str) -> Result<Self, NodeErr> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, NodeErr> {
        let config: NodeConfig = serde_json::from_str(content)?;
        config.source()?;

        if config.alpha == 0. || !config.alpha.is_finite() {
            return Err(NodeErr::Config("alpha must be a finite, non zero number".into()));
        }

        Ok(config)
    }

    /// Resolves where the records come from.
    ///
    /// # Returns
    /// An error unless either `train`, `test` and `format` or `synthetic` are given.
    pub fn source(&self) -> Result<DatasetSource, NodeErr> {
        match (&self.train, &self.test, self.format, self.synthetic) {
            (Some(train), Some(test), Some(format), None) => Ok(DatasetSource::Files {
                train: train.clone(),
                test: test.clone(),
                format: format.into(),
                sparse: self.is_sparse,
            }),
            (None, None, None, Some(synthetic)) => Ok(DatasetSource::Synthetic(synthetic)),
            _ => Err(NodeErr::Config(
                "expected either train, test and format or a synthetic dataset".into(),
            )),
        }
    }
}
