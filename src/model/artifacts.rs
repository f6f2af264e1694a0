//! Locating, decoding and validating the scaler / classifier pair.

use std::{
    fs::File,
    io::{Cursor, Read, Seek},
    path::{Path, PathBuf},
};

use linfa::traits::{Predict, Transformer};
use ndarray::{Array1, Array2};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::{
    config::Settings,
    error::PipelineError,
    model::{
        classifier::{ClassifierArtifact, LogisticClassifier},
        fetch::{self, FetchPolicy},
        scaler::{ScalerArtifact, StandardScaler},
        InferenceAdapter, Prediction,
    },
    pipeline::FeatureTable,
};

pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";

/// Why the model artifacts could not be obtained.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no model source configured")]
    NotConfigured,
    #[error("artifact {} not found", .0.display())]
    Missing(PathBuf),
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetching {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("opening bundle {}: {source}", path.display())]
    Bundle {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("decoding {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid artifact {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Where the artifacts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Directory holding `scaler.json` and `classifier.json`.
    Directory(PathBuf),
    /// Zip archive holding the same two files.
    Bundle(PathBuf),
    /// Zip archive behind a URL, cached under `cache_dir`.
    Remote {
        url: String,
        cache_dir: PathBuf,
        policy: FetchPolicy,
    },
}

impl ArtifactSource {
    /// Directory or bundle, depending on the extension.
    pub fn local(path: PathBuf) -> Self {
        let is_zip = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if is_zip {
            Self::Bundle(path)
        } else {
            Self::Directory(path)
        }
    }

    pub fn remote(url: String, settings: &Settings) -> Self {
        Self::Remote {
            url,
            cache_dir: settings.join_data("models"),
            policy: settings.fetch_policy(),
        }
    }

    /// A configured URL wins over the local path.
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.model_url {
            Some(url) => Self::remote(url.clone(), settings),
            None => Self::local(settings.model_path.clone()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Directory(path) | Self::Bundle(path) => path.display().to_string(),
            Self::Remote { url, .. } => url.clone(),
        }
    }
}

/// Scaler and classifier validated against one feature order.
#[derive(Debug, Clone)]
pub struct ArtifactModel {
    scaler: StandardScaler,
    classifier: LogisticClassifier,
}

impl ArtifactModel {
    pub fn new(
        scaler: ScalerArtifact,
        classifier: ClassifierArtifact,
        feature_order: &[String],
    ) -> Result<Self, ArtifactError> {
        let scaler = StandardScaler::from_artifact(scaler, feature_order)?;
        let classifier = LogisticClassifier::from_artifact(classifier, scaler.width())?;
        Ok(Self { scaler, classifier })
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &LogisticClassifier {
        &self.classifier
    }
}

impl InferenceAdapter for ArtifactModel {
    fn normalize(&self, features: &FeatureTable) -> Result<Array2<f64>, PipelineError> {
        if features.column_names() != self.scaler.feature_names() {
            return Err(PipelineError::Processing(format!(
                "feature table columns {:?} do not match the scaler",
                features.column_names()
            )));
        }
        let raw = features.to_matrix(self.scaler.encodings())?;
        Ok(self.scaler.transform(&raw))
    }

    fn classify(&self, matrix: &Array2<f64>) -> Result<Vec<Prediction>, PipelineError> {
        if matrix.ncols() != self.classifier.width() {
            return Err(PipelineError::Processing(format!(
                "matrix has {} columns, classifier expects {}",
                matrix.ncols(),
                self.classifier.width()
            )));
        }
        let classes: Array1<usize> = self.classifier.predict(matrix);
        classes
            .iter()
            .map(|class| {
                Prediction::from_class(*class).ok_or_else(|| {
                    PipelineError::Processing(format!("classifier produced class {class}"))
                })
            })
            .collect()
    }
}

/// Obtain and validate the artifacts described by `source`.
pub async fn load(
    source: &ArtifactSource,
    feature_order: &[String],
) -> Result<ArtifactModel, ArtifactError> {
    let model = match source {
        ArtifactSource::Directory(dir) => load_directory(dir, feature_order)?,
        ArtifactSource::Bundle(path) => load_bundle(path, feature_order)?,
        ArtifactSource::Remote {
            url,
            cache_dir,
            policy,
        } => {
            let cached = fetch::cache_path(url, cache_dir).exists();
            let path = fetch::fetch_bundle(url, cache_dir, *policy, false).await?;
            match load_downloaded(&path, feature_order) {
                Ok(model) => model,
                Err(err) if cached => {
                    warn!(%err, path = %path.display(), "cached model bundle unusable, downloading again");
                    let path = fetch::fetch_bundle(url, cache_dir, *policy, true).await?;
                    load_downloaded(&path, feature_order)?
                }
                Err(err) => return Err(err),
            }
        }
    };
    info!(source = %source.describe(), features = feature_order.len(), "model artifacts ready");
    Ok(model)
}

pub fn load_directory(dir: &Path, feature_order: &[String]) -> Result<ArtifactModel, ArtifactError> {
    let scaler = read_json_file(&dir.join(SCALER_FILE))?;
    let classifier = read_json_file(&dir.join(CLASSIFIER_FILE))?;
    ArtifactModel::new(scaler, classifier, feature_order)
}

pub fn load_bundle(path: &Path, feature_order: &[String]) -> Result<ArtifactModel, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_bundle(file, path, feature_order)
}

// A bundle that fails to load is evicted so the next attempt downloads it again.
fn load_downloaded(path: &Path, feature_order: &[String]) -> Result<ArtifactModel, ArtifactError> {
    load_bundle(path, feature_order).inspect_err(|_| {
        if let Err(err) = std::fs::remove_file(path) {
            warn!(%err, path = %path.display(), "could not evict model bundle");
        }
    })
}

/// Decode a bundle already held in memory.
pub fn load_bundle_bytes(
    bytes: Vec<u8>,
    feature_order: &[String],
) -> Result<ArtifactModel, ArtifactError> {
    read_bundle(Cursor::new(bytes), Path::new("<memory>"), feature_order)
}

fn read_bundle<R: Read + Seek>(
    reader: R,
    path: &Path,
    feature_order: &[String],
) -> Result<ArtifactModel, ArtifactError> {
    let bundle_err = |source| ArtifactError::Bundle {
        path: path.to_path_buf(),
        source,
    };
    let mut archive = ZipArchive::new(reader).map_err(bundle_err)?;
    let scaler = {
        let entry = archive.by_name(SCALER_FILE).map_err(bundle_err)?;
        decode(SCALER_FILE, entry)?
    };
    let classifier = {
        let entry = archive.by_name(CLASSIFIER_FILE).map_err(bundle_err)?;
        decode(CLASSIFIER_FILE, entry)?
    };
    debug!(path = %path.display(), "decoded model bundle");
    ArtifactModel::new(scaler, classifier, feature_order)
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&path.display().to_string(), file)
}

fn decode<T: DeserializeOwned, R: Read>(name: &str, reader: R) -> Result<T, ArtifactError> {
    serde_json::from_reader(reader).map_err(|source| ArtifactError::Decode {
        name: name.to_string(),
        source,
    })
}
