//! Pre-fit standard scaler.

use linfa::traits::Transformer;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{model::ArtifactError, pipeline::features::Encodings};

/// Serialized form of the scaler, as exported next to the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    /// Features in the order the scaler was fit on.
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Numeric codes for text-valued features such as sex or insurer.
    #[serde(default)]
    pub encodings: Encodings,
}

/// Per-column `(x - mean) / scale`.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Array1<f64>,
    scale: Array1<f64>,
    encodings: Encodings,
}

impl StandardScaler {
    /// Validate an artifact against the expected feature order.
    pub fn from_artifact(
        artifact: ScalerArtifact,
        feature_order: &[String],
    ) -> Result<Self, ArtifactError> {
        let invalid = |reason: String| ArtifactError::Invalid {
            name: super::SCALER_FILE.to_string(),
            reason,
        };
        if artifact.feature_names != feature_order {
            return Err(invalid(format!(
                "fit on {:?}, expected {:?}",
                artifact.feature_names, feature_order
            )));
        }
        let width = feature_order.len();
        if artifact.mean.len() != width || artifact.scale.len() != width {
            return Err(invalid(format!(
                "{} means and {} scales for {width} features",
                artifact.mean.len(),
                artifact.scale.len()
            )));
        }
        if artifact.mean.iter().any(|m| !m.is_finite()) {
            return Err(invalid("non-finite mean".into()));
        }
        if artifact.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(invalid("scale must be finite and non-zero".into()));
        }
        if let Some(unknown) = artifact
            .encodings
            .keys()
            .find(|name| !feature_order.contains(name))
        {
            return Err(invalid(format!("encoding for unknown feature `{unknown}`")));
        }
        Ok(Self {
            feature_names: artifact.feature_names,
            mean: Array1::from(artifact.mean),
            scale: Array1::from(artifact.scale),
            encodings: artifact.encodings,
        })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn encodings(&self) -> &Encodings {
        &self.encodings
    }
}

impl Transformer<&Array2<f64>, Array2<f64>> for StandardScaler {
    fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean) / &self.scale
    }
}
