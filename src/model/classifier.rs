//! Pre-trained logistic attendance classifier.

use linfa::traits::PredictInplace;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::model::ArtifactError;

fn default_threshold() -> f64 {
    0.5
}

/// Serialized linear model weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Probability at or above which a row is predicted to attend.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    weights: Array1<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticClassifier {
    pub fn from_artifact(artifact: ClassifierArtifact, width: usize) -> Result<Self, ArtifactError> {
        let invalid = |reason: String| ArtifactError::Invalid {
            name: super::CLASSIFIER_FILE.to_string(),
            reason,
        };
        if artifact.coefficients.len() != width {
            return Err(invalid(format!(
                "{} coefficients for {width} features",
                artifact.coefficients.len()
            )));
        }
        if artifact
            .coefficients
            .iter()
            .chain(std::iter::once(&artifact.intercept))
            .any(|w| !w.is_finite())
        {
            return Err(invalid("non-finite weight".into()));
        }
        if !(artifact.threshold > 0.0 && artifact.threshold < 1.0) {
            return Err(invalid(format!(
                "threshold {} outside (0, 1)",
                artifact.threshold
            )));
        }
        Ok(Self {
            weights: Array1::from(artifact.coefficients),
            intercept: artifact.intercept,
            threshold: artifact.threshold,
        })
    }

    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Probability of attendance for every row of `x`.
    pub fn probabilities(&self, x: &Array2<f64>) -> Array1<f64> {
        (x.dot(&self.weights) + self.intercept).mapv(sigmoid)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl PredictInplace<Array2<f64>, Array1<usize>> for LogisticClassifier {
    fn predict_inplace<'a>(&'a self, x: &'a Array2<f64>, y: &mut Array1<usize>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "number of target values must match number of records"
        );
        for (probability, target) in self.probabilities(x).iter().zip(y.iter_mut()) {
            *target = usize::from(*probability >= self.threshold);
        }
    }

    fn default_target(&self, x: &Array2<f64>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}
