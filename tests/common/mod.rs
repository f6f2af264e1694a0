#![allow(dead_code)]

use std::{fs::File, io::Write, path::Path};

use ndarray::Array2;
use noshow_predictor::{
    data::{tabular, RecordSchema, TableFormat},
    model::{
        classifier::ClassifierArtifact, scaler::ScalerArtifact, InferenceAdapter, Prediction,
        CLASSIFIER_FILE, SCALER_FILE,
    },
    pipeline::{features::Encodings, FeatureTable},
    PipelineError,
};
use polars::prelude::{DataFrame, DataType};

pub const HEADER: &[&str] = &[
    "ID",
    "Paciente",
    "Nº documento",
    "Interlocutor",
    "Un.org.planificada",
    "Tipo de cita",
    "Edad",
    "Género",
    "Tipo aseguradora",
    "Número de diagnósticos",
    "Hospitalización reciente",
    "Número de medicamentos",
    "Hora",
    "Día de la semana",
    "Mes",
    "Nº intervalo",
    "Asistencias previas",
    "Inasistencias previas",
];

pub const OUTPUT_COLUMNS: &[&str] = &[
    "ID",
    "Paciente",
    "Nº documento",
    "Interlocutor",
    "Un.org.planificada",
    "Predicción",
];

pub fn ana() -> Vec<String> {
    [
        "1", "Ana", "X1", "A", "B", "T", "30", "F", "priv", "2", "0", "1", "9", "2", "5", "3", "4",
        "1",
    ]
    .iter()
    .map(|v| v.to_string())
    .collect()
}

/// Deterministic synthetic appointment; attends when `id` is even.
pub fn patient(id: usize) -> Vec<String> {
    let (previous, missed) = if id % 2 == 0 { (5, 1) } else { (0, 4) };
    vec![
        id.to_string(),
        format!("Paciente {id}"),
        format!("DOC{id:04}"),
        format!("INT{}", id % 3),
        format!("UO{}", id % 4),
        "Control".to_string(),
        (20 + id % 50).to_string(),
        if id % 3 == 0 { "M" } else { "F" }.to_string(),
        if id % 2 == 0 { "priv" } else { "pub" }.to_string(),
        (id % 4).to_string(),
        (id % 2).to_string(),
        (id % 5).to_string(),
        (8 + id % 9).to_string(),
        (1 + id % 5).to_string(),
        (1 + id % 12).to_string(),
        (id % 30).to_string(),
        previous.to_string(),
        missed.to_string(),
    ]
}

pub fn csv_bytes(header: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

pub fn frame(header: &[&str], rows: &[Vec<String>]) -> DataFrame {
    tabular::read_bytes(csv_bytes(header, rows), TableFormat::Csv).unwrap()
}

/// Header and rows without the named column.
pub fn without_column(name: &str, rows: &[Vec<String>]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let idx = HEADER.iter().position(|h| *h == name).unwrap();
    let header = HEADER
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, h)| *h)
        .collect();
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, v)| v.clone())
                .collect()
        })
        .collect();
    (header, rows)
}

pub fn string_column(frame: &DataFrame, name: &str) -> Vec<String> {
    let as_text = frame.column(name).unwrap().cast(&DataType::String).unwrap();
    as_text
        .str()
        .unwrap()
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect()
}

pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn encodings() -> Encodings {
    serde_json::from_value(serde_json::json!({
        "Sex": { "F": 0.0, "M": 1.0 },
        "Insurance Type": { "pub": 0.0, "priv": 1.0 }
    }))
    .unwrap()
}

/// Always predicts the same class.
pub struct ConstantModel(pub Prediction);

impl InferenceAdapter for ConstantModel {
    fn normalize(&self, features: &FeatureTable) -> Result<Array2<f64>, PipelineError> {
        Ok(Array2::zeros((features.height(), features.width())))
    }

    fn classify(&self, matrix: &Array2<f64>) -> Result<Vec<Prediction>, PipelineError> {
        Ok(vec![self.0; matrix.nrows()])
    }
}

/// Attends when previous attendances outnumber previous no-shows.
pub struct HistoryModel;

impl InferenceAdapter for HistoryModel {
    fn normalize(&self, features: &FeatureTable) -> Result<Array2<f64>, PipelineError> {
        features.to_matrix(&encodings())
    }

    fn classify(&self, matrix: &Array2<f64>) -> Result<Vec<Prediction>, PipelineError> {
        Ok(matrix
            .rows()
            .into_iter()
            .map(|row| {
                if row[10] > row[11] {
                    Prediction::Attended
                } else {
                    Prediction::NoShow
                }
            })
            .collect())
    }
}

pub fn scaler_artifact() -> ScalerArtifact {
    let width = RecordSchema::clinic().feature_count();
    ScalerArtifact {
        feature_names: RecordSchema::clinic().feature_order.clone(),
        mean: vec![0.0; width],
        scale: vec![1.0; width],
        encodings: encodings(),
    }
}

/// Same decision rule as `HistoryModel`, expressed as logistic weights.
pub fn classifier_artifact() -> ClassifierArtifact {
    let mut coefficients = vec![0.0; RecordSchema::clinic().feature_count()];
    coefficients[10] = 1.0;
    coefficients[11] = -1.0;
    ClassifierArtifact {
        coefficients,
        intercept: 0.0,
        threshold: 0.5,
    }
}

pub fn write_artifacts(dir: &Path, scaler: &ScalerArtifact, classifier: &ClassifierArtifact) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(SCALER_FILE), serde_json::to_vec(scaler).unwrap()).unwrap();
    std::fs::write(dir.join(CLASSIFIER_FILE), serde_json::to_vec(classifier).unwrap()).unwrap();
}

pub fn write_bundle(path: &Path, scaler: &ScalerArtifact, classifier: &ClassifierArtifact) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = zip::write::FileOptions::default();
    zip.start_file(SCALER_FILE, options).unwrap();
    zip.write_all(&serde_json::to_vec(scaler).unwrap()).unwrap();
    zip.start_file(CLASSIFIER_FILE, options).unwrap();
    zip.write_all(&serde_json::to_vec(classifier).unwrap()).unwrap();
    zip.finish().unwrap();
}
