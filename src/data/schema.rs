//! Declarative description of the appointment spreadsheet layout.

use std::{collections::HashSet, path::Path};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const IDENTIFIER_COLUMNS: &[&str] = &["ID", "Paciente", "Nº documento"];

const EXTRA_COLUMNS: &[&str] = &["Interlocutor", "Un.org.planificada"];

const EXCLUDED_COLUMNS: &[&str] = &["Tipo de cita"];

/// Source label to canonical feature name, in canonical feature order.
const FEATURE_MAP: &[(&str, &str)] = &[
    ("Edad", "Age"),
    ("Género", "Sex"),
    ("Tipo aseguradora", "Insurance Type"),
    ("Número de diagnósticos", "Number of Diseases"),
    ("Hospitalización reciente", "Recent Hospitalization"),
    ("Número de medicamentos", "Number of Medications"),
    ("Hora", "Hour"),
    ("Día de la semana", "Day"),
    ("Mes", "Month"),
    ("Nº intervalo", "Creation to Assignment Interval"),
    ("Asistencias previas", "Number of Previous Attendance"),
    ("Inasistencias previas", "Number of Previous Non-Attendance"),
];

static CLINIC_SCHEMA: Lazy<RecordSchema> = Lazy::new(|| RecordSchema {
    identifier_columns: to_owned(IDENTIFIER_COLUMNS),
    extra_columns: to_owned(EXTRA_COLUMNS),
    excluded_columns: to_owned(EXCLUDED_COLUMNS),
    renames: FEATURE_MAP
        .iter()
        .map(|(source, target)| ((*source).to_string(), (*target).to_string()))
        .collect(),
    feature_order: FEATURE_MAP
        .iter()
        .map(|(_, target)| (*target).to_string())
        .collect(),
    prediction_column: "Predicción".to_string(),
    attended_label: "Asistencia".to_string(),
    no_show_label: "Inasistencia".to_string(),
});

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Column bookkeeping for one spreadsheet layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Columns used to link a prediction back to the patient.
    pub identifier_columns: Vec<String>,
    /// Administrative columns carried to the output next to the identifiers.
    pub extra_columns: Vec<String>,
    /// Columns that are neither retained nor fed to the model.
    pub excluded_columns: Vec<String>,
    /// Source-language header to canonical feature name.
    pub renames: IndexMap<String, String>,
    /// Feature names in the positional order the artifacts were fit on.
    pub feature_order: Vec<String>,
    /// Name of the appended label column.
    pub prediction_column: String,
    /// Label written for class 1.
    pub attended_label: String,
    /// Label written for class 0.
    pub no_show_label: String,
}

impl RecordSchema {
    /// Built-in layout of the clinic's appointment export.
    pub fn clinic() -> &'static RecordSchema {
        &CLINIC_SCHEMA
    }

    /// Load a layout override from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading schema {}", path.display()))?;
        let schema: RecordSchema = serde_json::from_str(&text)
            .with_context(|| format!("parsing schema {}", path.display()))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Identifier columns followed by the extra retained columns.
    pub fn retained_columns(&self) -> impl Iterator<Item = &str> {
        self.identifier_columns
            .iter()
            .chain(&self.extra_columns)
            .map(String::as_str)
    }

    /// Everything removed before feature preparation.
    pub fn exclusion_set(&self) -> impl Iterator<Item = &str> {
        self.retained_columns()
            .chain(self.excluded_columns.iter().map(String::as_str))
    }

    pub fn feature_count(&self) -> usize {
        self.feature_order.len()
    }

    /// Check the layout is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.feature_order.is_empty() {
            bail!("schema declares no features");
        }
        let mut seen = HashSet::new();
        for name in &self.feature_order {
            if !seen.insert(name.as_str()) {
                bail!("feature `{name}` listed twice");
            }
        }
        let mut targets = HashSet::new();
        for (source, target) in &self.renames {
            if !targets.insert(target.as_str()) {
                bail!("rename target `{target}` used twice");
            }
            if !seen.contains(target.as_str()) {
                bail!("rename `{source}` -> `{target}` targets an unknown feature");
            }
        }
        let retained: Vec<&str> = self.retained_columns().collect();
        if retained.is_empty() {
            bail!("schema retains no identifier columns");
        }
        if retained.contains(&self.prediction_column.as_str()) {
            bail!(
                "prediction column `{}` clashes with a retained column",
                self.prediction_column
            );
        }
        Ok(())
    }
}
