mod common;

use assert_cmd::Command;
use common::{ana, classifier_artifact, csv_bytes, patient, scaler_artifact, write_artifacts, HEADER};
use noshow_predictor::data::{tabular, TableFormat};
use tempfile::tempdir;

fn cli(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("noshow-predictor").expect("binary exists");
    cmd.current_dir(root)
        .env("DATA_DIR", root.join("data"))
        .env("OUTPUTS_DIR", root.join("outputs"))
        .env("MODEL_PATH", root.join("model"))
        .env_remove("MODEL_URL")
        .env_remove("SCHEMA_PATH")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("noshow-predictor").expect("binary exists");
    cmd.arg("--help").assert().success();
}

#[test]
fn predict_writes_table_and_summary() {
    let root = tempdir().unwrap();
    write_artifacts(&root.path().join("model"), &scaler_artifact(), &classifier_artifact());
    let input = root.path().join("citas.csv");
    let mut rows = vec![ana()];
    rows.extend((1..4).map(patient));
    std::fs::write(&input, csv_bytes(HEADER, &rows)).unwrap();

    cli(root.path())
        .args(["predict", "--input"])
        .arg(&input)
        .assert()
        .success();

    let output = root.path().join("outputs/predicciones_resultado.csv");
    let table = tabular::read_path(&output).unwrap();
    assert_eq!(table.height(), 4);
    assert_eq!(
        common::string_column(&table, "Predicción"),
        ["Asistencia", "Inasistencia", "Asistencia", "Inasistencia"]
    );

    let summary: serde_json::Value = serde_json::from_slice(
        &std::fs::read(root.path().join("outputs/predicciones_resultado.csv.summary.json"))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(summary["rows_predicted"], 4);
    assert_eq!(summary["attended"], 2);
    assert!(summary["generated_at"].is_string());
}

#[test]
fn predict_without_model_fails_loudly() {
    let root = tempdir().unwrap();
    let input = root.path().join("citas.csv");
    std::fs::write(&input, csv_bytes(HEADER, &[ana()])).unwrap();
    let output = root.path().join("out.parquet");

    let assert = cli(root.path())
        .args(["predict", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("model artifacts unavailable"), "{stderr}");
    assert!(!output.exists());
}

#[test]
fn schema_command_prints_json() {
    let root = tempdir().unwrap();
    let assert = cli(root.path()).arg("schema").assert().success();
    let schema: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(schema["feature_order"].as_array().unwrap().len(), 12);
}

#[test]
fn parquet_output_is_supported() {
    let root = tempdir().unwrap();
    write_artifacts(&root.path().join("model"), &scaler_artifact(), &classifier_artifact());
    let input = root.path().join("citas.csv");
    std::fs::write(&input, csv_bytes(HEADER, &[ana()])).unwrap();
    let output = root.path().join("result.parquet");

    cli(root.path())
        .args(["predict", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let bytes = std::fs::read(&output).unwrap();
    let table = tabular::read_bytes(bytes, TableFormat::Parquet).unwrap();
    assert_eq!(table.height(), 1);
}
