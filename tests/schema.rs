use noshow_predictor::data::RecordSchema;
use tempfile::tempdir;

#[test]
fn clinic_schema_is_consistent() {
    let schema = RecordSchema::clinic();
    schema.validate().unwrap();
    assert_eq!(schema.feature_count(), 12);
    assert_eq!(schema.renames.len(), 12);
    assert_eq!(schema.renames["Nº intervalo"], "Creation to Assignment Interval");
    assert_eq!(
        schema.exclusion_set().collect::<Vec<_>>(),
        [
            "ID",
            "Paciente",
            "Nº documento",
            "Interlocutor",
            "Un.org.planificada",
            "Tipo de cita"
        ]
    );
}

#[test]
fn override_file_round_trips_through_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schema.json");
    let mut schema = RecordSchema::clinic().clone();
    schema.prediction_column = "Prediction".into();
    std::fs::write(&path, serde_json::to_vec(&schema).unwrap()).unwrap();

    let loaded = RecordSchema::from_path(&path).unwrap();
    assert_eq!(loaded, schema);
}

#[test]
fn rename_onto_unknown_feature_is_rejected() {
    let mut schema = RecordSchema::clinic().clone();
    schema.renames.insert("Peso".into(), "Weight".into());
    assert!(schema.validate().is_err());

    let mut schema = RecordSchema::clinic().clone();
    schema.feature_order.push("Age".into());
    assert!(schema.validate().is_err());
}
