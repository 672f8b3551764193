use std::io::Write;

use redframe::config::{ConfigError, RedframeConfig};
use redframe::model::{CatalogError, ModelCatalog};
use redframe::parser::ParseOptions;
use tempfile::NamedTempFile;

const CATALOG: &str = r#"
models:
  - name: Widget
    table: widgets
    columns: [timestamp, name, kind, units]
    read_options:
      index_col: timestamp
  - name: Reading
    table: telemetry.readings
    columns: [sensor, taken_at, value]
    primary_key: sensor
    read_options:
      parse_dates: [taken_at]
      date_format: "%d/%m/%Y %H:%M"
"#;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_catalog_from_file() {
    let file = write_temp(CATALOG);
    let catalog = ModelCatalog::from_yaml_file(file.path()).unwrap();
    let reading = catalog.get("Reading").unwrap();
    assert_eq!(reading.table, "telemetry.readings");
    assert_eq!(
        reading.read_options.date_format.as_deref(),
        Some("%d/%m/%Y %H:%M")
    );
}

#[test]
fn test_catalog_round_trips_through_yaml() {
    let catalog = ModelCatalog::from_yaml_str(CATALOG).unwrap();
    let yaml = serde_yaml::to_string(&catalog).unwrap();
    assert_eq!(ModelCatalog::from_yaml_str(&yaml).unwrap(), catalog);
}

#[test]
fn test_missing_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelCatalog::from_yaml_file(dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, CatalogError::ReadError { .. }));
}

#[test]
fn test_malformed_catalog() {
    let file = write_temp("models: {name: Widget}");
    assert!(matches!(
        ModelCatalog::from_yaml_file(file.path()),
        Err(CatalogError::ParseError { .. })
    ));
}

#[test]
fn test_config_file_drives_parse_options() {
    let file = write_temp("strict_columns: true\nparse_index: true\nlog_level: debug\n");
    let config = RedframeConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.default_dialect, "sqlite");
    assert_eq!(
        ParseOptions::from_config(&config),
        ParseOptions::new().parse_index(true).strict(true)
    );
}

#[test]
fn test_config_file_rejects_bad_level() {
    let file = write_temp("log_level: chatty\n");
    assert!(matches!(
        RedframeConfig::from_yaml_file(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}
