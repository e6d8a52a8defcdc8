// tests/settings_loader_tests.rs
//! Settings file loading and environment overrides

use std::io::Write;

use ecg_quality::{
    CheckerSettings, ConfigError, EcgQualityChecker, FnClassifier, InMemoryModelRegistry,
    ModelKind, ReturnMode, SettingsLoader,
};
use serial_test::serial;
use tempfile::NamedTempFile;

const SETTINGS: &str = r#"
[checker]
model = "cnn5s"
return_mode = "three_value"
return_type = "intervals"
stride = 0.5

[thresholds]
"cnn5s.three_value" = [0.35, 0.75]
"cnn2s.binary_clean" = [0.5]
"#;

fn settings_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_file_and_build_checker() {
    let file = settings_file(SETTINGS);
    let loaded = SettingsLoader::with_path(file.path())
        .load_with_env(Vec::new())
        .unwrap();

    assert_eq!(loaded.settings.model, "cnn5s");
    assert_eq!(loaded.thresholds.len(), 2);

    let models = InMemoryModelRegistry::new()
        .with(ModelKind::Cnn5s, FnClassifier::constant(1250, 0.5));
    let checker = EcgQualityChecker::new(&loaded.settings, &models, &loaded.thresholds).unwrap();

    assert_eq!(checker.config().mode(), ReturnMode::ThreeValue);
    assert_eq!(checker.config().thresholds(), vec![0.35, 0.75]);
    assert_eq!(checker.config().stride(), 625);
}

#[test]
fn test_explicit_environment_overrides() {
    let file = settings_file(SETTINGS);
    let vars = vec![
        ("ECG_QUALITY_MODEL".to_string(), "cnn2s".to_string()),
        ("ECG_QUALITY_RETURN_MODE".to_string(), "binary_clean".to_string()),
        ("ECG_QUALITY_CLEAN_DATA".to_string(), "false".to_string()),
        ("ECG_QUALITY_THRESHOLDS".to_string(), "0.4".to_string()),
        ("UNRELATED".to_string(), "ignored".to_string()),
    ];
    let loaded = SettingsLoader::with_path(file.path()).load_with_env(vars).unwrap();

    assert_eq!(loaded.settings.model, "cnn2s");
    assert_eq!(loaded.settings.return_mode, "binary_clean");
    assert!(!loaded.settings.clean_data);
    assert_eq!(loaded.settings.thresholds, Some(vec![0.4]));
    assert_eq!(loaded.settings.return_type, "intervals");
}

#[test]
fn test_custom_prefix() {
    let vars = vec![
        ("HOLTER_MODEL".to_string(), "lstm2s".to_string()),
        ("ECG_QUALITY_MODEL".to_string(), "cnn5s".to_string()),
    ];
    let loaded = SettingsLoader::new()
        .with_env_prefix("HOLTER_")
        .load_with_env(vars)
        .unwrap();
    assert_eq!(loaded.settings.model, "lstm2s");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        SettingsLoader::with_path(path).load_with_env(Vec::new()),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = settings_file("[checker\nmodel = ");
    assert!(matches!(
        SettingsLoader::with_path(file.path()).load_with_env(Vec::new()),
        Err(ConfigError::Parse(_))
    ));

    let file = settings_file("[thresholds]\n\"cnn9s.score\" = [0.1]\n");
    assert!(SettingsLoader::with_path(file.path()).load_with_env(Vec::new()).is_err());
}

#[test]
fn test_exported_settings_reload() {
    let settings = CheckerSettings::for_model(ModelKind::OsCnn2s)
        .with_mode(ReturnMode::BinaryQrs)
        .with_thresholds(vec![0.25])
        .with_cleaning(false);
    let file = settings_file(&settings.to_toml().unwrap());

    let loaded = SettingsLoader::with_path(file.path()).load_with_env(Vec::new()).unwrap();
    assert_eq!(loaded.settings, settings);
}

#[test]
#[serial]
fn test_process_environment_overrides() {
    std::env::set_var("ECG_QUALITY_WINDOW_MIN_RANGE", "0.25");
    std::env::set_var("ECG_QUALITY_CHECK_WINDOW_RANGE", "false");

    let result = SettingsLoader::new().load();

    std::env::remove_var("ECG_QUALITY_WINDOW_MIN_RANGE");
    std::env::remove_var("ECG_QUALITY_CHECK_WINDOW_RANGE");

    let loaded = result.unwrap();
    assert_eq!(loaded.settings.window_min_range, 0.25);
    assert!(!loaded.settings.check_window_range);
}

#[test]
#[serial]
fn test_process_environment_bad_threshold_list() {
    std::env::set_var("ECG_QUALITY_THRESHOLDS", "0.2,high");

    let result = SettingsLoader::new().load();

    std::env::remove_var("ECG_QUALITY_THRESHOLDS");

    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
