//! Integration tests for lectern-config

use lectern_config::*;
use std::io::Write;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = LecternConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("LECTERN_LOG_LEVEL", Some("debug")),
        ("LECTERN_LOG_FORMAT", Some("json")),
        ("LECTERN_PLUGINS_DUPLICATE_POLICY", Some("reject")),
        ("LECTERN_PLUGINS_INIT_LATE", Some("false")),
        ("LECTERN_PLUGINS_EVENT_CAPACITY", Some("64")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.plugins.duplicate_policy, DuplicatePolicy::Reject);
        assert!(!config.plugins.initialize_late_registrations);
        assert_eq!(config.plugins.event_capacity, 64);
    });
}

#[test]
fn test_invalid_env_value_is_reported() {
    with_vars(vec![("LECTERN_PLUGINS_INIT_LATE", Some("sometimes"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
    });

    with_vars(vec![("LECTERN_PLUGINS_EVENT_CAPACITY", Some("0"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::DomainError { .. }));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("READER_LOG_LEVEL", Some("trace"))], || {
        let config = ConfigLoader::with_prefix("READER").from_env().unwrap();
        assert_eq!(config.logging.level, LogLevel::Trace);
    });
}

#[test]
fn test_yaml_config_serialization() {
    let yaml = LecternConfig::generate_sample();
    let parsed: LecternConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, LecternConfig::default());
}

#[test]
fn test_load_from_file() {
    let yaml = r#"
logging:
  level: warn
  format: compact
  directives:
    - "plugin=debug"

plugins:
  duplicate_policy: reject
  initialize_late_registrations: false
  event_capacity: 4
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(Vec::<(&str, Option<&str>)>::new(), || {
        let config = ConfigLoader::new().load(Some(file.path())).unwrap();

        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.filter_directives(), "warn,plugin=debug");
        assert_eq!(config.plugins.duplicate_policy, DuplicatePolicy::Reject);
        assert!(!config.plugins.initialize_late_registrations);
        assert_eq!(config.plugins.event_capacity, 4);
    });
}

#[test]
fn test_missing_file() {
    let err = ConfigLoader::new()
        .from_file("/definitely/not/here/lectern.yaml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileReadError(_)));
}
