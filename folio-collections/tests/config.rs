use folio_collections::{ConfigError, ListConfig};
use serial_test::serial;
use std::io::Write;

const PAGE_SIZE: &str = "FOLIO_LAZY_LIST_PAGE_SIZE";
const MAX_PAGES: &str = "FOLIO_LAZY_LIST_MAX_PAGES";

fn clear_env() {
    std::env::remove_var(PAGE_SIZE);
    std::env::remove_var(MAX_PAGES);
}

#[test]
fn test_defaults() {
    let config = ListConfig::default();
    assert_eq!((config.page_size, config.max_pages), (50, 10));
}

#[test]
fn test_yaml_section() {
    let yaml = r#"
folio:
  lazy-list:
    page-size: 25
    max-pages: 4
"#;
    assert_eq!(ListConfig::from_yaml_str(yaml).unwrap(), ListConfig::new(25, 4));
}

#[test]
fn test_missing_fields_take_defaults() {
    let yaml = "folio:\n  lazy-list:\n    max-pages: 3\n";
    assert_eq!(ListConfig::from_yaml_str(yaml).unwrap(), ListConfig::new(50, 3));
    let other = "app:\n  name: demo\n";
    assert_eq!(ListConfig::from_yaml_str(other).unwrap(), ListConfig::default());
}

#[test]
fn test_zero_is_rejected() {
    let yaml = "folio:\n  lazy-list:\n    page-size: 0\n";
    match ListConfig::from_yaml_str(yaml) {
        Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "folio.lazy-list.page-size"),
        other => panic!("expected invalid page size, got {other:?}"),
    }
    assert!(ListConfig::new(5, 0).validate().is_err());
}

#[test]
fn test_malformed_yaml() {
    let result = ListConfig::from_yaml_str("folio: [unclosed");
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial]
fn test_load_from_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "folio:\n  lazy-list:\n    page-size: 8").unwrap();
    let config = ListConfig::load(file.path()).unwrap();
    assert_eq!(config, ListConfig::new(8, 10));
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = ListConfig::load(dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config, ListConfig::default());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "folio:\n  lazy-list:\n    page-size: 8\n    max-pages: 2").unwrap();
    std::env::set_var(PAGE_SIZE, "16");
    let config = ListConfig::load(file.path());
    clear_env();
    assert_eq!(config.unwrap(), ListConfig::new(16, 2));
}

#[test]
#[serial]
fn test_env_must_be_numeric() {
    clear_env();
    std::env::set_var(MAX_PAGES, "many");
    let mut config = ListConfig::default();
    let result = config.apply_env_overrides();
    clear_env();
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}
