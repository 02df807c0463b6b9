mod common;

use std::time::Duration;

use campus_portal::config::{Config, ConfigError};

#[test]
fn full_file_is_loaded() {
    let (_dir, path) = common::temp_config(
        r#"
[api]
base_url = "https://college.test/api-root"
timeout_seconds = 20
connect_timeout_seconds = 3

[site]
department = "ece"
notice_kind = "exams"
notice_limit = 10
"#,
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.base_origin().unwrap().as_str(), "https://college.test/api-root/");
    assert_eq!(config.timeout(), Duration::from_secs(20));
    assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    assert_eq!(config.site.department, "ece");
    assert_eq!(config.site.notice_kind, "exams");
    assert_eq!(config.site.notice_limit, 10);
}

#[test]
fn empty_file_means_defaults() {
    let (_dir, path) = common::temp_config("");
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let (_dir, path) = common::temp_config("[api\nbase_url = ");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn wrong_type_is_a_parse_error() {
    let (_dir, path) = common::temp_config("[api]\ntimeout_seconds = \"soon\"\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn invalid_values_fail_validation_on_load() {
    let (_dir, path) = common::temp_config("[api]\nbase_url = \"file:///etc/passwd\"\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn default_path_is_under_the_app_directory() {
    assert!(Config::default_path().ends_with("campus-portal/config.toml"));
}
