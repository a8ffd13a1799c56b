//! Integration tests for Settings layered loading.
//!
//! Precedence: defaults < global file < local `.goalcore.toml` < `GOALCORE_*` env.
//!
//! Every test passes an explicit (temporary) global path so the developer's
//! own `~/.config/goalcore/goalcore.toml` never leaks in.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use goalcore::application::ApplicationError;
use goalcore::config::{local_config_path, RetrySettings, Settings};

fn write_global(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("goalcore.toml");
    fs::write(&path, content).expect("write global config");
    path
}

#[test]
fn given_no_config_files_when_loading_then_uses_defaults() {
    // Arrange
    let global_dir = TempDir::new().unwrap();
    let local_dir = TempDir::new().unwrap();
    let missing_global = global_dir.path().join("absent.toml");

    // Act
    let settings = Settings::load_from(Some(missing_global.as_path()), Some(local_dir.path())).unwrap();

    // Assert
    assert_eq!(settings.base_url, "http://localhost:8000");
    assert_eq!(settings.retry, RetrySettings::default());
    assert_eq!(settings.batch_retry, RetrySettings::batch());
    assert_eq!(settings.categories_endpoint, "categories/all");
}

#[test]
fn given_global_and_local_config_when_loading_then_local_wins_per_key() {
    // Arrange
    let global_dir = TempDir::new().unwrap();
    let local_dir = TempDir::new().unwrap();
    let global = write_global(
        &global_dir,
        r#"
base_url = "https://global.example"
request_timeout_secs = 10

[retry]
max_retries = 5
base_delay_secs = 2.0
"#,
    );
    fs::write(
        local_config_path(local_dir.path()),
        r#"
base_url = "https://local.example"

[retry]
max_retries = 1
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_from(Some(global.as_path()), Some(local_dir.path())).unwrap();

    // Assert
    assert_eq!(settings.base_url, "https://local.example");
    assert_eq!(settings.request_timeout_secs, 10);
    assert_eq!(settings.retry.max_retries, 1);
    assert_eq!(settings.retry.base_delay_secs, 2.0);
    assert!(settings.retry.exponential_backoff);
}

#[test]
fn given_slow_upstream_list_in_file_when_loading_then_policy_matches_case_insensitively() {
    let global_dir = TempDir::new().unwrap();
    let global = write_global(
        &global_dir,
        r#"
[batch_retry]
slow_upstreams = ["IGDB", "RAWG"]
slow_upstream_floor_secs = 0.75
"#,
    );

    let settings = Settings::load_from(Some(global.as_path()), None).unwrap();
    let policy = settings.batch_retry.to_policy().unwrap();

    assert!(policy.is_slow_upstream("rawg.io"));
    assert_eq!(policy.slow_upstream_floor.as_millis(), 750);
    assert_eq!(policy.max_retries, 2);
}

#[test]
fn given_negative_base_delay_when_loading_then_config_is_rejected() {
    let global_dir = TempDir::new().unwrap();
    let global = write_global(
        &global_dir,
        r#"
[retry]
base_delay_secs = -1.0
"#,
    );

    let result = Settings::load_from(Some(global.as_path()), None);

    assert!(matches!(result, Err(ApplicationError::Domain(_))), "{result:?}");
}

#[test]
fn given_malformed_toml_when_loading_then_config_error() {
    let local_dir = TempDir::new().unwrap();
    fs::write(local_config_path(local_dir.path()), "base_url = [unclosed").unwrap();

    let result = Settings::load_from(None, Some(local_dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })), "{result:?}");
}

#[test]
fn given_env_token_when_loading_then_env_overrides_files() {
    // Arrange
    let local_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(local_dir.path()),
        "api_token = \"from-file\"\n",
    )
    .unwrap();
    std::env::set_var("GOALCORE_API_TOKEN", "from-env");

    // Act
    let settings = Settings::load_from(None, Some(local_dir.path()));
    std::env::remove_var("GOALCORE_API_TOKEN");

    // Assert
    assert_eq!(settings.unwrap().api_token.as_deref(), Some("from-env"));
}
