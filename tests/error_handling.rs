// tests/error_handling.rs

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use epitrack::config::load_and_validate;
use epitrack::errors::EpitrackError;
use epitrack::types::StoreMode;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_is_loaded() {
    let file = config_file(
        r#"
[monitor]
poll_interval = "5m"

[pipeline]
program = "/opt/nextflow/bin/nextflow"
setup = ". /venv/bin/activate"
extra_path = ["/usr/local/bin"]

[defaults]
cover = 80

[store]
mode = "memory"

[workspace]
root = "/data/tasks"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.poll_interval(), Duration::from_secs(300));
    assert_eq!(cfg.pipeline.program, "/opt/nextflow/bin/nextflow");
    assert_eq!(cfg.pipeline.prefix_args, vec!["run", "/pipeline/main.nf"]);
    assert_eq!(cfg.pipeline.log_file, "pipeline.log");
    assert_eq!(cfg.defaults.cover, 80);
    assert_eq!(cfg.defaults.identity, 90);
    assert_eq!(cfg.store.mode, StoreMode::Memory);
    assert_eq!(cfg.workspace.root.to_str(), Some("/data/tasks"));
}

#[test]
fn test_inverted_length_defaults_return_config_error() {
    let file = config_file(
        r#"
[defaults]
min_length = 40
max_length = 30
"#,
    );

    match load_and_validate(file.path()) {
        Err(EpitrackError::ConfigError(msg)) => {
            assert!(msg.contains("min_length"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_bad_poll_interval_returns_config_error() {
    let file = config_file(
        r#"
[monitor]
poll_interval = "soon"
"#,
    );

    match load_and_validate(file.path()) {
        Err(EpitrackError::ConfigError(msg)) => {
            assert!(msg.contains("poll_interval"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_log_file_must_stay_in_task_dir() {
    let file = config_file(
        r#"
[pipeline]
log_file = "../escape.log"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(EpitrackError::ConfigError(msg)) if msg.contains("log_file")
    ));
}

#[test]
fn test_invalid_toml_returns_toml_error() {
    let file = config_file("[monitor\npoll_interval = 1");
    assert!(matches!(load_and_validate(file.path()), Err(EpitrackError::TomlError(_))));
}

#[test]
fn test_unknown_store_mode_returns_toml_error() {
    let file = config_file("[store]\nmode = \"postgres\"\n");
    assert!(matches!(load_and_validate(file.path()), Err(EpitrackError::TomlError(_))));
}

#[test]
fn test_missing_explicit_config_is_io_error() {
    let result = load_and_validate("/definitely/not/here/Epitrack.toml");
    assert!(matches!(result, Err(EpitrackError::IoError(_))));
}
