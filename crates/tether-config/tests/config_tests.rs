//! Configuration loading and precedence tests

use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tether_config::{ConfigError, ConfigLoader, ProjectConfig, CONFIG_FILE_NAME};
use tether_contracts::Markers;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join(CONFIG_FILE_NAME);
    fs::write(&config_path, content).unwrap();
    config_path
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
fn test_load_project_config_basic() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[bindings]
sources = ["native/add.h", "native/sub.h"]
output = "src/generated.rs"
struct_name = "Arithmetic"
"#,
    );

    let config = ConfigLoader::new()
        .ignore_env()
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(config.is_project());
    assert_eq!(
        config.sources(),
        vec![
            temp_dir.path().join("native/add.h"),
            temp_dir.path().join("native/sub.h"),
        ]
    );
    assert_eq!(config.output(), Some(temp_dir.path().join("src/generated.rs")));
    assert_eq!(config.project.struct_name(), Some("Arithmetic"));
    assert_eq!(config.project.markers(), Markers::default());
}

#[test]
fn test_load_from_deep_subdirectory() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[library]\nbase = \"build/libnative\"\n");

    let deep = temp_dir.path().join("sub1").join("sub2");
    fs::create_dir_all(&deep).unwrap();

    let config = ConfigLoader::new()
        .ignore_env()
        .load_from_directory(&deep)
        .unwrap();
    assert_eq!(
        config.library_base(),
        Some(temp_dir.path().join("build/libnative"))
    );
}

#[test]
fn test_nearest_config_wins() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[library]\nbase = \"outer\"\n");
    let inner = temp_dir.path().join("inner");
    fs::create_dir(&inner).unwrap();
    create_config_file(&inner, "[library]\nbase = \"inner\"\n");

    let config = ConfigLoader::new()
        .ignore_env()
        .load_from_directory(&inner)
        .unwrap();
    assert_eq!(config.project_root(), Some(inner.as_path()));
    assert_eq!(config.library_base(), Some(inner.join("inner")));
}

#[test]
fn test_load_from_specific_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    fs::write(&path, "[markers]\nbegin = \"@bind\"\nend = \"@endbind\"\n").unwrap();

    let config = ConfigLoader::new().ignore_env().load_from_file(&path).unwrap();
    assert_eq!(config.project.markers(), Markers::new("@bind", "@endbind"));
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::new().load_from_file(&temp_dir.path().join("nope.toml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

// ============================================================================
// Validation Tests
// ============================================================================

#[rstest]
#[case::unknown_table("[compiler]\noptimize = true\n")]
#[case::unknown_field("[bindings]\nsrc = [\"a.h\"]\n")]
#[case::wrong_type("[bindings]\nsources = \"a.h\"\n")]
#[case::missing_marker_end("[markers]\nbegin = \"[export]\"\n")]
fn test_malformed_config_rejected(#[case] content: &str) {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), content);

    let result = ConfigLoader::new()
        .ignore_env()
        .load_from_directory(temp_dir.path());
    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[rstest]
#[case::empty_source("[bindings]\nsources = [\"\"]\n", "bindings.sources")]
#[case::bad_runtime_path("[bindings]\nruntime_path = \"tether-runtime\"\n", "bindings.runtime_path")]
#[case::keyword_struct_name("[bindings]\nstruct_name = \"struct\"\n", "bindings.struct_name")]
#[case::same_markers("[markers]\nbegin = \"@\"\nend = \"@\"\n", "markers")]
#[case::empty_library("[library]\nbase = \"\"\n", "library.base")]
fn test_invalid_values_rejected(#[case] content: &str, #[case] expected_field: &str) {
    let result = ProjectConfig::parse(Path::new(CONFIG_FILE_NAME), content);
    match result {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected_field),
        other => panic!("expected invalid value for {}, got {:?}", expected_field, other),
    }
}

// ============================================================================
// Environment Override Tests
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_library_and_runtime_path() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        "[bindings]\nruntime_path = \"crate\"\n\n[library]\nbase = \"libfile\"\n",
    );

    env::set_var("TETHER_LIBRARY", "libenv");
    env::set_var("TETHER_RUNTIME_PATH", "::tether_runtime");
    let config = ConfigLoader::new().load_from_directory(temp_dir.path());
    env::remove_var("TETHER_LIBRARY");
    env::remove_var("TETHER_RUNTIME_PATH");

    let config = config.unwrap();
    assert_eq!(config.library_base(), Some(temp_dir.path().join("libenv")));
    assert_eq!(config.project.runtime_path(), Some("::tether_runtime"));
}

#[test]
#[serial]
fn test_env_override_without_config_file() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("TETHER_OUTPUT", "bindings.rs");
    let config = ConfigLoader::new().load_from_directory(temp_dir.path());
    env::remove_var("TETHER_OUTPUT");

    let config = config.unwrap();
    assert!(!config.is_project());
    assert_eq!(config.output(), Some(PathBuf::from("bindings.rs")));
}

#[test]
#[serial]
fn test_invalid_env_override_rejected() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("TETHER_RUNTIME_PATH", "not a path");
    let result = ConfigLoader::new().load_from_directory(temp_dir.path());
    env::remove_var("TETHER_RUNTIME_PATH");

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
