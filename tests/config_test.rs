use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

use github_tag_release::config::{load_config, Config};
use github_tag_release::retry::RetryPolicy;
use serial_test::serial;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
tag_pattern = "release-{version}"
remote = "upstream"

[release]
name = "Version {version}"
draft = true

[retry]
max_attempts = 6
initial_delay_ms = 100
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path().to_str().unwrap()), Path::new(".")).unwrap();
    assert_eq!(config.tag_pattern, "release-{version}");
    assert_eq!(config.remote, "upstream");
    assert_eq!(config.release.name, "Version {version}");
    assert!(config.release.draft);
    assert_eq!(config.tag_message, "Release {tag}");

    let policy = RetryPolicy::from(&config.retry);
    assert_eq!(policy.max_attempts, 6);
    assert_eq!(policy.initial_delay.as_millis(), 100);
    assert_eq!(policy.max_delay.as_millis(), 8000);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = load_config(Some(missing.to_str().unwrap()), dir.path()).unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"tag_pattern = [").unwrap();
    temp_file.flush().unwrap();

    let err = load_config(Some(temp_file.path().to_str().unwrap()), Path::new(".")).unwrap_err();
    assert!(err.to_string().contains("cannot parse"));
}

#[test]
fn test_invalid_pattern_is_rejected_on_load() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"tag_pattern = \"{version}-{version}\"")
        .unwrap();
    temp_file.flush().unwrap();

    assert!(load_config(Some(temp_file.path().to_str().unwrap()), Path::new(".")).is_err());
}

#[test]
#[serial]
fn test_discovers_file_in_project_directory() {
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join(".github-tag-release.toml"),
        "remote = \"mirror\"\n",
    )
    .unwrap();
    let elsewhere = TempDir::new().unwrap();
    fs::write(
        elsewhere.path().join(".github-tag-release.toml"),
        "remote = \"wrong\"\n",
    )
    .unwrap();

    let previous = env::current_dir().unwrap();
    env::set_current_dir(elsewhere.path()).unwrap();
    let loaded = load_config(None, project.path());
    env::set_current_dir(previous).unwrap();

    assert_eq!(loaded.unwrap().remote, "mirror");
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_defaults_without_any_file() {
    let dir = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    let previous_xdg = env::var_os("XDG_CONFIG_HOME");

    env::set_var("XDG_CONFIG_HOME", xdg.path());
    let loaded = load_config(None, dir.path());
    match previous_xdg {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(loaded.unwrap(), Config::default());
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_discovers_user_config_file() {
    let dir = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    fs::write(
        xdg.path().join("github-tag-release.toml"),
        "[network]\ntimeout_secs = 5\n",
    )
    .unwrap();
    let previous_xdg = env::var_os("XDG_CONFIG_HOME");

    env::set_var("XDG_CONFIG_HOME", xdg.path());
    let loaded = load_config(None, dir.path());
    match previous_xdg {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(loaded.unwrap().network.timeout_secs, 5);
}
