use cyrus_docs::load_config::{
    default_base_dir, load_config, load_config_file, BASEDIR_ENV, CONFIG_ENV, PUBLISH_ENV,
};
use cyrus_docs_core::config::{Mode, SiteConfig, DEFAULT_DEV_SOURCE};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var(CONFIG_ENV);
    env::remove_var(BASEDIR_ENV);
    env::remove_var(PUBLISH_ENV);
}

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

/// Without any configuration the built-in Cyrus table and the home-based
/// build directory are used.
#[test]
#[serial]
fn defaults_to_builtin_table() {
    clear_env();

    let config = load_config(Mode::Full).expect("Config should load");

    assert_eq!(config.site, SiteConfig::builtin());
    assert_eq!(config.layout.base_dir(), default_base_dir().as_path());
    assert_eq!(config.publish_to, None);
}

#[test]
#[serial]
fn only_dev_collapses_builtin_table() {
    clear_env();

    let config = load_config(Mode::DevOnly).expect("Config should load");

    let sources: Vec<_> = config.site.sources().map(|s| s.name.clone()).collect();
    assert_eq!(sources, [DEFAULT_DEV_SOURCE]);
    let paths: Vec<_> = config.site.webpaths().map(|w| w.path.clone()).collect();
    assert_eq!(paths, ["/"]);
}

#[test]
#[serial]
fn yaml_file_replaces_table_and_env_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
base_dir: /srv/from-file
publish_to: files.example.org:/www
sources:
  A:
    repo: https://example.org/a.git
    branch: main
  B:
    repo: https://example.org/b.git
webpaths:
  /x: A
  /y: B
"#,
    );
    env::set_var(CONFIG_ENV, file.path());

    let config = load_config(Mode::Full).expect("Config should load");
    assert_eq!(config.layout.base_dir(), PathBuf::from("/srv/from-file").as_path());
    assert_eq!(config.publish_to.as_deref(), Some("files.example.org:/www"));

    let a = config.site.source("A").expect("source A");
    assert_eq!(a.branch(), "main");
    let b = config.site.source("B").expect("source B");
    assert_eq!(b.branch(), "B");
    // Neither source is cyrus-imapd-master, so the first by name is the dev source.
    assert_eq!(config.site.dev_source(), "A");

    env::set_var(BASEDIR_ENV, "/srv/from-env");
    env::set_var(PUBLISH_ENV, "env.example.org:/www");
    let config = load_config(Mode::Full).expect("Config should load");
    assert_eq!(config.layout.base_dir(), PathBuf::from("/srv/from-env").as_path());
    assert_eq!(config.publish_to.as_deref(), Some("env.example.org:/www"));

    clear_env();
}

#[test]
#[serial]
fn dangling_web_path_is_rejected_at_startup() {
    clear_env();
    let file = config_file(
        r#"
sources:
  A:
    repo: https://example.org/a.git
webpaths:
  /x: Missing
"#,
    );
    env::set_var(CONFIG_ENV, file.path());

    let err = load_config(Mode::Full).unwrap_err();
    let msg = format!("{err:#}");
    assert!(
        msg.contains("Invalid site configuration") && msg.contains("Missing"),
        "Validation error expected, got: {msg}"
    );

    clear_env();
}

#[test]
fn invalid_yaml_reports_parse_error() {
    let file = config_file("not-yaml: [:::");

    let err = load_config_file(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let file = config_file("sources: {}\nwebpath: {}\n");

    assert!(load_config_file(file.path()).is_err());
}

#[test]
#[serial]
fn source_name_outside_base_dir_is_rejected_at_startup() {
    clear_env();
    let file = config_file(
        r#"
sources:
  "..":
    repo: https://example.org/a.git
webpaths:
  /: ".."
"#,
    );
    env::set_var(CONFIG_ENV, file.path());

    let err = load_config(Mode::Full).unwrap_err();
    let msg = format!("{err:#}");
    assert!(
        msg.contains("invalid source name '..'"),
        "Source name error expected, got: {msg}"
    );

    clear_env();
}
