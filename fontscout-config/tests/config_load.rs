use fontscout_config::FontscoutConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn loads_full_file() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
server:
  bind: "0.0.0.0:9000"
http:
  user_agent: "fontscout-test/1.0"
  page_timeout_secs: 10
  stylesheet_timeout_secs: 20
  verify_tls: true
  max_redirects: 3
store:
  database_url: "sqlite://${HOME}/fonts.db"
"#;
    let p = write_yaml(&tmp, "fontscout.yaml", file_yaml);

    temp_env::with_var("HOME", Some("/home/scout"), || {
        let config = FontscoutConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.http.user_agent.as_deref(), Some("fontscout-test/1.0"));
        assert_eq!(config.http.page_timeout_secs, 10);
        assert_eq!(config.http.stylesheet_timeout_secs, 20);
        assert!(config.http.verify_tls);
        assert_eq!(config.http.max_redirects, 3);
        assert_eq!(config.store.database_url, "sqlite:///home/scout/fonts.db");
    });
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    let config = FontscoutConfigLoader::new()
        .with_file("does-not-exist.yaml")
        .load()
        .expect("defaults");

    assert_eq!(config.server.bind, "127.0.0.1:8080");
    assert!(config.http.user_agent.is_none());
    assert_eq!(config.http.page_timeout_secs, 30);
    assert_eq!(config.http.stylesheet_timeout_secs, 60);
    assert!(!config.http.verify_tls);
    assert_eq!(config.http.max_redirects, 5);
}

#[test]
#[serial]
fn inline_yaml_overrides_defaults() {
    let config = FontscoutConfigLoader::new()
        .with_yaml_str("http:\n  verify_tls: true\n")
        .load()
        .expect("inline yaml");

    assert!(config.http.verify_tls);
    // Untouched sections keep their defaults.
    assert_eq!(config.store.database_url, "sqlite://fontscout.db?mode=rwc");
}
