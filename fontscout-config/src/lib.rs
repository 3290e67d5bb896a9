//! Loader for Fontscout configuration with YAML + environment overlays.
//!
//! Precedence: `FONTSCOUT_`-prefixed environment variables win over the YAML
//! file; `${VAR}` placeholders inside string values are expanded after the
//! sources are merged. Every field has a default, so running without a
//! `fontscout.yaml` at all is fine.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct FontscoutConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the `serve` subcommand binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    /// Overrides the built-in browser-like user-agent when set.
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    #[serde(default = "default_stylesheet_timeout")]
    pub stylesheet_timeout_secs: u64,
    /// TLS certificate verification for target sites. Off by default: the
    /// sites this tool is pointed at frequently carry broken certificates,
    /// and the legacy behaviour was to fetch them anyway. Turn on to reject
    /// misconfigured hosts.
    #[serde(default)]
    pub verify_tls: bool,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            page_timeout_secs: default_page_timeout(),
            stylesheet_timeout_secs: default_stylesheet_timeout(),
            verify_tls: false,
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".into()
}
fn default_page_timeout() -> u64 {
    30
}
fn default_stylesheet_timeout() -> u64 {
    60
}
fn default_max_redirects() -> usize {
    5
}
fn default_database_url() -> String {
    "sqlite://fontscout.db?mode=rwc".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct FontscoutConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FontscoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FontscoutConfigLoader {
    /// Start with the defaults: `FONTSCOUT__`-separated env overrides only.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("FONTSCOUT").separator("__"));
        Self { builder }
    }

    /// Attach a config file; the `config` crate infers format by suffix.
    /// The file may be absent, in which case defaults and env apply.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources, expanding
    /// `${VAR}` placeholders on the way.
    pub fn load(self) -> Result<FontscoutConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FontscoutConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
