//! Loader for fedinbox configuration with YAML + environment overlays.
//!
//! Sources are merged in order: an optional `fedinbox.yaml` (or any format
//! the `config` crate infers from the suffix), then `FEDINBOX__`-prefixed
//! environment variables using `__` as the nesting separator, e.g.
//! `FEDINBOX__GATEWAY__PORT=8080`. After merging, `${VAR}` placeholders in
//! string values are expanded from the process environment.
//!
//! Every section has defaults, so an empty configuration is valid for the
//! client. The gateway additionally needs `gateway.access_token`.
use config::{Config, ConfigError, Environment, File};
use fedinbox_common::observability::LogFormat;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "FEDINBOX";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FedinboxConfig {
    pub gateway: GatewaySettings,
    pub client: ClientSettings,
    pub logging: LoggingSettings,
}

/// A configuration value that must never show up in logs or debug output.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Settings for the proxy in front of the Mastodon instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Base URL of the upstream instance.
    pub instance_url: String,
    /// Bearer token used for write calls and the favourites list.
    pub access_token: Option<Secret>,
    pub bind: String,
    #[serde(deserialize_with = "lenient")]
    pub port: u16,
    /// Page size requested from the public timeline.
    #[serde(deserialize_with = "lenient")]
    pub timeline_limit: u32,
    /// Directory served for unmatched GET paths.
    pub static_dir: Option<PathBuf>,
    #[serde(deserialize_with = "lenient_opt")]
    pub request_timeout_secs: Option<u64>,
    pub operator: Option<OperatorCredentials>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            instance_url: "https://bzh.social".into(),
            access_token: None,
            bind: "0.0.0.0".into(),
            port: 3000,
            timeline_limit: 20,
            static_dir: None,
            request_timeout_secs: None,
            operator: None,
        }
    }
}

impl GatewaySettings {
    /// Basic-auth pair operators must present, when both halves are set.
    ///
    /// ```
    /// use fedinbox_config::{GatewaySettings, OperatorCredentials, Secret};
    ///
    /// let mut settings = GatewaySettings::default();
    /// assert!(settings.operator_credentials().is_none());
    ///
    /// settings.operator = Some(OperatorCredentials {
    ///     username: Some("ops".into()),
    ///     password: Some(Secret::new("hunter2")),
    /// });
    /// assert_eq!(settings.operator_credentials(), Some(("ops", "hunter2")));
    /// ```
    pub fn operator_credentials(&self) -> Option<(&str, &str)> {
        let op = self.operator.as_ref()?;
        let user = op.username.as_deref().filter(|u| !u.trim().is_empty())?;
        let pass = op.password.as_ref().filter(|p| !p.is_blank())?;
        Some((user, pass.expose()))
    }

    /// The service credential, rejecting a missing or blank value.
    pub fn require_access_token(&self) -> Result<&Secret, ConfigError> {
        self.access_token
            .as_ref()
            .filter(|t| !t.is_blank())
            .ok_or_else(|| ConfigError::Message("gateway.access_token is not set".into()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatorCredentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
}

/// Settings for the terminal inbox.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub gateway_url: String,
    /// Where archived/favorited ids are kept. Defaults to the data dir.
    pub store_path: Option<PathBuf>,
    /// Basic-auth credentials for an operator-protected gateway.
    pub username: Option<String>,
    pub password: Option<Secret>,
    #[serde(deserialize_with = "lenient_opt")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:3000".into(),
            store_path: None,
            username: None,
            password: None,
            request_timeout_secs: None,
        }
    }
}

impl ClientSettings {
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        let user = self.username.as_deref().filter(|u| !u.trim().is_empty())?;
        let pass = self.password.as_ref()?;
        Some((user, pass.expose()))
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| fedinbox_common::observability::data_dir("fedinbox").join("store.json"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".into(),
            dir: None,
        }
    }
}

// Environment overrides always arrive as strings, so numeric fields accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr<T> {
    Num(T),
    Str(String),
}

fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    match NumOrStr::<T>::deserialize(d)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn lenient_opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    match Option::<NumOrStr<T>>::deserialize(d)? {
        None => Ok(None),
        Some(NumOrStr::Num(n)) => Ok(Some(n)),
        Some(NumOrStr::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(NumOrStr::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
    }
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

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FedinboxConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FedinboxConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FedinboxConfigLoader {
    /// Start from defaults with `FEDINBOX__` env overrides.
    ///
    /// ```
    /// use fedinbox_config::FedinboxConfigLoader;
    ///
    /// let config = FedinboxConfigLoader::new()
    ///     .with_yaml_str("gateway:\n  port: 8080")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.gateway.port, 8080);
    /// assert_eq!(config.gateway.timeline_limit, 20);
    /// assert_eq!(config.client.gateway_url, "http://localhost:3000");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but tolerates a missing file, so
    /// deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Environment variables are layered last so they win over files, then
    /// `${VAR}` placeholders are expanded.
    ///
    /// ```
    /// use fedinbox_config::FedinboxConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_MASTODON_TOKEN", "injected-from-env"); }
    ///
    /// let config = FedinboxConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// gateway:
    ///   instance_url: "https://mastodon.example"
    ///   access_token: "${DOC_MASTODON_TOKEN}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// let token = config.gateway.require_access_token().unwrap();
    /// assert_eq!(token.expose(), "injected-from-env");
    /// assert_eq!(config.gateway.instance_url, "https://mastodon.example");
    ///
    /// unsafe { std::env::remove_var("DOC_MASTODON_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<FedinboxConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
