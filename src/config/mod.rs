//! Run configuration: typed defaults plus explicit layered overrides.
//!
//! Layers are applied lowest to highest:
//! built-in defaults, environment, JSON config file, CLI flags.
//! Each layer is a [`ConfigLayer`] whose present keys replace the value below
//! it. Only the `endpoints`, `headers` and `output` groups merge key by key;
//! every other key is replaced whole.

mod credentials;
mod error;

pub use credentials::{
    CredentialPrompt, Credentials, PASSWORD_ENV, TerminalPrompt, USERNAME_ENV,
    resolve_credentials,
};
pub use error::{ConfigError, CredentialError};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// File name probed in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default number of consecutive empty/failed IDs before a sweep stops.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Default batch width for detail-page sweeps.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 5;

const MAX_CONCURRENT_REQUESTS_LIMIT: usize = 100;

/// Site endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Detail page base; requests append `?videoid=N`.
    pub video_base_url: String,
    /// Dataset page base; requests append `?dataset=N`.
    pub dataset_base_url: String,
    /// Login form URL. Its origin is where the session cookie is expected.
    pub login_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            video_base_url: "https://www.cdvl.org/members-section/view-file/".to_string(),
            dataset_base_url: "https://www.cdvl.org/members-section/search".to_string(),
            login_url: "https://www.cdvl.org/login".to_string(),
        }
    }
}

/// Output log file names, relative to the crawl output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFiles {
    pub videos_file: String,
    pub datasets_file: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            videos_file: "videos.jsonl".to_string(),
            datasets_file: "datasets.jsonl".to_string(),
        }
    }
}

/// Fully merged configuration for one run.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub endpoints: Endpoints,
    pub headers: BTreeMap<String, String>,
    pub output: OutputFiles,
    pub start_video_id: u64,
    pub start_dataset_id: u64,
    pub max_concurrent_requests: usize,
    pub max_consecutive_failures: u32,
    /// Pause between sweep batches, in seconds.
    pub request_delay: f64,
    pub max_video_id: Option<u64>,
    pub max_dataset_id: Option<u64>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let headers = [
            (
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            ),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            endpoints: Endpoints::default(),
            headers,
            output: OutputFiles::default(),
            start_video_id: 1,
            start_dataset_id: 1,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            request_delay: 0.1,
            max_video_id: None,
            max_dataset_id: None,
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoints", &self.endpoints)
            .field("headers", &self.headers)
            .field("output", &self.output)
            .field("start_video_id", &self.start_video_id)
            .field("start_dataset_id", &self.start_dataset_id)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("max_consecutive_failures", &self.max_consecutive_failures)
            .field("request_delay", &self.request_delay)
            .field("max_video_id", &self.max_video_id)
            .field("max_dataset_id", &self.max_dataset_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Applies `layer` on top of `self`; keys present in the layer win.
    #[must_use]
    pub fn merge(mut self, layer: ConfigLayer) -> Self {
        if let Some(endpoints) = layer.endpoints {
            if let Some(v) = endpoints.video_base_url {
                self.endpoints.video_base_url = v;
            }
            if let Some(v) = endpoints.dataset_base_url {
                self.endpoints.dataset_base_url = v;
            }
            if let Some(v) = endpoints.login_url {
                self.endpoints.login_url = v;
            }
        }
        if let Some(headers) = layer.headers {
            self.headers.extend(headers);
        }
        if let Some(output) = layer.output {
            if let Some(v) = output.videos_file {
                self.output.videos_file = v;
            }
            if let Some(v) = output.datasets_file {
                self.output.datasets_file = v;
            }
        }

        replace(&mut self.start_video_id, layer.start_video_id);
        replace(&mut self.start_dataset_id, layer.start_dataset_id);
        replace(&mut self.max_concurrent_requests, layer.max_concurrent_requests);
        replace(&mut self.max_consecutive_failures, layer.max_consecutive_failures);
        replace(&mut self.request_delay, layer.request_delay);
        if layer.max_video_id.is_some() {
            self.max_video_id = layer.max_video_id;
        }
        if layer.max_dataset_id.is_some() {
            self.max_dataset_id = layer.max_dataset_id;
        }
        if layer.username.is_some() {
            self.username = layer.username;
        }
        if layer.password.is_some() {
            self.password = layer.password;
        }
        self
    }

    /// Checks merged values against their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CONCURRENT_REQUESTS_LIMIT).contains(&self.max_concurrent_requests) {
            return Err(ConfigError::invalid(
                "max_concurrent_requests",
                format!(
                    "expected 1..={MAX_CONCURRENT_REQUESTS_LIMIT}, got {}",
                    self.max_concurrent_requests
                ),
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::invalid(
                "max_consecutive_failures",
                "must be at least 1",
            ));
        }
        if !self.request_delay.is_finite() || self.request_delay < 0.0 {
            return Err(ConfigError::invalid(
                "request_delay",
                format!("expected a non-negative number of seconds, got {}", self.request_delay),
            ));
        }
        for (key, url) in [
            ("endpoints.video_base_url", &self.endpoints.video_base_url),
            ("endpoints.dataset_base_url", &self.endpoints.dataset_base_url),
            ("endpoints.login_url", &self.endpoints.login_url),
        ] {
            if url::Url::parse(url).is_err() {
                return Err(ConfigError::invalid(key, format!("not a valid URL: {url}")));
            }
        }
        Ok(())
    }

    /// Inter-batch pause as a [`Duration`].
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay).unwrap_or_default()
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Partial endpoint overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EndpointsLayer {
    pub video_base_url: Option<String>,
    pub dataset_base_url: Option<String>,
    pub login_url: Option<String>,
}

/// Partial output-file overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputLayer {
    pub videos_file: Option<String>,
    pub datasets_file: Option<String>,
}

/// One override layer. Absent keys leave the lower layer untouched.
///
/// This is also the shape of the JSON config file; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigLayer {
    pub endpoints: Option<EndpointsLayer>,
    pub headers: Option<BTreeMap<String, String>>,
    pub output: Option<OutputLayer>,
    pub start_video_id: Option<u64>,
    pub start_dataset_id: Option<u64>,
    pub max_concurrent_requests: Option<usize>,
    pub max_consecutive_failures: Option<u32>,
    pub request_delay: Option<f64>,
    pub max_video_id: Option<u64>,
    pub max_dataset_id: Option<u64>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ConfigLayer {
    /// Reads a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`], [`ConfigError::Read`] or
    /// [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let layer = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(layer)
    }

    /// Builds the environment layer through `lookup` (normally `std::env::var`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a numeric variable does not parse.
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoints = EndpointsLayer {
            video_base_url: lookup("CDVL_VIDEO_BASE_URL"),
            dataset_base_url: lookup("CDVL_DATASET_BASE_URL"),
            login_url: lookup("CDVL_LOGIN_URL"),
        };
        let endpoints = (endpoints != EndpointsLayer::default()).then_some(endpoints);

        Ok(Self {
            endpoints,
            max_concurrent_requests: parse_env(&lookup, "CDVL_MAX_CONCURRENT_REQUESTS")?,
            max_consecutive_failures: parse_env(&lookup, "CDVL_MAX_CONSECUTIVE_FAILURES")?,
            request_delay: parse_env(&lookup, "CDVL_REQUEST_DELAY")?,
            ..Self::default()
        })
    }
}

fn parse_env<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

/// Reads a non-empty process environment variable.
#[must_use]
pub fn env_var_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Picks the config file: the explicit path, else `config.json` in `cwd` if present.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        debug!(path = %candidate.display(), "Found config.json in working directory");
        Some(candidate)
    } else {
        None
    }
}

/// Builds the run configuration from every layer and validates it.
///
/// # Errors
///
/// Returns [`ConfigError`] if the environment, file, or merged values are invalid.
pub fn load_config(path: Option<&Path>, overrides: ConfigLayer) -> Result<Config, ConfigError> {
    let mut config = Config::default().merge(ConfigLayer::from_env(env_var_non_empty)?);
    if let Some(path) = path {
        config = config.merge(ConfigLayer::from_file(path)?);
    }
    let config = config.merge(overrides);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.max_concurrent_requests, 5);
        assert_eq!(config.max_consecutive_failures, 10);
        assert!(config.endpoints.video_base_url.contains("view-file"));
        assert!(config.headers.contains_key("User-Agent"));
        config.validate().unwrap();
    }

    #[test]
    fn test_file_headers_merge_with_defaults() {
        let layer: ConfigLayer = serde_json::from_str(r#"{"headers": {"X-Custom": "value"}}"#).unwrap();
        let config = Config::default().merge(layer);
        assert_eq!(config.headers["X-Custom"], "value");
        assert!(config.headers.contains_key("User-Agent"));
    }

    #[test]
    fn test_nested_endpoint_override_keeps_siblings() {
        let layer: ConfigLayer =
            serde_json::from_str(r#"{"endpoints": {"video_base_url": "http://localhost/v/"}}"#)
                .unwrap();
        let config = Config::default().merge(layer);
        assert_eq!(config.endpoints.video_base_url, "http://localhost/v/");
        assert_eq!(
            config.endpoints.dataset_base_url,
            Endpoints::default().dataset_base_url
        );
    }

    #[test]
    fn test_scalar_override_and_unknown_keys_ignored() {
        let layer: ConfigLayer = serde_json::from_str(
            r#"{"max_consecutive_failures": 1000, "max_video_id": 50, "something_else": true}"#,
        )
        .unwrap();
        let config = Config::default().merge(layer);
        assert_eq!(config.max_consecutive_failures, 1000);
        assert_eq!(config.max_video_id, Some(50));
    }

    #[test]
    fn test_later_layer_wins() {
        let env = ConfigLayer::from_env(lookup_from(&[("CDVL_MAX_CONCURRENT_REQUESTS", "8")])).unwrap();
        let file = ConfigLayer {
            max_concurrent_requests: Some(3),
            ..ConfigLayer::default()
        };
        let config = Config::default().merge(env).merge(file);
        assert_eq!(config.max_concurrent_requests, 3);
    }

    #[test]
    fn test_env_layer_parses_values() {
        let layer = ConfigLayer::from_env(lookup_from(&[
            ("CDVL_VIDEO_BASE_URL", "http://example.test/v/"),
            ("CDVL_REQUEST_DELAY", "0.5"),
        ]))
        .unwrap();
        let config = Config::default().merge(layer);
        assert_eq!(config.endpoints.video_base_url, "http://example.test/v/");
        assert_eq!(config.request_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_env_layer_rejects_garbage() {
        let result = ConfigLayer::from_env(lookup_from(&[("CDVL_MAX_CONSECUTIVE_FAILURES", "many")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv {
                name: "CDVL_MAX_CONSECUTIVE_FAILURES",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_env_produces_empty_layer() {
        let layer = ConfigLayer::from_env(|_| None).unwrap();
        assert_eq!(layer, ConfigLayer::default());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            max_concurrent_requests: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "max_concurrent_requests",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_delay() {
        let config = Config {
            request_delay: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_reports_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ invalid }").unwrap();
        assert!(matches!(
            ConfigLayer::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(
            ConfigLayer::from_file(&path),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_config_path_prefers_explicit_then_cwd() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_config_path(None, dir.path()), None);

        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        assert_eq!(
            resolve_config_path(None, dir.path()),
            Some(dir.path().join("config.json"))
        );

        let explicit = dir.path().join("other.json");
        assert_eq!(
            resolve_config_path(Some(&explicit), dir.path()),
            Some(explicit)
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config {
            password: Some("hunter2".to_string()),
            ..Config::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
