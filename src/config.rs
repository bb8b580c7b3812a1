//! Configuration types for docconv

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Artifact save configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Directory converted files are written to (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File collision handling
    #[serde(default)]
    pub file_collision: FileCollisionAction,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_collision: FileCollisionAction::default(),
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Skip the file, keep existing
    Skip,
}

/// Main configuration for the conversion client
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root URL of the conversion service (default: "http://127.0.0.1:8000/")
    ///
    /// API paths (`api/upload/`, `api/task/{id}/`, ...) are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay between a status response and the next status query (default: 1000 ms)
    #[serde(default = "default_poll_interval", with = "millis_serde")]
    pub poll_interval: Duration,

    /// Upper bound on total polling time per task (default: 600 s, None = poll forever)
    #[serde(default = "default_poll_timeout", with = "optional_duration_serde")]
    pub poll_timeout: Option<Duration>,

    /// Timeout applied to each individual HTTP request (default: 120 s)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Cookie holding the anti-forgery token (default: "csrftoken")
    #[serde(default = "default_csrf_cookie_name")]
    pub csrf_cookie_name: String,

    /// Largest file accepted for upload, in bytes (default: 50 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Where downloaded artifacts are written
    #[serde(default)]
    pub save: SaveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval: default_poll_interval(),
            poll_timeout: default_poll_timeout(),
            request_timeout: default_request_timeout(),
            csrf_cookie_name: default_csrf_cookie_name(),
            max_upload_bytes: default_max_upload_bytes(),
            user_agent: default_user_agent(),
            save: SaveConfig::default(),
        }
    }
}

impl Config {
    /// Parsed base URL, normalized to end with `/` so relative API paths append to it
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.base_url, e),
            key: Some("base_url".to_string()),
        })?;

        if url.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("base URL '{}' cannot hold API paths", self.base_url),
                key: Some("base_url".to_string()),
            });
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "poll interval must be greater than zero".to_string(),
                key: Some("poll_interval".to_string()),
            });
        }

        if self.poll_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config {
                message: "poll timeout must be greater than zero (omit it to disable)"
                    .to_string(),
                key: Some("poll_timeout".to_string()),
            });
        }

        if self.csrf_cookie_name.is_empty() {
            return Err(Error::Config {
                message: "CSRF cookie name must not be empty".to_string(),
                key: Some("csrf_cookie_name".to_string()),
            });
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_poll_timeout() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_csrf_cookie_name() -> String {
    "csrftoken".to_string()
}

fn default_max_upload_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_user_agent() -> String {
    format!("docconv/{}", env!("CARGO_PKG_VERSION"))
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper (seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.poll_timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.csrf_cookie_name, "csrftoken");
        assert_eq!(config.max_upload_bytes, 52_428_800);
        assert_eq!(config.save.file_collision, FileCollisionAction::Rename);
        config.validate().unwrap();
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8000/");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config: Config = serde_json::from_str(
            r#"{
                "base_url": "https://convert.example.com",
                "poll_interval": 250,
                "poll_timeout": null,
                "save": { "output_dir": "/tmp/pdfs", "file_collision": "overwrite" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.poll_timeout, None);
        assert_eq!(config.save.output_dir, PathBuf::from("/tmp/pdfs"));
        assert_eq!(config.save.file_collision, FileCollisionAction::Overwrite);
    }

    #[test]
    fn serialization_roundtrips_durations() {
        let config = Config {
            poll_interval: Duration::from_millis(1500),
            poll_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["poll_interval"], 1500);
        assert_eq!(json["poll_timeout"], 30);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = Config {
            base_url: "https://example.com/converter".to_string(),
            ..Default::default()
        };
        let url = config.base_url().unwrap();
        assert_eq!(url.as_str(), "https://example.com/converter/");
        assert_eq!(
            url.join("api/upload/").unwrap().as_str(),
            "https://example.com/converter/api/upload/"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = Config {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        match config.validate().unwrap_err() {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("base_url")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = Config {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_poll_timeout_is_rejected() {
        let config = Config {
            poll_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
