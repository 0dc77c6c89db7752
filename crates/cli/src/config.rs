//! Adapter configuration.
//!
//! Loaded from an optional TOML file, then overridden by `--server-url` /
//! `IIIF_IMAGE_SERVER_URL`. Validation runs once at load time; the adapter
//! never starts with an empty server URL or an unknown body encoding.
//!
//! ```toml
//! image_server_url = "https://iiif.example.org/iiif/3"
//! not_found_body = false
//! body_encoding = "UTF-8"
//! timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use iiif::{Charset, EncodingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Base URL of the IIIF image server (`imageServerUrl`).
    #[serde(alias = "imageServerUrl")]
    pub image_server_url: String,

    /// Synthesize a plain-text body for 404 responses.
    pub not_found_body: bool,

    /// Encoding of the synthesized 404 body.
    pub body_encoding: String,

    /// Transport request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            image_server_url: String::new(),
            not_found_body: false,
            body_encoding: Charset::Utf8.name().to_string(),
            timeout_secs: None,
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration")]
    Parse(#[from] toml::de::Error),

    #[error("No image server URL configured (set image_server_url, IIIF_IMAGE_SERVER_URL or --server-url)")]
    MissingServerUrl,

    #[error("Invalid body_encoding")]
    Encoding(#[from] EncodingError),
}

impl AdapterConfig {
    /// Parses a TOML document without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads the file at `path` (if any), applies `server_url` on top, and
    /// validates the result.
    pub fn load(path: Option<&Path>, server_url: Option<String>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        if let Some(url) = server_url {
            config.image_server_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the adapter relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_server_url.trim().is_empty() {
            return Err(ConfigError::MissingServerUrl);
        }
        self.charset()?;
        Ok(())
    }

    /// The configured body encoding.
    pub fn charset(&self) -> Result<Charset, EncodingError> {
        self.body_encoding.parse()
    }

    /// The configured request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_parses() {
        let config = AdapterConfig::from_toml_str(
            r#"
            image_server_url = "https://iiif.example.org"
            not_found_body = true
            body_encoding = "ISO-8859-1"
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.image_server_url, "https://iiif.example.org");
        assert!(config.not_found_body);
        assert_eq!(config.charset().unwrap(), Charset::Latin1);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_apply_to_missing_keys() {
        let config =
            AdapterConfig::from_toml_str(r#"image_server_url = "http://localhost:8182""#).unwrap();

        assert!(!config.not_found_body);
        assert_eq!(config.body_encoding, "UTF-8");
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn setting_name_alias_is_accepted() {
        let config =
            AdapterConfig::from_toml_str(r#"imageServerUrl = "http://localhost:8182""#).unwrap();

        assert_eq!(config.image_server_url, "http://localhost:8182");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AdapterConfig::from_toml_str(r#"image_server = "x""#).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn override_replaces_the_file_value() {
        let config = AdapterConfig::load(None, Some("http://override".to_string())).unwrap();

        assert_eq!(config.image_server_url, "http://override");
    }

    #[test]
    fn missing_server_url_is_rejected() {
        assert!(matches!(
            AdapterConfig::load(None, None),
            Err(ConfigError::MissingServerUrl)
        ));
        assert!(matches!(
            AdapterConfig::load(None, Some("  ".to_string())),
            Err(ConfigError::MissingServerUrl)
        ));
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let config = AdapterConfig {
            image_server_url: "http://localhost".to_string(),
            body_encoding: "EBCDIC".to_string(),
            ..AdapterConfig::default()
        };

        assert!(matches!(config.validate(), Err(ConfigError::Encoding(_))));
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let path = Path::new("/nonexistent/iiif-adapter.toml");

        let err = AdapterConfig::load(Some(path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("iiif-adapter.toml")));
    }
}
