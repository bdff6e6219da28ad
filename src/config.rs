use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Capabilities, ImagesError, RegisterImageRequest};

const DEFAULT_MAX_DELTA_SECS: i64 = 60;

/// Connection settings for an images endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ImagesClientConfig {
    pub base_url: String,
    pub tenant_id: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub extra_headers: Option<HashMap<String, String>>,
    #[serde(default, rename = "request_timeout_secs", with = "opt_secs")]
    pub request_timeout: Option<Duration>,
}

impl ImagesClientConfig {
    pub fn new(base_url: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_id: tenant_id.into(),
            auth_token: None,
            extra_headers: None,
            request_timeout: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Everything a suite run needs to know about the endpoint under test.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SmokeConfig {
    pub client: ImagesClientConfig,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default = "default_test_file")]
    pub test_file: PathBuf,
    #[serde(default)]
    pub import_from: String,
    #[serde(default = "default_import_from_format")]
    pub import_from_format: String,
    #[serde(default = "default_max_delta")]
    pub max_created_at_delta: i64,
    #[serde(default = "default_max_delta")]
    pub max_updated_at_delta: i64,
    #[serde(default = "default_container_format")]
    pub container_format: String,
    #[serde(default = "default_disk_format")]
    pub disk_format: String,
}

impl SmokeConfig {
    pub fn new(client: ImagesClientConfig) -> Self {
        Self {
            client,
            capabilities: Capabilities::default(),
            test_file: default_test_file(),
            import_from: String::new(),
            import_from_format: default_import_from_format(),
            max_created_at_delta: DEFAULT_MAX_DELTA_SECS,
            max_updated_at_delta: DEFAULT_MAX_DELTA_SECS,
            container_format: default_container_format(),
            disk_format: default_disk_format(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ImagesError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            ImagesError::Config(format!("invalid config file {}: {e}", path.display()))
        })
    }

    pub fn from_env() -> Result<Self, ImagesError> {
        let base_url = env::var("IMAGES_ENDPOINT")
            .map_err(|_| ImagesError::Config("IMAGES_ENDPOINT must be set".into()))?;
        let tenant_id = env::var("IMAGES_TENANT_ID")
            .map_err(|_| ImagesError::Config("IMAGES_TENANT_ID must be set".into()))?;

        let client = ImagesClientConfig {
            base_url,
            tenant_id,
            auth_token: env::var("IMAGES_AUTH_TOKEN").ok(),
            extra_headers: None,
            request_timeout: env_parse::<u64>("IMAGES_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs),
        };

        Ok(Self {
            client,
            capabilities: Capabilities {
                allow_post_images: env_flag("IMAGES_ALLOW_POST_IMAGES")?,
                allow_put_image_file: env_flag("IMAGES_ALLOW_PUT_IMAGE_FILE")?,
                allow_get_image_file: env_flag("IMAGES_ALLOW_GET_IMAGE_FILE")?,
            },
            test_file: env::var("IMAGES_TEST_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_test_file()),
            import_from: env::var("IMAGES_IMPORT_FROM").unwrap_or_default(),
            import_from_format: env::var("IMAGES_IMPORT_FROM_FORMAT")
                .unwrap_or_else(|_| default_import_from_format()),
            max_created_at_delta: env_parse("IMAGES_MAX_CREATED_AT_DELTA")?
                .unwrap_or(DEFAULT_MAX_DELTA_SECS),
            max_updated_at_delta: env_parse("IMAGES_MAX_UPDATED_AT_DELTA")?
                .unwrap_or(DEFAULT_MAX_DELTA_SECS),
            container_format: env::var("IMAGES_CONTAINER_FORMAT")
                .unwrap_or_else(|_| default_container_format()),
            disk_format: env::var("IMAGES_DISK_FORMAT")
                .unwrap_or_else(|_| default_disk_format()),
        })
    }

    /// Registration body used by the behaviors when no explicit one is given.
    pub fn default_image_request(&self, name: impl Into<String>) -> RegisterImageRequest {
        RegisterImageRequest {
            name: Some(name.into()),
            container_format: Some(self.container_format.clone()),
            disk_format: Some(self.disk_format.clone()),
            ..Default::default()
        }
    }
}

fn env_flag(key: &str) -> Result<bool, ImagesError> {
    match env::var(key) {
        Err(_) => Ok(true),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ImagesError::Config(format!(
                "{key} must be a boolean, got `{other}`"
            ))),
        },
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ImagesError> {
    match env::var(key) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ImagesError::Config(format!("invalid {key} value `{raw}`"))),
    }
}

fn default_test_file() -> PathBuf {
    PathBuf::from("test_file.txt")
}

fn default_import_from_format() -> String {
    "qcow2".into()
}

fn default_container_format() -> String {
    "bare".into()
}

fn default_disk_format() -> String {
    "raw".into()
}

fn default_max_delta() -> i64 {
    DEFAULT_MAX_DELTA_SECS
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_fills_defaults() {
        let raw = r#"{
            "client": {
                "base_url": "http://localhost:9292",
                "tenant_id": "tenant-a",
                "request_timeout_secs": 5
            },
            "capabilities": { "allow_put_image_file": false },
            "import_from": "swift://bucket/image.qcow2"
        }"#;
        let cfg: SmokeConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.client.request_timeout, Some(Duration::from_secs(5)));
        assert!(cfg.capabilities.allow_post_images);
        assert!(!cfg.capabilities.allow_put_image_file);
        assert!(cfg.capabilities.allow_get_image_file);
        assert_eq!(cfg.import_from_format, "qcow2");
        assert_eq!(cfg.max_created_at_delta, 60);
        assert_eq!(cfg.disk_format, "raw");
    }

    #[test]
    fn default_image_request_uses_configured_formats() {
        let mut cfg = SmokeConfig::new(ImagesClientConfig::new("http://x", "t"));
        cfg.disk_format = "qcow2".into();
        let req = cfg.default_image_request("smoke-image");
        assert_eq!(req.name.as_deref(), Some("smoke-image"));
        assert_eq!(req.container_format.as_deref(), Some("bare"));
        assert_eq!(req.disk_format.as_deref(), Some("qcow2"));
    }
}
