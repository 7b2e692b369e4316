//! Paging configuration for lazy lists.

use serde::Deserialize;
use std::path::Path;

/// Dotted key of the configuration section.
pub const SECTION: &str = "folio.lazy-list";

const ENV_PAGE_SIZE: &str = "FOLIO_LAZY_LIST_PAGE_SIZE";
const ENV_MAX_PAGES: &str = "FOLIO_LAZY_LIST_MAX_PAGES";

fn default_page_size() -> usize { 50 }
fn default_max_pages() -> usize { 10 }

/// Errors raised while loading or validating a [`ListConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred.
    Load(String),
    /// A value was present but not acceptable.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Page geometry of a lazy list.
///
/// Can be read from YAML; missing fields take their defaults.
///
/// ```yaml
/// folio:
///   lazy-list:
///     page-size: 50     # default: 50
///     max-pages: 10     # default: 10
/// ```
///
/// Environment variables `FOLIO_LAZY_LIST_PAGE_SIZE` and
/// `FOLIO_LAZY_LIST_MAX_PAGES` override file values when loading with
/// [`ListConfig::load`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListConfig {
    /// Entities fetched per backend call. Default: 50.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Pages kept in memory before eviction. Default: 10.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl ListConfig {
    pub fn new(page_size: usize, max_pages: usize) -> Self {
        Self {
            page_size,
            max_pages,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Parse the `folio.lazy-list` section of a YAML document.
    ///
    /// A document without the section yields the defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let root: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
        let section = SECTION
            .split('.')
            .try_fold(&root, |node, segment| node.get(segment));
        let config = match section {
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| ConfigError::Load(e.to_string()))?,
            None => ListConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file (if it exists) and overlay environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
            Self::from_yaml_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            ListConfig::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `FOLIO_LAZY_LIST_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env_usize(ENV_PAGE_SIZE)? {
            self.page_size = value;
        }
        if let Some(value) = env_usize(ENV_MAX_PAGES)? {
            self.max_pages = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                key: format!("{SECTION}.page-size"),
                message: "must be at least 1".into(),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: format!("{SECTION}.max-pages"),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::Invalid {
            key: name.to_string(),
            message: format!("expected a positive integer, got '{raw}'"),
        }),
        Err(_) => Ok(None),
    }
}
