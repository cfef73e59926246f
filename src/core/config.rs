use crate::core::history::SupportedHistorySet;
use crate::core::router::RouterSettings;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OkxProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for OkxProviderConfig {
    fn default() -> Self {
        OkxProviderConfig {
            base_url: "https://www.okx.com".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub okx: Option<OkxProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            okx: Some(OkxProviderConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { ttl_secs: 30 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    pub page_size: usize,
    pub history_window: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            page_size: 10,
            history_window: 24,
        }
    }
}

/// Symbols with history on OKX, keyed to their `currencyId`.
pub fn default_supported_history() -> BTreeMap<String, u64> {
    [
        ("USDT", 7),
        ("USDC", 283),
        ("TON", 2054),
        ("ZRO", 2425497),
        ("APT", 2092),
        ("BERA", 3197),
        ("BETH", 1620),
        ("ETHFI", 1215929),
        ("CVC", 54),
        ("CVX", 1911),
        ("BABY", 3274),
        ("IP", 3261),
        ("KMNO", 1743707),
        ("PARTI", 3185),
        ("MAGIC", 1970),
        ("PENGU", 3230),
        ("SOPH", 3293),
        ("XTZ", 1029),
        ("DOT", 1486),
        ("JST", 1438),
    ]
    .into_iter()
    .map(|(symbol, id)| (symbol.to_string(), id))
    .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default = "default_supported_history")]
    pub supported_history: BTreeMap<String, u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            cache: CacheConfig::default(),
            navigation: NavigationConfig::default(),
            supported_history: default_supported_history(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or defaults when no file
    /// has been set up there yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            info!(
                "No config at {}, using defaults (run `lendrate setup` to create one)",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "lendrate", "lendrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn okx(&self) -> OkxProviderConfig {
        self.providers.okx.clone().unwrap_or_default()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            page_size: self.navigation.page_size.max(1),
            history_window: self.navigation.history_window,
        }
    }

    pub fn supported_history(&self) -> SupportedHistorySet {
        SupportedHistorySet::new(
            self.supported_history
                .iter()
                .map(|(symbol, id)| (symbol.as_str(), *id)),
        )
    }
}
