//! Loader for podharvest configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached, and `PODHARVEST__`
//! environment variables are applied last so they win over files
//! (`PODHARVEST__COLLECTOR__LIMIT=20` sets `collector.limit`). String values
//! may reference other environment variables as `${VAR}`.
//!
//! Every section has defaults, so an empty document loads. `site.base_url` is
//! the one value a run cannot do without; see [`PodharvestConfig::validate`].
use config::{Config, ConfigError, Environment, File};
use podharvest_common::OutputFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "PODHARVEST";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodharvestConfig {
    pub version: Option<String>,
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub collector: CollectorConfig,
    pub output: OutputConfig,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
}

impl PodharvestConfig {
    /// Check the values a scrape run depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.base_url.trim().is_empty() {
            return Err(ConfigError::Message("site.base_url must be set".into()));
        }
        if self.site.row_selector.trim().is_empty() || self.site.title_selectors.is_empty() {
            return Err(ConfigError::Message(
                "site.row_selector and site.title_selectors must be set".into(),
            ));
        }
        if self.collector.limit == 0 {
            return Err(ConfigError::Message("collector.limit must be positive".into()));
        }
        if self.collector.max_stable_attempts == 0 {
            return Err(ConfigError::Message(
                "collector.max_stable_attempts must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Where the directory lives and how its markup is located.
///
/// Selector lists are tried in order; the first one that matches wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub search_path: String,
    pub search_param: String,
    pub result_selectors: Vec<String>,
    pub reveal_selectors: Vec<String>,
    pub list_selector: String,
    pub row_selector: String,
    pub title_selectors: Vec<String>,
    pub description_selectors: Vec<String>,
    pub date_selectors: Vec<String>,
    pub link_selectors: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            search_path: "/search".into(),
            search_param: "q".into(),
            result_selectors: strings(&["[data-testid='podcast-result'] a", "a[href*='/podcast/']"]),
            reveal_selectors: strings(&[
                "[data-testid='episodes-tab']",
                "button[aria-controls*='episodes']",
                "a[href$='/episodes']",
            ]),
            list_selector: "[data-testid='episode-list']".into(),
            row_selector: "[data-testid='episode-row']".into(),
            title_selectors: strings(&["[data-testid='episode-title']", "h3", "h2"]),
            description_selectors: strings(&["[data-testid='episode-description']", "p"]),
            date_selectors: strings(&["[data-testid='episode-date']", "time"]),
            link_selectors: strings(&["a[data-testid='episode-share']", "a[href]"]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Fixed user agent; a built-in desktop profile is picked when unset.
    pub user_agent: Option<String>,
    pub wait_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            window_width: 1440,
            window_height: 900,
            user_agent: None,
            wait_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub limit: usize,
    pub max_stable_attempts: u32,
    pub settle_delay_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            max_stable_attempts: 12,
            settle_delay_ms: 800,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination file; stdout when unset.
    pub path: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Capture a screenshot and page source when a run yields nothing.
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("debug"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub stderr: bool,
    pub json: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            stderr: false,
            json: false,
            filter: "info".into(),
        }
    }
}

/// `<config_dir>/podharvest/podharvest.yaml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("podharvest").join("podharvest.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
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

/// Builder hiding the `config` crate wiring (files, inline YAML, env overrides).
pub struct PodharvestConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PodharvestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PodharvestConfigLoader {
    /// Start with no files; `PODHARVEST__` env overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use podharvest_config::PodharvestConfigLoader;
    ///
    /// let config = PodharvestConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.collector.limit, 50);
    /// assert_eq!(config.collector.max_stable_attempts, 12);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use podharvest_common::OutputFormat;
    /// use podharvest_config::PodharvestConfigLoader;
    ///
    /// let cfg = PodharvestConfigLoader::new()
    ///     .with_yaml_str(
    ///         r##"
    /// site:
    ///   base_url: "https://directory.test"
    ///   reveal_selectors: ["#episodes"]
    /// output:
    ///   format: jsonl
    /// "##,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.site.base_url, "https://directory.test");
    /// assert_eq!(cfg.site.reveal_selectors, vec!["#episodes".to_string()]);
    /// assert_eq!(cfg.site.search_param, "q");
    /// assert_eq!(cfg.output.format, OutputFormat::JsonLines);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialise.
    pub fn load(self) -> Result<PodharvestConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
