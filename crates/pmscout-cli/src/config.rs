//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use pmscout_core::RetryPolicy;
use pmscout_pubmed::{DEFAULT_BASE_URL, HeuristicClassifier};
use serde::Deserialize;

/// Global configuration for pmscout
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub eutils: EutilsConfig,
    pub http: HttpConfig,
    pub workers: WorkersConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EutilsConfig {
    pub base_url: String,
    pub max_results: usize,
    pub batch_size: usize,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: 100,
            batch_size: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout: u64,
    pub max_retries: u32,
    /// First backoff delay; doubles on each retry
    pub retry_base_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            max_retries: 3,
            retry_base_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        // E-utilities allow about 3 requests/s per client
        Self { default: 2 }
    }
}

/// Extra keywords merged with the built-in classifier patterns
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ClassifierConfig {
    pub academic_keywords: Vec<String>,
    pub company_keywords: Vec<String>,
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./pmscout.toml (current directory)
    /// 2. ~/.config/pmscout/config.toml (platform config dir)
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("pmscout.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(dirs) = directories::ProjectDirs::from("", "", "pmscout") {
            let user_config = dirs.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Library configuration for one harvest
    pub fn harvest_config(&self) -> pmscout_pubmed::Config {
        pmscout_pubmed::Config {
            base_url: self.eutils.base_url.clone(),
            max_results: self.eutils.max_results,
            batch_size: self.eutils.batch_size.max(1),
            workers: self.workers.default.max(1),
            timeout: Duration::from_secs(self.http.timeout),
            retry: RetryPolicy {
                max_retries: self.http.max_retries,
                base_delay: Duration::from_millis(self.http.retry_base_ms),
            },
        }
    }

    /// Built-in classifier extended with the configured keywords
    pub fn classifier(&self) -> Result<HeuristicClassifier> {
        HeuristicClassifier::new(
            &self.classifier.academic_keywords,
            &self.classifier.company_keywords,
        )
        .context("Invalid classifier keywords")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmscout_pubmed::{AffiliationClassifier, AffiliationKind};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.eutils.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.eutils.max_results, 100);
        assert_eq!(config.http.max_retries, 3);
        assert!(config.workers.default >= 1);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[eutils]
base_url = "http://localhost:8080/eutils"
max_results = 500
batch_size = 50

[http]
timeout = 10
max_retries = 5
retry_base_ms = 250

[workers]
default = 4

[classifier]
company_keywords = ["Novartis"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.eutils.max_results, 500);
        assert_eq!(config.workers.default, 4);

        let harvest = config.harvest_config();
        assert_eq!(harvest.search_endpoint(), "http://localhost:8080/eutils/esearch.fcgi");
        assert_eq!(harvest.batch_size, 50);
        assert_eq!(harvest.timeout, Duration::from_secs(10));
        assert_eq!(harvest.retry.max_retries, 5);
        assert_eq!(harvest.retry.base_delay, Duration::from_millis(250));

        let classifier = config.classifier().unwrap();
        assert_eq!(
            classifier.classify("Novartis Institutes for BioMedical Research"),
            AffiliationKind::NonAcademic
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[workers]\ndefault = 8\n").unwrap();
        assert_eq!(config.workers.default, 8);
        assert_eq!(config.eutils.batch_size, 20);
        assert_eq!(config.http.timeout, 30);
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let config: Config = toml::from_str("[eutils]\nbatch_size = 0\n[workers]\ndefault = 0\n").unwrap();
        let harvest = config.harvest_config();
        assert_eq!(harvest.batch_size, 1);
        assert_eq!(harvest.workers, 1);
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pmscout.toml");
        std::fs::write(&path, "[eutils\nbroken").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("pmscout.toml"));

        let missing = dir.path().join("missing.toml");
        assert!(Config::from_file(&missing).is_err());
    }
}
