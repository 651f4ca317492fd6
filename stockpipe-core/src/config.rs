//! Pipeline configuration, loaded from `stockpipe.toml`.
//!
//! Every section has defaults, so a missing file yields a usable config.
//! Secrets never live in the TOML file; they are resolved from the process
//! environment, falling back to the `.env` file written by `setup`.

use crate::env_file::EnvFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "stockpipe.toml";

pub const ALPACA_KEY: &str = "ALPACA_KEY";
pub const ALPACA_SECRET: &str = "ALPACA_SECRET";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("{key} must be set in the environment or in {env_file}")]
    MissingSecret { key: String, env_file: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub bootstrap: BootstrapConfig,
    pub store: StoreConfig,
    pub alpaca: AlpacaConfig,
    pub agent: AgentConfig,
    pub universe: UniverseConfig,
}

/// Settings for `stockpipe setup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Project root; every relative path below resolves against it.
    pub root: PathBuf,
    /// Interpreter used to create the runtime environment.
    pub python: String,
    pub venv_dir: PathBuf,
    pub requirements: PathBuf,
    pub directories: Vec<String>,
    /// Orchestration image tag written as `AIRFLOW_IMAGE_NAME`.
    pub image: String,
    /// Written as `FINNHUB_API_KEY`; never validated.
    pub api_key_placeholder: String,
    pub env_file: PathBuf,
    /// Extra `.env` entries appended after the fixed keys.
    pub extra_env: BTreeMap<String, String>,
    pub initializer: InitializerConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            python: "python3".into(),
            venv_dir: PathBuf::from(".venv"),
            requirements: PathBuf::from("requirements.txt"),
            directories: ["dags", "logs", "plugins", "config"]
                .into_iter()
                .map(String::from)
                .collect(),
            image: "apache/airflow:2.10.4".into(),
            api_key_placeholder: "your_finnhub_api_key_here".into(),
            env_file: PathBuf::from(".env"),
            extra_env: BTreeMap::new(),
            initializer: InitializerConfig::Builtin,
        }
    }
}

impl BootstrapConfig {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.resolve(&self.env_file)
    }
}

/// How the database gets initialized at the end of setup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitializerConfig {
    /// Create the pipeline tables in the embedded store.
    #[default]
    Builtin,
    /// Run an external program; it must exit with status 0.
    External {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlpacaConfig {
    pub data_url: String,
    pub trading_url: String,
    /// `iex` works on free accounts, `sip` needs a subscription.
    pub feed: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for AlpacaConfig {
    fn default() -> Self {
        Self {
            data_url: "https://data.alpaca.markets".into(),
            trading_url: "https://paper-api.alpaca.markets".into(),
            feed: "iex".into(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".into(),
            model: "gpt-4.1".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub tickers: Vec<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            tickers: crate::data::universe::DEFAULT_TICKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load the explicit path if given, else `stockpipe.toml` when it exists,
    /// else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.bootstrap;
        if b.directories.is_empty() {
            return Err(ConfigError::Invalid(
                "bootstrap.directories must not be empty".into(),
            ));
        }
        if b.directories.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "bootstrap.directories contains an empty name".into(),
            ));
        }
        if b.image.trim().is_empty() {
            return Err(ConfigError::Invalid("bootstrap.image must not be empty".into()));
        }
        if b.python.trim().is_empty() {
            return Err(ConfigError::Invalid("bootstrap.python must not be empty".into()));
        }
        if let InitializerConfig::External { program, .. } = &b.initializer {
            if program.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "bootstrap.initializer.program must not be empty".into(),
                ));
            }
        }
        if self.alpaca.timeout_secs == 0 || self.agent.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".into()));
        }
        Ok(())
    }

    /// Store root, relative to the bootstrap root when not absolute.
    pub fn store_root(&self) -> PathBuf {
        self.bootstrap.resolve(&self.store.root)
    }

    /// Look up a secret: process environment first, then the `.env` file.
    pub fn secret(&self, key: &str) -> Result<String, ConfigError> {
        if let Ok(value) = std::env::var(key) {
            if !value.is_empty() {
                return Ok(value);
            }
        }

        let env_path = self.bootstrap.env_file_path();
        let from_file = if env_path.exists() {
            match EnvFile::load(&env_path) {
                Ok(env) => env.get(key).map(str::to_string),
                Err(e) => {
                    tracing::warn!("ignoring unreadable {}: {e}", env_path.display());
                    None
                }
            }
        } else {
            None
        };

        from_file
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingSecret {
                key: key.to_string(),
                env_file: env_path.display().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(
            config.bootstrap.directories,
            vec!["dags", "logs", "plugins", "config"]
        );
        assert_eq!(config.bootstrap.initializer, InitializerConfig::Builtin);
    }

    #[test]
    fn parses_external_initializer() {
        let config = PipelineConfig::from_toml(
            r#"
[bootstrap]
root = "/srv/pipeline"
image = "apache/airflow:2.9.0"

[bootstrap.initializer]
kind = "external"
program = "python3"
args = ["db/commander.py"]

[store]
root = "/var/lib/stockpipe"
"#,
        )
        .unwrap();

        assert_eq!(config.bootstrap.image, "apache/airflow:2.9.0");
        assert_eq!(
            config.bootstrap.initializer,
            InitializerConfig::External {
                program: "python3".into(),
                args: vec!["db/commander.py".into()],
            }
        );
        assert_eq!(config.store_root(), PathBuf::from("/var/lib/stockpipe"));
        assert_eq!(
            config.bootstrap.env_file_path(),
            PathBuf::from("/srv/pipeline/.env")
        );
    }

    #[test]
    fn rejects_empty_directory_list() {
        let err = PipelineConfig::from_toml("[bootstrap]\ndirectories = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = PipelineConfig::from_toml("[alpaca]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unparsable_toml() {
        assert!(matches!(
            PipelineConfig::from_toml("[bootstrap"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn secret_falls_back_to_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.bootstrap.root = dir.path().to_path_buf();
        std::fs::write(
            dir.path().join(".env"),
            "STOCKPIPE_TEST_ONLY_SECRET=from-file\n",
        )
        .unwrap();

        assert_eq!(
            config.secret("STOCKPIPE_TEST_ONLY_SECRET").unwrap(),
            "from-file"
        );
        assert!(matches!(
            config.secret("STOCKPIPE_TEST_ONLY_MISSING"),
            Err(ConfigError::MissingSecret { .. })
        ));
    }
}
