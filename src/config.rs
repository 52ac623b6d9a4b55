use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::app::EngineOptions;
use crate::error::KiraError;
use crate::matrix::DEFAULT_DELIMITER;

pub const CONFIG_FILE_NAME: &str = "kira-pd.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub snapshot: Option<String>,
    #[serde(default)]
    pub strict_alteration_types: Option<bool>,
    #[serde(default)]
    pub value_delimiter: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub snapshot: Option<Utf8PathBuf>,
    pub strict_alteration_types: bool,
    pub value_delimiter: char,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            snapshot: None,
            strict_alteration_types: false,
            value_delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl ResolvedConfig {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            strict_alteration_types: self.strict_alteration_types,
            value_delimiter: self.value_delimiter,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-pd.json` from the current directory, or the
    /// same file under the user config directory.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => Self::default_path().ok_or(KiraError::MissingConfig)?,
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        let mut resolved = Self::resolve_config(config)?;
        if let (Some(snapshot), Some(base)) = (&resolved.snapshot, config_path.parent()) {
            if snapshot.is_relative() && !base.as_os_str().is_empty() {
                let joined = Utf8PathBuf::from_path_buf(base.join(snapshot.as_std_path()))
                    .map_err(|_| KiraError::ConfigParse("non-utf8 snapshot path".to_string()))?;
                resolved.snapshot = Some(joined);
            }
        }
        Ok(resolved)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let value_delimiter = match config.value_delimiter.as_deref() {
            None => DEFAULT_DELIMITER,
            Some(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => ch,
                    _ => {
                        return Err(KiraError::ConfigParse(format!(
                            "value_delimiter must be a single character, got {value:?}"
                        )));
                    }
                }
            }
        };

        Ok(ResolvedConfig {
            schema_version,
            snapshot: config.snapshot.map(Utf8PathBuf::from),
            strict_alteration_types: config.strict_alteration_types.unwrap_or(false),
            value_delimiter,
        })
    }

    fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        BaseDirs::new()
            .map(|dirs| {
                dirs.config_dir()
                    .join("kira-portal-data")
                    .join(CONFIG_FILE_NAME)
            })
            .filter(|path| path.exists())
    }
}
