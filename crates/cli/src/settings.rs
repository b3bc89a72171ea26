//! Settings layering: command-line flag (or its environment variable), then
//! config file, then credentials file, then built-in default.

use std::path::{Path, PathBuf};

use intel::DEFAULT_HOST;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Hunt output file used when neither flag nor config names one.
pub const DEFAULT_OUTPUT: &str = "output.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid credentials file '{}': {source}", path.display())]
    Credentials {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing argument {key} - Try running '{program} -h' for help")]
    Missing { key: &'static str, program: String },
}

/// A setting that can come from several layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Url,
    Username,
    Password,
    Since,
    Until,
    Family,
}

impl Key {
    pub fn name(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Username => "username",
            Self::Password => "password",
            Self::Since => "since",
            Self::Until => "until",
            Self::Family => "family",
        }
    }
}

/// Flat keys of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub family: Option<String>,
    pub output: Option<PathBuf>,
}

/// Contents of `ticloud_credentials.json`.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// All non-flag layers, loaded once per run.
#[derive(Clone, Default)]
pub struct Settings {
    pub file: FileSettings,
    pub credentials: Credentials,
    program: String,
}

impl Settings {
    /// Loads the config and credentials files.
    ///
    /// A missing default config file or credentials file is not an error; a
    /// missing config file named explicitly with `--config` is.
    pub fn load(
        config: Option<&Path>,
        credentials: &Path,
        program: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        let file = match config {
            Some(path) => parse_config(path, read(path)?)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                match read_optional(path)? {
                    Some(text) => parse_config(path, text)?,
                    None => FileSettings::default(),
                }
            }
        };

        let credentials = match read_optional(credentials)? {
            Some(text) => serde_json::from_str(&text).map_err(|source| {
                SettingsError::Credentials {
                    path: credentials.to_path_buf(),
                    source,
                }
            })?,
            None => Credentials::default(),
        };

        Ok(Self {
            file,
            credentials,
            program: program.into(),
        })
    }

    /// Resolves `key`, preferring the command-line value.
    pub fn resolve(&self, key: Key, flag: Option<&str>) -> Result<String, SettingsError> {
        let from_file = match key {
            Key::Url => self.file.url.as_deref(),
            Key::Username => self.file.username.as_deref(),
            Key::Password => self.file.password.as_deref(),
            Key::Since => self.file.since.as_deref(),
            Key::Until => self.file.until.as_deref(),
            Key::Family => self.file.family.as_deref(),
        };
        let from_credentials = match key {
            Key::Username => self.credentials.username.as_deref(),
            Key::Password => self.credentials.password.as_deref(),
            _ => None,
        };
        let default = match key {
            Key::Url => Some(DEFAULT_HOST),
            _ => None,
        };

        flag.or(from_file)
            .or(from_credentials)
            .or(default)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| SettingsError::Missing {
                key: key.name(),
                program: self.program.clone(),
            })
    }

    /// Hunt output path: flag, then config, then [`DEFAULT_OUTPUT`].
    pub fn output(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.file.output.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }
}

fn read(path: &Path) -> Result<String, SettingsError> {
    std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional(path: &Path) -> Result<Option<String>, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), "Loaded settings file");
            Ok(Some(text))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SettingsError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_config(path: &Path, text: String) -> Result<FileSettings, SettingsError> {
    toml::from_str(&text).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
