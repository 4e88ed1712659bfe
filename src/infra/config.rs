use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "neobbs.log";

#[derive(Debug, Error)]
pub enum ResolveStateDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    StateDir(#[from] ResolveStateDirError),

    #[error("failed to read config {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
    pub log_path: PathBuf,
}

/// On-disk shape of `config.json`. Every field is optional.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

/// Values passed on the command line; these win over every other layer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub auth_token: Option<String>,
}

pub fn resolve_state_dir() -> Result<PathBuf, ResolveStateDirError> {
    if let Some(override_dir) = std::env::var_os("NEOBBS_HOME") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = dirs::home_dir() else {
        return Err(ResolveStateDirError::HomeDirNotFound);
    };
    Ok(home.join(".neobbs"))
}

impl Config {
    pub fn defaults(state_dir: &Path) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            request_timeout: DEFAULT_TIMEOUT,
            log_path: state_dir.join(LOG_FILE),
        }
    }

    /// Defaults, then `config.json`, then the process environment, then `overrides`.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let state_dir = resolve_state_dir()?;
        let mut config = Self::defaults(&state_dir);
        if let Some(file) = load_config_file(&state_dir)? {
            config.apply_file(file)?;
        }
        config.apply_env(|name| std::env::var(name).ok())?;
        config.apply_overrides(overrides)?;
        tracing::debug!(api_url = %config.api_url, "configuration resolved");
        Ok(config)
    }

    pub fn apply_file(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        if let Some(api_url) = file.api_url {
            self.api_url = validate_api_url("api_url", &api_url)?;
        }
        if let Some(token) = file.auth_token {
            self.auth_token = non_blank(token);
        }
        if let Some(secs) = file.timeout_secs {
            self.request_timeout = timeout_from_secs("timeout_secs", secs)?;
        }
        if let Some(log_path) = file.log_path {
            self.log_path = log_path;
        }
        Ok(())
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = lookup("NEOBBS_API_URL") {
            self.api_url = validate_api_url("NEOBBS_API_URL", &api_url)?;
        }
        if let Some(token) = lookup("NEOBBS_AUTH_TOKEN") {
            self.auth_token = non_blank(token);
        }
        if let Some(raw) = lookup("NEOBBS_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "NEOBBS_TIMEOUT_SECS".to_string(),
                    value: raw.clone(),
                })?;
            self.request_timeout = timeout_from_secs("NEOBBS_TIMEOUT_SECS", secs)?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(api_url) = &overrides.api_url {
            self.api_url = validate_api_url("--api-url", api_url)?;
        }
        if let Some(token) = &overrides.auth_token {
            self.auth_token = non_blank(token.clone());
        }
        Ok(())
    }
}

pub fn load_config_file(state_dir: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    let path = state_dir.join(CONFIG_FILE);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };

    let file = serde_json::from_str::<ConfigFile>(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(file))
}

fn validate_api_url(name: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_string());
    }
    Err(ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn timeout_from_secs(name: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn missing_file_keeps_defaults() {
        let dir = tempdir().expect("tempdir");
        assert!(load_config_file(dir.path()).expect("load").is_none());

        let config = Config::defaults(dir.path());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_path, dir.path().join("neobbs.log"));
    }

    #[test]
    fn layers_apply_in_order() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("config.json"),
            r#"{"api_url":"https://bbs.example.net","auth_token":"file-token","timeout_secs":3}"#,
        )
        .expect("write");

        let mut config = Config::defaults(dir.path());
        let file = load_config_file(dir.path()).expect("load").expect("file");
        config.apply_file(file).expect("apply file");
        assert_eq!(config.api_url, "https://bbs.example.net");
        assert_eq!(config.auth_token.as_deref(), Some("file-token"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));

        let env: HashMap<&str, &str> = HashMap::from([("NEOBBS_AUTH_TOKEN", "env-token")]);
        config
            .apply_env(|name| env.get(name).map(|v| (*v).to_string()))
            .expect("apply env");
        assert_eq!(config.auth_token.as_deref(), Some("env-token"));

        config
            .apply_overrides(&ConfigOverrides {
                api_url: Some("http://127.0.0.1:9000".to_string()),
                auth_token: None,
            })
            .expect("apply overrides");
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.auth_token.as_deref(), Some("env-token"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("config.json"), "{ nope").expect("write");
        let error = load_config_file(dir.path()).expect_err("parse error");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let mut config = Config::defaults(dir.path());

        let error = config
            .apply_env(|name| (name == "NEOBBS_TIMEOUT_SECS").then(|| "soon".to_string()))
            .expect_err("timeout");
        assert!(matches!(error, ConfigError::InvalidValue { .. }));

        let error = config
            .apply_env(|name| (name == "NEOBBS_API_URL").then(|| "ftp://x".to_string()))
            .expect_err("url");
        assert!(matches!(error, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn invalid_api_url_flag_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let mut config = Config::defaults(dir.path());

        let error = config
            .apply_overrides(&ConfigOverrides {
                api_url: Some("ftp://x".to_string()),
                auth_token: None,
            })
            .expect_err("url");
        assert!(matches!(error, ConfigError::InvalidValue { ref name, .. } if name == "--api-url"));
        assert_eq!(config.api_url, DEFAULT_API_URL);

        config
            .apply_overrides(&ConfigOverrides {
                api_url: Some(" https://bbs.example.net ".to_string()),
                auth_token: None,
            })
            .expect("valid url");
        assert_eq!(config.api_url, "https://bbs.example.net");
    }
}
