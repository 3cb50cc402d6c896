use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context};
use client_core::{DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use url::Url;

pub const CONFIG_PATH_VAR: &str = "HB_ADMIN_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "admin.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the TOML file (if any), then `HB_ADMIN__*` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    let path = env::var(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut settings = Settings::default();
    if let Some(file_cfg) = read_file_settings(&path)? {
        settings.apply_file(file_cfg);
    }
    settings.apply_env(|key| env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

fn read_file_settings(path: &Path) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let parsed = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value '{raw}' for {key}"))
        })
        .transpose()
}

impl Settings {
    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file_cfg.page_size {
            self.page_size = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("HB_ADMIN__API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = parse_env(&lookup, "HB_ADMIN__PAGE_SIZE")? {
            self.page_size = v;
        }
        if let Some(v) = parse_env(&lookup, "HB_ADMIN__REQUEST_TIMEOUT_SECS")? {
            self.request_timeout_secs = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.api_base_url)
            .with_context(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        Ok(())
    }
}
