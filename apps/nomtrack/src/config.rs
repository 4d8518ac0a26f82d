use std::{
    fs,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context};
use client_core::default_page_size;
use tracing::warn;
use url::Url;

pub const CONFIG_FILE: &str = "nomtrack.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub page_size: NonZeroU32,
    pub token_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".into(),
            page_size: default_page_size(),
            token_path: None,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_url(&self) -> anyhow::Result<Url> {
        validate_api_url(&self.api_url)
    }

    /// Explicit `token_path` wins; otherwise the token lives under the user's
    /// home directory.
    pub fn resolve_token_path(&self) -> anyhow::Result<PathBuf> {
        match &self.token_path {
            Some(path) => Ok(path.clone()),
            None => default_token_path(),
        }
    }

    /// Overlays a flat `key = value` table. Unknown keys are ignored.
    pub fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let table: toml::Table = toml::from_str(raw).context("config file is not valid TOML")?;
        let lookup = |key: &str| {
            table.get(key).map(|value| match value {
                toml::Value::String(text) => text.clone(),
                other => other.to_string(),
            })
        };
        self.apply(lookup, &[
            ("api_url", Field::ApiUrl),
            ("page_size", Field::PageSize),
            ("token_path", Field::TokenPath),
            ("timeout_secs", Field::TimeoutSecs),
        ]);
        Ok(())
    }

    /// Overlays environment variables. `APP__*` names are applied last.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.apply(lookup, &[
            ("NOMTRACK_API_URL", Field::ApiUrl),
            ("APP__API_URL", Field::ApiUrl),
            ("NOMTRACK_PAGE_SIZE", Field::PageSize),
            ("APP__PAGE_SIZE", Field::PageSize),
            ("NOMTRACK_TOKEN_PATH", Field::TokenPath),
            ("NOMTRACK_TIMEOUT_SECS", Field::TimeoutSecs),
            ("APP__TIMEOUT_SECS", Field::TimeoutSecs),
        ]);
    }

    fn apply(&mut self, lookup: impl Fn(&str) -> Option<String>, fields: &[(&str, Field)]) {
        for (key, field) in fields {
            let Some(value) = lookup(*key) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match field {
                Field::ApiUrl => self.api_url = value.to_string(),
                Field::TokenPath => self.token_path = Some(PathBuf::from(value)),
                Field::PageSize => match value.parse::<NonZeroU32>() {
                    Ok(parsed) => self.page_size = parsed,
                    Err(err) => {
                        warn!(key = *key, value, error = %err, "ignoring invalid page size")
                    }
                },
                Field::TimeoutSecs => match value.parse::<u64>() {
                    Ok(parsed) if parsed > 0 => self.timeout_secs = parsed,
                    _ => warn!(key = *key, value, "ignoring invalid timeout"),
                },
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    ApiUrl,
    PageSize,
    TokenPath,
    TimeoutSecs,
}

/// Defaults, then the config file (if present), then the process environment.
/// Command-line flags are applied by the caller.
pub fn load_settings(config_file: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_file) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("failed to load '{}'", config_file.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read '{}'", config_file.display()))
        }
    }

    settings.apply_env(|name| std::env::var(name).ok());
    Ok(settings)
}

pub fn validate_api_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid API URL '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("API URL '{raw}' must use http or https");
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        bail!("API URL '{raw}' has no host");
    }
    Ok(url)
}

fn read_non_empty_env_var(name: &str, attempts: &mut Vec<String>) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => {
            attempts.push(format!("{name} was set but empty"));
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            attempts.push(format!("{name} unavailable: {err}"));
            None
        }
    }
}

fn default_token_path() -> anyhow::Result<PathBuf> {
    let mut attempts = Vec::new();

    if let Some(home) = read_non_empty_env_var("HOME", &mut attempts) {
        return Ok(PathBuf::from(home).join(".nomtrack").join("token"));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".nomtrack").join("token"));
    }
    attempts.push("no home directory reported by the OS".to_string());

    Err(anyhow!(
        "could not resolve a token location (set NOMTRACK_TOKEN_PATH): {}",
        attempts.join("; ")
    ))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
