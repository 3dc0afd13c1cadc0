use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_GRADING_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const ENV_API_URL: &str = "SILICONFLOW_API_URL";
pub const ENV_DEFAULT_MODEL: &str = "DEFAULT_MODEL";

pub const CONFIG_KEYS: &[&str] = &[
    "base-url",
    "default-model",
    "temperature",
    "max-tokens",
    "grading-max-tokens",
    "max-retries",
    "request-timeout-secs",
    "log-file",
];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Base URL of the OpenAI-compatible API (defaults to SiliconFlow)
    pub base_url: Option<String>,
    /// Model preselected by the settings prompt
    pub default_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Token cap for grading calls, which only need a short verdict
    pub grading_max_tokens: Option<u32>,
    /// Extra attempts for failed requests; 0 disables retrying
    pub max_retries: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    /// Write tracing output to this file
    pub log_file: Option<String>,
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// Base URL with the environment override applied.
    pub fn resolved_base_url(&self) -> String {
        self.resolved_base_url_with(|key| std::env::var(key).ok())
    }

    pub(crate) fn resolved_base_url_with<F>(&self, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        env(ENV_API_URL)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Model the settings prompt should preselect, if any was configured.
    pub fn resolved_default_model(&self) -> Option<String> {
        self.resolved_default_model_with(|key| std::env::var(key).ok())
    }

    pub(crate) fn resolved_default_model_with<F>(&self, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        env(ENV_DEFAULT_MODEL)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.default_model.clone())
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn grading_max_tokens(&self) -> u32 {
        self.grading_max_tokens
            .unwrap_or(DEFAULT_GRADING_MAX_TOKENS)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(0)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Set one key from the command line. Values are validated here so a
    /// bad value never reaches the file.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for '{key}'"));
        }
        match key {
            "base-url" => self.base_url = Some(value.to_string()),
            "default-model" => self.default_model = Some(value.to_string()),
            "temperature" => {
                let temperature: f32 = parse_number(key, value)?;
                if !(0.0..=2.0).contains(&temperature) {
                    return Err("temperature must be between 0 and 2".to_string());
                }
                self.temperature = Some(temperature);
            }
            "max-tokens" => self.max_tokens = Some(parse_positive(key, value)?),
            "grading-max-tokens" => self.grading_max_tokens = Some(parse_positive(key, value)?),
            "max-retries" => self.max_retries = Some(parse_number(key, value)?),
            "request-timeout-secs" => {
                self.request_timeout_secs = Some(u64::from(parse_positive(key, value)?))
            }
            "log-file" => self.log_file = Some(value.to_string()),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "base-url" => self.base_url = None,
            "default-model" => self.default_model = None,
            "temperature" => self.temperature = None,
            "max-tokens" => self.max_tokens = None,
            "grading-max-tokens" => self.grading_max_tokens = None,
            "max-retries" => self.max_retries = None,
            "request-timeout-secs" => self.request_timeout_secs = None,
            "log-file" => self.log_file = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  base-url: {}", self.resolved_base_url());
        match self.resolved_default_model() {
            Some(model) => println!("  default-model: {model}"),
            None => println!("  default-model: (unset)"),
        }
        println!("  temperature: {}", self.temperature());
        println!("  max-tokens: {}", self.max_tokens());
        println!("  grading-max-tokens: {}", self.grading_max_tokens());
        println!("  max-retries: {}", self.max_retries());
        println!("  request-timeout-secs: {}", self.request_timeout_secs());
        match &self.log_file {
            Some(path) => println!("  log-file: {path}"),
            None => println!("  log-file: (unset)"),
        }
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key} (expected one of: {})",
        CONFIG_KEYS.join(", ")
    )
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid value for '{key}': {value}"))
}

fn parse_positive(key: &str, value: &str) -> Result<u32, String> {
    match parse_number::<u32>(key, value)? {
        0 => Err(format!("'{key}' must be greater than zero")),
        n => Ok(n),
    }
}
