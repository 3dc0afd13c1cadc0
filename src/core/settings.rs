//! Model/credential gate that must pass before a tutoring session starts.
//!
//! Settings are an explicit value: loaded once at startup through a
//! [`SettingsStore`], saved when the user confirms a model, and cleared by
//! the "change settings" action. Nothing here is global.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::data::path_display;
use crate::core::config::io::{project_dirs, write_atomically, ConfigError};
use crate::core::credentials::CredentialSource;

/// Fixed key the settings object is stored under.
pub const SETTINGS_STORAGE_KEY: &str = "ai-tutor-settings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub label: &'static str,
    pub recommended: bool,
}

pub const MODEL_CATALOG: &[ModelOption] = &[
    ModelOption {
        id: "Qwen/QwQ-32B",
        label: "Qwen/QwQ-32B",
        recommended: true,
    },
    ModelOption {
        id: "Qwen/Qwen2.5-72B-Instruct",
        label: "Qwen/Qwen2.5-72B-Instruct",
        recommended: false,
    },
    ModelOption {
        id: "01-ai/Yi-1.5-34B-Chat-16K",
        label: "01-ai/Yi-1.5-34B-Chat-16K",
        recommended: false,
    },
    ModelOption {
        id: "meta-llama/Meta-Llama-3.1-70B-Instruct",
        label: "Meta-Llama-3.1-70B-Instruct",
        recommended: false,
    },
];

pub fn recommended_model() -> &'static str {
    MODEL_CATALOG
        .iter()
        .find(|option| option.recommended)
        .map(|option| option.id)
        .unwrap_or(MODEL_CATALOG[0].id)
}

/// Case-insensitive lookup in the catalog.
pub fn find_model(id: &str) -> Option<&'static ModelOption> {
    MODEL_CATALOG
        .iter()
        .find(|option| option.id.eq_ignore_ascii_case(id.trim()))
}

const QUICK_FIXES: &[&str] = &[
    "export SILICONFLOW_API_TOKEN=sk-...                # Use an environment variable",
    "concept-mentor settings set Qwen/QwQ-32B --token   # Store a token in the keyring",
];

/// The tutor cannot start: no credential, no usable model, or the settings
/// could not be read or written.
#[derive(Debug)]
pub enum ConfigurationError {
    MissingCredential,
    InvalidModel(String),
    Credential(Box<dyn Error>),
    Storage(Box<dyn Error>),
}

impl ConfigurationError {
    pub fn quick_fixes(&self) -> &'static [&'static str] {
        match self {
            ConfigurationError::MissingCredential | ConfigurationError::Credential(_) => {
                QUICK_FIXES
            }
            _ => &[],
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigurationError::MissingCredential | ConfigurationError::Credential(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::MissingCredential => write!(
                f,
                "❌ No API token configured.\n\nSet SILICONFLOW_API_TOKEN or enter a token in the settings prompt."
            ),
            ConfigurationError::InvalidModel(model) => {
                write!(f, "❌ Invalid model identifier: '{model}'")
            }
            ConfigurationError::Credential(err) => {
                write!(f, "❌ Could not read the API token: {err}")
            }
            ConfigurationError::Storage(err) => {
                write!(f, "❌ Could not access saved settings: {err}")
            }
        }
    }
}

impl Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigurationError::Credential(err) | ConfigurationError::Storage(err) => {
                Some(err.as_ref())
            }
            _ => None,
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> Result<Option<Settings>, Box<dyn Error>>;
    fn save(&self, settings: &Settings) -> Result<(), Box<dyn Error>>;
    fn clear(&self) -> Result<(), Box<dyn Error>>;
}

/// Settings persisted as `ai-tutor-settings.json` in the data directory.
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, ConfigError> {
        let dirs = project_dirs().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(
            dirs.data_dir()
                .join(format!("{SETTINGS_STORAGE_KEY}.json")),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<Option<Settings>, Box<dyn Error>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Settings>(&contents) {
            Ok(settings) if !settings.model.trim().is_empty() => Ok(Some(settings)),
            Ok(_) => Ok(None),
            Err(err) => {
                // A damaged file only costs the user one more model pick.
                warn!(path = %path_display(&self.path), error = %err, "ignoring unreadable settings");
                Ok(None)
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), Box<dyn Error>> {
        let contents = serde_json::to_vec(settings)?;
        write_atomically(&self.path, &contents)
    }

    fn clear(&self) -> Result<(), Box<dyn Error>> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Box::new(err)),
        }
    }
}

/// In-process settings storage, used by tests and `--no-save` runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<Settings>>,
}

impl MemorySettingsStore {
    pub fn new(initial: Option<Settings>) -> Self {
        Self {
            settings: Mutex::new(initial),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<Settings>, Box<dyn Error>> {
        let guard = self.settings.lock().map_err(|_| "settings lock poisoned")?;
        Ok(guard.clone())
    }

    fn save(&self, settings: &Settings) -> Result<(), Box<dyn Error>> {
        let mut guard = self.settings.lock().map_err(|_| "settings lock poisoned")?;
        *guard = Some(settings.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Box<dyn Error>> {
        let mut guard = self.settings.lock().map_err(|_| "settings lock poisoned")?;
        guard.take();
        Ok(())
    }
}

pub struct SettingsGate<S, C> {
    store: S,
    credentials: C,
}

impl<S: SettingsStore, C: CredentialSource> SettingsGate<S, C> {
    pub fn new(store: S, credentials: C) -> Self {
        Self { store, credentials }
    }

    /// Previously confirmed settings, or `None` when the user still has to
    /// pick a model. Fails when settings exist but no token is available.
    pub fn resolve(&self) -> Result<Option<Settings>, ConfigurationError> {
        let Some(settings) = self.store.load().map_err(ConfigurationError::Storage)? else {
            return Ok(None);
        };
        self.api_token()?;
        Ok(Some(settings))
    }

    /// Accept the user's choice. A token, if given, is handed to the
    /// credential source first; the settings are only saved once a token is
    /// known to be available.
    pub fn confirm(
        &self,
        model: &str,
        token: Option<&str>,
    ) -> Result<Settings, ConfigurationError> {
        let model = model.trim();
        if model.is_empty() || model.chars().any(char::is_whitespace) {
            return Err(ConfigurationError::InvalidModel(model.to_string()));
        }
        let model = find_model(model)
            .map(|option| option.id.to_string())
            .unwrap_or_else(|| model.to_string());

        if let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) {
            self.credentials
                .store_token(token)
                .map_err(ConfigurationError::Credential)?;
        }
        self.api_token()?;

        let settings = Settings { model };
        self.store
            .save(&settings)
            .map_err(ConfigurationError::Storage)?;
        info!(model = %settings.model, "settings confirmed");
        Ok(settings)
    }

    /// Forget the saved settings so the next start asks again.
    pub fn reset(&self) -> Result<(), ConfigurationError> {
        self.store.clear().map_err(ConfigurationError::Storage)?;
        info!("settings cleared");
        Ok(())
    }

    pub fn api_token(&self) -> Result<String, ConfigurationError> {
        self.credentials
            .api_token()
            .map_err(ConfigurationError::Credential)?
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigurationError::MissingCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::StaticCredentials;
    use tempfile::TempDir;

    fn settings(model: &str) -> Settings {
        Settings {
            model: model.to_string(),
        }
    }

    #[test]
    fn catalog_recommends_qwq() {
        assert_eq!(recommended_model(), "Qwen/QwQ-32B");
        assert_eq!(MODEL_CATALOG.iter().filter(|m| m.recommended).count(), 1);
        assert_eq!(
            find_model("qwen/qwen2.5-72b-instruct").map(|m| m.id),
            Some("Qwen/Qwen2.5-72B-Instruct")
        );
        assert!(find_model("gpt-4o").is_none());
    }

    #[test]
    fn resolve_without_saved_settings_asks_for_a_model() {
        let gate = SettingsGate::new(
            MemorySettingsStore::default(),
            StaticCredentials::new(None),
        );
        assert!(gate.resolve().unwrap().is_none());
    }

    #[test]
    fn resolve_with_saved_settings_requires_a_token() {
        let gate = SettingsGate::new(
            MemorySettingsStore::new(Some(settings("Qwen/QwQ-32B"))),
            StaticCredentials::new(None),
        );
        let err = gate.resolve().expect_err("token missing");
        assert!(matches!(err, ConfigurationError::MissingCredential));
        assert_eq!(err.exit_code(), 2);
        assert!(!err.quick_fixes().is_empty());

        let gate = SettingsGate::new(
            MemorySettingsStore::new(Some(settings("Qwen/QwQ-32B"))),
            StaticCredentials::new(Some("sk-1")),
        );
        assert_eq!(gate.resolve().unwrap(), Some(settings("Qwen/QwQ-32B")));
    }

    #[test]
    fn confirm_persists_model_and_stores_entered_token() {
        let credentials = StaticCredentials::new(None);
        let gate = SettingsGate::new(MemorySettingsStore::default(), credentials.clone());

        let confirmed = gate
            .confirm("qwen/qwq-32b", Some("  sk-typed  "))
            .expect("confirm");
        assert_eq!(confirmed, settings("Qwen/QwQ-32B"));
        assert_eq!(credentials.api_token().unwrap().as_deref(), Some("sk-typed"));
        assert_eq!(gate.resolve().unwrap(), Some(settings("Qwen/QwQ-32B")));
    }

    #[test]
    fn confirm_without_any_token_saves_nothing() {
        let gate = SettingsGate::new(
            MemorySettingsStore::default(),
            StaticCredentials::new(None),
        );
        let err = gate.confirm("Qwen/QwQ-32B", Some("   ")).expect_err("no token");
        assert!(matches!(err, ConfigurationError::MissingCredential));
        assert!(gate.store.load().unwrap().is_none());
    }

    #[test]
    fn confirm_accepts_custom_models_but_rejects_blank_ones() {
        let gate = SettingsGate::new(
            MemorySettingsStore::default(),
            StaticCredentials::new(Some("sk")),
        );
        assert_eq!(
            gate.confirm("deepseek-ai/DeepSeek-V3", None).unwrap(),
            settings("deepseek-ai/DeepSeek-V3")
        );
        assert!(matches!(
            gate.confirm("   ", None),
            Err(ConfigurationError::InvalidModel(_))
        ));
        assert!(matches!(
            gate.confirm("two words", None),
            Err(ConfigurationError::InvalidModel(_))
        ));
    }

    #[test]
    fn reset_clears_saved_settings() {
        let gate = SettingsGate::new(
            MemorySettingsStore::new(Some(settings("Qwen/QwQ-32B"))),
            StaticCredentials::new(Some("sk")),
        );
        gate.reset().unwrap();
        assert!(gate.resolve().unwrap().is_none());
        gate.reset().unwrap();
    }

    #[test]
    fn json_store_round_trips_only_the_model() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("data").join("ai-tutor-settings.json");
        let store = JsonFileSettingsStore::new(&path);

        assert!(store.load().unwrap().is_none());
        store.save(&settings("Qwen/QwQ-32B")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"model":"Qwen/QwQ-32B"}"#);
        assert_eq!(store.load().unwrap(), Some(settings("Qwen/QwQ-32B")));

        store.clear().unwrap();
        assert!(!path.exists());
        store.clear().unwrap();
    }

    #[test]
    fn json_store_treats_damaged_file_as_absent() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("ai-tutor-settings.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonFileSettingsStore::new(&path);
        assert!(store.load().unwrap().is_none());

        fs::write(&path, r#"{"model":"  "}"#).unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
