//! API token lookup.
//!
//! The token is read from `SILICONFLOW_API_TOKEN` first and from the system
//! keyring second. Tokens typed into the settings prompt are stored in the
//! keyring, never in the settings file.

use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::debug;

pub const ENV_API_TOKEN: &str = "SILICONFLOW_API_TOKEN";
const KEYRING_SERVICE: &str = "concept-mentor";
const KEYRING_ACCOUNT: &str = "api-token";

/// Describes failures when attempting to access the system keyring.
///
/// Recoverable errors indicate that the credential backend was temporarily
/// unavailable (a locked keychain, a missing secret service). Permanent
/// errors surface the underlying cause directly.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Where the settings gate and the chat client get the API token from.
pub trait CredentialSource {
    /// The token to send, or `None` when nothing is configured.
    fn api_token(&self) -> Result<Option<String>, Box<dyn Error>>;

    /// Remember a token the user entered interactively.
    fn store_token(&self, token: &str) -> Result<(), Box<dyn Error>>;
}

/// Environment variable first, then the system keyring.
pub struct EnvKeyringCredentials {
    use_keyring: bool,
}

impl EnvKeyringCredentials {
    pub fn new() -> Self {
        Self { use_keyring: true }
    }

    /// Skip the keyring entirely (headless machines, `--env-only`).
    pub fn env_only() -> Self {
        Self { use_keyring: false }
    }

    fn keyring_entry() -> Result<Entry, KeyringAccessError> {
        Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT).map_err(KeyringAccessError::from)
    }

    fn keyring_token(&self) -> Result<Option<String>, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(None);
        }
        let entry = Self::keyring_entry()?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(KeyringAccessError::from(err)),
        }
    }

    pub fn clear_stored_token(&self) -> Result<(), Box<dyn Error>> {
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Self::keyring_entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(Box::new(KeyringAccessError::from(err))),
        }
    }
}

impl Default for EnvKeyringCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvKeyringCredentials {
    fn api_token(&self) -> Result<Option<String>, Box<dyn Error>> {
        if let Some(token) = token_from_env(|key| std::env::var(key).ok()) {
            debug!(source = "env", "resolved API token");
            return Ok(Some(token));
        }

        match self.keyring_token() {
            Ok(Some(token)) => {
                debug!(source = "keyring", "resolved API token");
                Ok(Some(token))
            }
            Ok(None) => Ok(None),
            // A locked keychain is not fatal; treat it as "no token" so the
            // settings gate can explain what is missing.
            Err(err) if err.is_recoverable() => {
                debug!(error = %err, "keyring unavailable");
                Ok(None)
            }
            Err(err) => Err(Box::new(err)),
        }
    }

    fn store_token(&self, token: &str) -> Result<(), Box<dyn Error>> {
        if !self.use_keyring {
            return Err("The keyring is disabled; export SILICONFLOW_API_TOKEN instead.".into());
        }
        let entry = Self::keyring_entry()?;
        entry
            .set_password(token)
            .map_err(KeyringAccessError::from)?;
        Ok(())
    }
}

pub(crate) fn token_from_env<F>(env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(ENV_API_TOKEN)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Fixed token, for tests and for tokens passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: std::sync::Arc<std::sync::Mutex<Option<String>>>,
}

impl StaticCredentials {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: std::sync::Arc::new(std::sync::Mutex::new(token.map(str::to_string))),
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn api_token(&self) -> Result<Option<String>, Box<dyn Error>> {
        let guard = self
            .token
            .lock()
            .map_err(|_| "credential lock poisoned")?;
        Ok(guard.clone())
    }

    fn store_token(&self, token: &str) -> Result<(), Box<dyn Error>> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| "credential lock poisoned")?;
        *guard = Some(token.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_token_is_trimmed_and_blank_is_ignored() {
        let env = |key: &str| (key == ENV_API_TOKEN).then(|| "  sk-test \n".to_string());
        assert_eq!(token_from_env(env).as_deref(), Some("sk-test"));

        let blank = |_: &str| Some("   ".to_string());
        assert_eq!(token_from_env(blank), None);

        let unset = |_: &str| -> Option<String> { None };
        assert_eq!(token_from_env(unset), None);
    }

    #[test]
    fn static_credentials_remember_stored_token() {
        let creds = StaticCredentials::new(None);
        assert_eq!(creds.api_token().unwrap(), None);

        creds.store_token("sk-new").unwrap();
        assert_eq!(creds.api_token().unwrap().as_deref(), Some("sk-new"));

        let clone = creds.clone();
        assert_eq!(clone.api_token().unwrap().as_deref(), Some("sk-new"));
    }

    #[test]
    fn env_only_credentials_refuse_to_store() {
        let creds = EnvKeyringCredentials::env_only();
        assert!(creds.store_token("sk-x").is_err());
        assert!(creds.clear_stored_token().is_ok());
    }

    #[test]
    fn keyring_errors_classify_recoverability() {
        let recoverable = KeyringAccessError::from(keyring::Error::NoStorageAccess(Box::new(
            std::io::Error::other("locked"),
        )));
        assert!(recoverable.is_recoverable());

        let permanent = KeyringAccessError::from(keyring::Error::NoEntry);
        assert!(!permanent.is_recoverable());
    }
}
