//! Secure in-memory credential management.
//!
//! ```rust
//! use sgprovider::{ProviderId, SecureCredentialManager};
//!
//! let credentials = SecureCredentialManager::new();
//! credentials.set_api_key(ProviderId::OpenAi, "sk-test").expect("key should set");
//! assert!(credentials.has_api_key(ProviderId::OpenAi).expect("lock"));
//! assert_eq!(format!("{:?}", credentials), "SecureCredentialManager { providers: [OpenAi] }");
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{ProviderError, ProviderId};

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // SAFETY: zero bytes are valid UTF-8.
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

#[derive(Default)]
pub struct SecureCredentialManager {
    api_keys: Mutex<HashMap<ProviderId, SecretString>>,
}

impl SecureCredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(
        &self,
        provider: ProviderId,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key.into().trim());
        if api_key.is_empty() {
            return Err(ProviderError::authentication("api key must not be empty"));
        }

        self.api_keys_guard()?.insert(provider, api_key);
        Ok(())
    }

    pub fn has_api_key(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.api_keys_guard()?.contains_key(&provider))
    }

    pub fn api_key(&self, provider: ProviderId) -> Result<Option<SecretString>, ProviderError> {
        Ok(self.api_keys_guard()?.get(&provider).cloned())
    }

    pub fn clear(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.api_keys_guard()?.remove(&provider).is_some())
    }

    fn api_keys_guard(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.api_keys
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }
}

impl std::fmt::Debug for SecureCredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers = self
            .api_keys
            .lock()
            .map(|keys| keys.keys().copied().collect::<Vec<_>>())
            .unwrap_or_default();

        f.debug_struct("SecureCredentialManager")
            .field("providers", &providers)
            .finish()
    }
}
