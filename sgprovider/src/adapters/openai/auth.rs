use crate::{ProviderError, ProviderId, SecretString, SecureCredentialManager};

impl SecureCredentialManager {
    /// Stores the OpenAI key. Keys without the usual `sk-` prefix are kept,
    /// but logged, since compatible gateways issue other formats.
    pub fn set_openai_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        let api_key = api_key.into();
        if !looks_like_openai_key(&api_key) {
            tracing::warn!(phase = "provider", event = "unusual_api_key", "OpenAI API key does not start with 'sk-'");
        }

        self.set_api_key(ProviderId::OpenAi, api_key)
    }
}

pub(crate) fn looks_like_openai_key(api_key: &str) -> bool {
    api_key.trim().starts_with("sk-")
}

pub(crate) fn resolve_openai_key(
    credentials: &SecureCredentialManager,
) -> Result<SecretString, ProviderError> {
    credentials
        .api_key(ProviderId::OpenAi)?
        .ok_or_else(|| ProviderError::authentication("no OpenAI API key configured"))
}
