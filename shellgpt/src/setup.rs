//! First-run key setup and key health checks.

use std::fmt;
use std::io::Write;

use anyhow::{Context, Result, bail};
use sgprovider::{OpenAiHttpTransport, SecretString};
use sgsearch::{SearchApiProvider, SearchErrorKind};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::ConfigManager;

pub const INVALID_KEY_MESSAGE: &str = "Invalid API key. Please check your key and try again.";

/// What a live check says about a configured key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Missing,
    Valid,
    Invalid,
    /// The check itself failed, so nothing is known about the key.
    Unverified(String),
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("not configured"),
            Self::Valid => f.write_str("valid"),
            Self::Invalid => f.write_str("invalid"),
            Self::Unverified(reason) => write!(f, "configured, could not verify ({reason})"),
        }
    }
}

/// Returns the configured OpenAI key, or asks for one on `input`.
///
/// A typed key is checked against the models endpoint first and saved only
/// when it is accepted. A stored key is trusted without a network round trip.
/// `input` is borrowed so the caller can keep reading from the same buffer.
pub async fn resolve_openai_api_key<R, W>(
    manager: &ConfigManager,
    transport: &OpenAiHttpTransport,
    input: &mut R,
    console: &mut W,
) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if let Some(api_key) = manager.load_api_key()? {
        return Ok(api_key);
    }

    write!(console, "Please enter your OpenAI API key: ")?;
    console.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .await
        .context("failed to read the API key")?;
    let api_key = line.trim();
    if api_key.is_empty() {
        bail!("API key is required");
    }

    writeln!(console, "Validating API key...")?;
    let accepted = transport
        .check_api_key(&SecretString::new(api_key))
        .await
        .map_err(|error| anyhow::anyhow!("could not validate the API key: {}", error.message))?;
    if !accepted {
        tracing::warn!(phase = "setup", event = "key_rejected", "typed OpenAI key was refused");
        bail!(INVALID_KEY_MESSAGE);
    }

    writeln!(console, "API key is valid")?;
    manager.save_api_key(api_key)?;
    writeln!(console, "OpenAI API key saved to {}", manager.config_file().display())?;
    Ok(api_key.to_string())
}

pub async fn openai_key_status(
    manager: &ConfigManager,
    transport: &OpenAiHttpTransport,
) -> Result<KeyStatus> {
    let Some(api_key) = manager.load_api_key()? else {
        return Ok(KeyStatus::Missing);
    };

    Ok(match transport.check_api_key(&SecretString::new(api_key)).await {
        Ok(true) => KeyStatus::Valid,
        Ok(false) => KeyStatus::Invalid,
        Err(error) => KeyStatus::Unverified(error.message),
    })
}

/// Runs the backend's validation query. Refusals and empty answers both
/// count as invalid; network failures leave the key unverified.
pub async fn search_key_status(search: Option<&SearchApiProvider>) -> KeyStatus {
    let Some(search) = search else {
        return KeyStatus::Missing;
    };

    match search.validate().await {
        Ok(()) => KeyStatus::Valid,
        Err(error) => match error.kind {
            SearchErrorKind::Authentication | SearchErrorKind::Api => KeyStatus::Invalid,
            _ => KeyStatus::Unverified(error.message),
        },
    }
}
