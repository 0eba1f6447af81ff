//! Redaction of tokens and keys before they reach logs.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SCRUBBER: LazyLock<Option<SecretScrubber>> = LazyLock::new(|| SecretScrubber::new().ok());

/// Redact credentials from text that is about to be logged or echoed back
pub fn scrub_secrets(message: &str) -> String {
    SCRUBBER
        .as_ref()
        .map_or_else(|| message.to_string(), |scrubber| scrubber.scrub_message(message))
}

/// Regex-based redaction of API keys, bearer tokens and secret-looking fields
#[derive(Clone)]
pub struct SecretScrubber {
    anthropic_key_pattern: Regex,
    bearer_pattern: Regex,
    field_pattern: Regex,
}

impl SecretScrubber {
    /// Compile the redaction patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            anthropic_key_pattern: Regex::new(r"sk-ant-[a-zA-Z0-9_-]{10,}")?,
            bearer_pattern: Regex::new(r"Bearer\s+[a-zA-Z0-9._~+/=-]+")?,
            field_pattern: Regex::new(
                r#"(?i)(["']?(?:api[_-]?key|access_token|client_secret|token|secret|password)["']?\s*[:=]\s*)["']?[^"'\s,}&]+["']?"#,
            )?,
        })
    }

    /// `message` with every secret replaced by a marker
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = self
            .anthropic_key_pattern
            .replace_all(message, "[API_KEY_REDACTED]");
        let scrubbed = self
            .bearer_pattern
            .replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        self.field_pattern
            .replace_all(&scrubbed, |caps: &Captures| format!("{}[REDACTED]", &caps[1]))
            .into_owned()
    }
}

impl std::fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}
