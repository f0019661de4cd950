use std::collections::HashSet;
use uuid::Uuid;

/// Access tokens accepted by the proxy endpoint.
///
/// Owned by the composition root and injected into the controllers that
/// need it; created once at startup and read-only afterwards. Besides the
/// configured long-lived tokens, one ephemeral token is generated per
/// process for URLs this service signs itself (intent responses).
#[derive(Debug)]
pub struct AccessTokens {
    configured: HashSet<String>,
    ephemeral: String,
}

impl AccessTokens {
    pub fn new(configured: &[String]) -> Self {
        Self {
            configured: configured.iter().cloned().collect(),
            ephemeral: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn is_valid(&self, token: &str) -> bool {
        !token.is_empty() && (token == self.ephemeral || self.configured.contains(token))
    }

    /// The process-local token used to sign intent playback URLs.
    pub fn ephemeral(&self) -> &str {
        &self.ephemeral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_configured_and_ephemeral_tokens() {
        let tokens = AccessTokens::new(&["alpha".to_string()]);
        assert!(tokens.is_valid("alpha"));
        assert!(tokens.is_valid(tokens.ephemeral()));
        assert!(!tokens.is_valid("beta"));
        assert!(!tokens.is_valid(""));
    }

    #[test]
    fn ephemeral_tokens_differ_per_instance() {
        let a = AccessTokens::new(&[]);
        let b = AccessTokens::new(&[]);
        assert_ne!(a.ephemeral(), b.ephemeral());
    }
}
