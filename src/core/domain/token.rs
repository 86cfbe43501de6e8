//! Short-lived credential token.

use zeroize::Zeroizing;

/// Characters of a token that may appear in logs.
const VISIBLE_HEAD: usize = 8;

/// An access token minted for a single workflow submission.
///
/// TTL- and use-count-bounded by the backend. Never cached; wiped on drop.
pub struct CredentialToken(Zeroizing<String>);

impl CredentialToken {
    pub fn new(token: String) -> Self {
        Self(Zeroizing::new(token))
    }

    /// The raw token, for embedding into the execution environment.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// A loggable prefix of the token.
    pub fn head(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(VISIBLE_HEAD)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialToken({}...)", self.head())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_truncates() {
        let token = CredentialToken::new("hvs.CAESIJlongertokenbody".to_string());
        assert_eq!(token.head(), "hvs.CAES");
        assert_eq!(format!("{:?}", token), "CredentialToken(hvs.CAES...)");
    }

    #[test]
    fn test_head_of_short_token() {
        let token = CredentialToken::new("abc".to_string());
        assert_eq!(token.head(), "abc");
        assert_eq!(token.expose(), "abc");
    }
}
