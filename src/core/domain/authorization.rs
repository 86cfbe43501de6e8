//! Caller authorization.
//!
//! Parses the `provider:key:secret` header and classifies the caller as the
//! admin or as a project machine identity.

use std::fmt;
use std::str::FromStr;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::core::constants::ADMIN_KEY;
use crate::error::{Error, Result};

/// Credential backends a caller can authenticate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Vault,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vault => "vault",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vault" => Ok(Self::Vault),
            other => Err(Error::AuthorizationMalformed(format!(
                "unknown provider '{}', provider must be vault",
                other
            ))),
        }
    }
}

/// A parsed authorization header.
///
/// Never persisted. The secret is wiped from memory on drop.
pub struct Authorization {
    provider: ProviderKind,
    key: String,
    secret: Zeroizing<String>,
}

impl Authorization {
    /// Parse a `provider:key:secret` header.
    ///
    /// Only the first two colons split; the secret may contain colons. All
    /// three segments must be non-empty.
    pub fn parse(header: &str) -> Result<Self> {
        let mut parts = header.splitn(3, ':');
        let provider = parts.next().unwrap_or_default();
        let key = parts.next().unwrap_or_default();
        let secret = parts.next().unwrap_or_default();

        if provider.is_empty() || key.is_empty() || secret.is_empty() {
            return Err(Error::AuthorizationMalformed(
                "expected three non-empty segments 'provider:key:secret'".to_string(),
            ));
        }

        Ok(Self {
            provider: provider.parse()?,
            key: key.to_string(),
            secret: Zeroizing::new(secret.to_string()),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// The key segment; a RoleID for project identities.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The secret segment; a SecretID for project identities.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// True when the key is `admin` and the secret matches `admin_secret`.
    ///
    /// The secret comparison runs in constant time.
    pub fn is_admin(&self, admin_secret: &str) -> bool {
        self.key == ADMIN_KEY && bool::from(self.secret.as_bytes().ct_eq(admin_secret.as_bytes()))
    }

    /// Fail with `NotAuthorizedAdmin` unless this is the admin identity.
    pub fn require_admin(&self, admin_secret: &str) -> Result<()> {
        if self.is_admin(admin_secret) {
            Ok(())
        } else {
            Err(Error::NotAuthorizedAdmin)
        }
    }

    /// Classify this caller.
    pub fn identity(&self, admin_secret: &str) -> Identity<'_> {
        if self.is_admin(admin_secret) {
            Identity::Admin
        } else {
            Identity::Project {
                role_id: &self.key,
                secret_id: &self.secret,
            }
        }
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorization")
            .field("provider", &self.provider)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Who is calling.
#[derive(Debug, PartialEq, Eq)]
pub enum Identity<'a> {
    Admin,
    /// A machine identity, forwarded opaquely to the credential provider.
    Project { role_id: &'a str, secret_id: &'a str },
}
