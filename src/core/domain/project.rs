//! Project types.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize as DeriveSerialize};
use zeroize::Zeroizing;

use crate::core::types::ProjectName;

/// A tenant boundary.
#[derive(Debug, Clone, PartialEq, Eq, DeriveSerialize, Deserialize)]
pub struct Project {
    pub name: ProjectName,
}

/// A project's row in the external project store.
#[derive(Debug, Clone, PartialEq, Eq, DeriveSerialize, Deserialize)]
pub struct ProjectEntry {
    pub name: ProjectName,
    /// Git repository holding the project's workflow manifests.
    pub repository: String,
}

/// A SecretID issued to a project, identified by its accessor.
///
/// The accessor names the SecretID for lookup and revocation without
/// revealing it.
#[derive(Debug, Clone, PartialEq, Eq, DeriveSerialize, Deserialize)]
pub struct ProjectToken {
    pub token_id: String,
}

/// The machine identity issued when a project or a project token is created.
///
/// This is the only copy the caller ever receives.
pub struct ProjectCredentials {
    role_id: String,
    secret_id: Zeroizing<String>,
    token_id: String,
}

impl ProjectCredentials {
    pub fn new(role_id: String, secret_id: String, token_id: String) -> Self {
        Self {
            role_id,
            secret_id: Zeroizing::new(secret_id),
            token_id,
        }
    }

    pub fn role_id(&self) -> &str {
        &self.role_id
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    /// Accessor of the SecretID, used to look it up or revoke it later.
    pub fn token_id(&self) -> &str {
        &self.token_id
    }
}

impl std::fmt::Debug for ProjectCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectCredentials")
            .field("role_id", &self.role_id)
            .field("secret_id", &"<redacted>")
            .field("token_id", &self.token_id)
            .finish()
    }
}

impl Serialize for ProjectCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProjectCredentials", 3)?;
        state.serialize_field("role_id", &self.role_id)?;
        state.serialize_field("secret_id", self.secret_id.as_str())?;
        state.serialize_field("token_id", &self.token_id)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ProjectCredentials {
        ProjectCredentials::new(
            "role-123".to_string(),
            "secret-456".to_string(),
            "acc-789".to_string(),
        )
    }

    #[test]
    fn test_credentials_serialize_all_ids() {
        let creds = credentials();
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["role_id"], "role-123");
        assert_eq!(json["secret_id"], "secret-456");
        assert_eq!(json["token_id"], "acc-789");
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("secret-456"));
        assert!(debug.contains("acc-789"));
    }

    #[test]
    fn test_project_token_json() {
        let token = ProjectToken {
            token_id: "acc-789".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            serde_json::json!({ "token_id": "acc-789" })
        );
    }
}
