//! Authenticated user identity.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;
use super::status::Role;

/// The user a session belongs to.
///
/// Serialized with camelCase names (`firstName`, `lastName`) as issued by the
/// auth endpoints and persisted under the `user` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Missing roles mean a regular user.
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    /// "First Last", or the email when both names are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.to_string()
        } else {
            name.to_owned()
        }
    }

    /// Whether this identity may use the admin catalog.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_without_role_is_user() {
        let identity: Identity = serde_json::from_value(json!({
            "id": "user-1",
            "email": "jane@example.com",
            "firstName": "Jane",
            "lastName": "Doe"
        }))
        .unwrap();
        assert_eq!(identity.role, Role::User);
        assert!(!identity.is_admin());
        assert_eq!(identity.display_name(), "Jane Doe");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let identity = Identity {
            id: UserId::new("u"),
            email: Email::parse("x@example.com").unwrap(),
            first_name: " ".to_string(),
            last_name: String::new(),
            phone: None,
            role: Role::Admin,
        };
        assert_eq!(identity.display_name(), "x@example.com");
        assert!(identity.is_admin());
    }
}
