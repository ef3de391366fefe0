//! Identity token claims.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role. Stored as lowercase text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Invalid role: {other}")),
        }
    }
}

/// The identity fields a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// JWT claims carried by every identity token.
///
/// - `id`: User ID (subject)
/// - `username`, `email`, `role`: Identity at issue time
/// - `iss` / `aud`: Issuer and audience, checked on verification
/// - `exp` / `iat`: Expiry and issued-at Unix timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::User, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_claims_serialize_lowercase_role() {
        let claims = Claims {
            id: Uuid::nil(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Admin,
            iss: "inkwell-api".to_string(),
            aud: "inkwell-client".to_string(),
            exp: 1_900_000_000,
            iat: 1_800_000_000,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""role":"admin""#));
        assert!(serialized.contains(r#""id":"00000000-0000-0000-0000-000000000000""#));
    }
}
