//! User domain models and DTOs.
//!
//! [`User`] is the public shape of an account and never carries the password
//! hash. Code that needs the hash (login, password changes) asks the store
//! for [`UserCredentials`] instead.

use chrono::{DateTime, Utc};
use inkwell_auth::{Role, TokenSubject};
use inkwell_core::PaginationMeta;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::UserId;

/// A user account as seen by the rest of the application.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn token_subject(&self) -> TokenSubject {
        TokenSubject {
            id: self.id.into_inner(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

// `role` is stored as text and parsed here, so the auth crate stays free of
// database concerns.
impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role.parse().map_err(|e: String| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            role,
            is_active: row.try_get("is_active")?,
            bio: row.try_get("bio")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A user together with the stored password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl<'r> FromRow<'r, PgRow> for UserCredentials {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user: User::from_row(row)?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

/// Everything needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
}

/// Usernames are 3 to 30 characters of ASCII letters, digits and underscores.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("Username can only contain letters, numbers and underscores".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 3, max = 30), custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
}

impl From<UpdateUserDto> for UserChanges {
    fn from(dto: UpdateUserDto) -> Self {
        Self {
            username: dto.username,
            email: dto.email.map(|e| e.to_lowercase()),
            bio: dto.bio,
        }
    }
}

/// What other people see of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            bio: user.bio,
            created_at: user.created_at,
        }
    }
}

/// Profile response: the full record for the owner and admins, the public
/// subset for everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UserProfile {
    Full(User),
    Public(PublicUser),
}

impl UserProfile {
    pub fn for_viewer(user: User, viewer: Option<&User>) -> Self {
        match viewer {
            Some(v) if v.is_admin() || v.id == user.id => Self::Full(user),
            _ => Self::Public(user.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusDto {
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleDto {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}
