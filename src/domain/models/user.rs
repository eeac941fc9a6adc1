use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::text_enum;

text_enum! {
    UserRole {
        Guest => "GUEST",
        Admin => "ADMIN",
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: String,
    pub external_uid: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// A guest provisioned from contact details alone (join or invitation by email).
    pub fn new_guest(email: Option<String>, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            external_uid: None,
            email,
            name,
            avatar_url: None,
            role: UserRole::Guest,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// A user first seen through a verified identity token.
    pub fn from_identity(external_uid: String, email: Option<String>, name: Option<String>, avatar_url: Option<String>) -> Self {
        Self {
            external_uid: Some(external_uid),
            avatar_url,
            ..Self::new_guest(email, name)
        }
    }
}

/// Public projection of a user embedded in other payloads.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}
