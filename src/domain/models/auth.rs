use serde::{Deserialize, Serialize};

/// Claims carried by an identity-provider token. Only `sub` is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// The resolved caller as seen by the access rules: a local user id plus the
/// email the identity provider vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: String,
    pub email: Option<String>,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self { user_id: user_id.into(), email }
    }
}

impl From<&crate::domain::models::user::User> for Viewer {
    fn from(user: &crate::domain::models::user::User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}
