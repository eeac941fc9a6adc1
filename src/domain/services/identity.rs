use std::sync::Arc;
use tracing::info;
use crate::domain::{
    models::{auth::IdentityClaims, user::User},
    ports::UserRepository,
};
use crate::error::AppError;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Maps verified identities and bare contact details onto local users.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Finds the user behind a verified token, provisioning one on first sight.
    /// A user previously provisioned by email is linked to the subject.
    pub async fn resolve(&self, claims: &IdentityClaims) -> Result<User, AppError> {
        if let Some(user) = self.users.find_by_external_uid(&claims.sub).await? {
            return Ok(user);
        }

        let email = claims.email.as_deref().map(normalize_email).filter(|e| !e.is_empty());
        if let Some(email) = &email {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.external_uid.is_none() {
                    info!(user_id = %existing.id, "Linking provisioned user to identity subject");
                    return self.users.link_external_uid(&existing.id, &claims.sub).await;
                }
                return Ok(existing);
            }
        }

        let user = User::from_identity(claims.sub.clone(), email.clone(), claims.name.clone(), claims.picture.clone());
        match self.users.create(&user).await {
            Ok(created) => {
                info!(user_id = %created.id, "Provisioned user from identity token");
                Ok(created)
            }
            // A concurrent request provisioned the same subject or email first.
            Err(e) if e.is_unique_violation() => {
                if let Some(user) = self.users.find_by_external_uid(&claims.sub).await? {
                    return Ok(user);
                }
                match &email {
                    Some(email) => self.users.find_by_email(email).await?.ok_or(e),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves a guest by email, creating a GUEST user when none exists.
    /// A name alone always provisions a fresh email-less guest.
    pub async fn find_or_provision_by_contact(&self, email: Option<&str>, name: Option<String>) -> Result<User, AppError> {
        let email = email.map(normalize_email).filter(|e| !e.is_empty());
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if email.is_none() && name.is_none() {
            return Err(AppError::Validation("Either an email or a name is required".into()));
        }
        if let Some(email) = &email {
            if let Some(user) = self.users.find_by_email(email).await? {
                return Ok(user);
            }
        }

        let user = User::new_guest(email.clone(), name);
        match self.users.create(&user).await {
            Ok(created) => {
                info!(user_id = %created.id, has_email = email.is_some(), "Provisioned guest from contact details");
                Ok(created)
            }
            Err(e) if e.is_unique_violation() => match &email {
                Some(email) => self.users.find_by_email(email).await?.ok_or(e),
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, user_id: &str) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}
