//! Account registration, login and Google linking

use std::sync::Arc;

use slotwise_domain::{
    AccessToken, GoogleProfile, GoogleTokens, NewUser, Result, SlotwiseError, User,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::ports::{PasswordHasher, TokenService, UserRepository};
use crate::notifications::Notifier;

const BAD_CREDENTIALS: &str = "Incorrect email or password";

/// Scheduling slug: email local part plus four hex characters.
pub fn generate_scheduling_slug(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email).to_lowercase();
    let local: String =
        local.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '-' }).collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", local.trim_matches('-'), &suffix[..4])
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });
    if valid {
        Ok(email)
    } else {
        Err(SlotwiseError::InvalidInput(format!("Invalid email address: {email}")))
    }
}

/// Account use cases
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    notifier: Notifier,
}

impl UserService {
    /// Account service over a user store, password hashing and token signing.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        notifier: Notifier,
    ) -> Self {
        Self { users, hasher, tokens, notifier }
    }

    /// Register a password account and send its verification email
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> Result<User> {
        let email = normalize_email(email)?;
        if password.len() < 8 {
            return Err(SlotwiseError::InvalidInput(
                "Password must be at least 8 characters".into(),
            ));
        }
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(SlotwiseError::Conflict("Email already registered".into()));
        }

        let verification_token = Uuid::new_v4().simple().to_string();
        let user = self
            .users
            .create(NewUser {
                scheduling_slug: generate_scheduling_slug(&email),
                email,
                full_name,
                hashed_password: Some(self.hasher.hash(password)?),
                is_verified: false,
                verification_token: Some(verification_token.clone()),
                google_id: None,
            })
            .await?;

        if !self.notifier.verification(&user, &verification_token).await {
            warn!(user_id = user.id, "verification email not sent");
        }
        info!(user_id = user.id, "account registered");
        Ok(user)
    }

    /// Check a password login. Every failure reads as the same `Auth` error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| SlotwiseError::Auth(BAD_CREDENTIALS.into()))?;
        let hash = user
            .hashed_password
            .as_deref()
            .ok_or_else(|| SlotwiseError::Auth(BAD_CREDENTIALS.into()))?;
        if !self.hasher.verify(password, hash)? || !user.is_active {
            return Err(SlotwiseError::Auth(BAD_CREDENTIALS.into()));
        }
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        let user = self.authenticate(email, password).await?;
        self.issue_token(&user)
    }

    pub fn issue_token(&self, user: &User) -> Result<AccessToken> {
        self.tokens.issue(&user.email).map(AccessToken::bearer)
    }

    /// Resolve the active account behind a bearer token
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let email = self.tokens.verify(token)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| SlotwiseError::Auth("Could not validate credentials".into()))?;
        if !user.is_active {
            return Err(SlotwiseError::Auth("Inactive user".into()));
        }
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        self.users.get_by_id(id).await?.ok_or_else(|| SlotwiseError::NotFound(format!("User {id}")))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<User> {
        self.users
            .get_by_slug(slug)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| SlotwiseError::NotFound("User not found".into()))
    }

    pub async fn verify_email(&self, token: &str) -> Result<User> {
        let user = self
            .users
            .get_by_verification_token(token)
            .await?
            .ok_or_else(|| {
                SlotwiseError::InvalidInput("Invalid or expired verification token".into())
            })?;
        self.users.mark_verified(user.id).await?;
        self.get(user.id).await
    }

    /// Sign in with Google, creating the account on first use
    #[instrument(skip(self, tokens), fields(email = %profile.email))]
    pub async fn google_login(
        &self,
        profile: &GoogleProfile,
        tokens: &GoogleTokens,
    ) -> Result<User> {
        let existing = match self.users.get_by_google_id(&profile.id).await? {
            Some(user) => Some(user),
            None => self.users.get_by_email(&profile.email.to_lowercase()).await?,
        };
        let user = match existing {
            Some(user) => user,
            None => {
                let email = normalize_email(&profile.email)?;
                self.users
                    .create(NewUser {
                        scheduling_slug: generate_scheduling_slug(&email),
                        email,
                        full_name: profile.name.clone(),
                        hashed_password: None,
                        is_verified: true,
                        verification_token: None,
                        google_id: Some(profile.id.clone()),
                    })
                    .await?
            }
        };
        if !user.is_active {
            return Err(SlotwiseError::Auth("Inactive user".into()));
        }
        self.users.connect_google(user.id, Some(&profile.id), tokens).await?;
        self.get(user.id).await
    }

    /// Link calendar credentials to an existing account
    pub async fn connect_calendar(
        &self,
        user_id: i64,
        google_id: Option<&str>,
        tokens: &GoogleTokens,
    ) -> Result<User> {
        self.users.connect_google(user_id, google_id, tokens).await?;
        self.get(user_id).await
    }

    /// Drop stored Google tokens and mark the calendar disconnected
    pub async fn disconnect_calendar(&self, user_id: i64) -> Result<User> {
        self.users.disconnect_calendar(user_id, true).await?;
        self.get(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_uses_local_part_and_short_suffix() {
        let slug = generate_scheduling_slug("Jane.Doe@example.com");
        assert!(slug.starts_with("jane-doe-"));
        assert_eq!(slug.len(), "jane-doe-".len() + 4);
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(normalize_email("nobody").is_err());
        assert!(normalize_email("a@b").is_err());
        assert_eq!(normalize_email(" A@Example.com ").unwrap(), "a@example.com");
    }
}
