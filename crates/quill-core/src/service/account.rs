//! Registration and sign-in.

use std::sync::Arc;

use crate::domain::User;
use crate::error::{DomainError, RepoError};
use crate::forms::{LoginForm, SignupForm};
use crate::ports::{PasswordService, UserRepository};

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, passwords: Arc<dyn PasswordService>) -> Self {
        Self { users, passwords }
    }

    /// Validate the form and store the new user with a hashed password.
    pub async fn register(&self, form: &SignupForm) -> Result<User, DomainError> {
        form.validate(self.users.as_ref()).await?;

        let password_hash = self
            .passwords
            .hash(&form.password1)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = User::new(form.username.trim().to_string(), password_hash);
        let saved = match self.users.save(user).await {
            Ok(saved) => saved,
            Err(RepoError::Constraint(_)) => {
                return Err(DomainError::Duplicate(format!(
                    "user '{}' already exists",
                    form.username.trim()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %saved.id, username = %saved.username, "User registered");
        Ok(saved)
    }

    /// Check a username/password pair. Any mismatch is `Unauthorized`.
    pub async fn authenticate(&self, form: &LoginForm) -> Result<User, DomainError> {
        form.validate()?;

        let user = self
            .users
            .find_by_username(form.username.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = self
            .passwords
            .verify(&form.password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if !valid {
            tracing::debug!(username = %user.username, "Password mismatch");
            return Err(DomainError::Unauthorized);
        }

        Ok(user)
    }
}
