//! Submitted form payloads and their validation.
//!
//! Forms deserialize straight from urlencoded bodies. Unknown fields (such as
//! a client-supplied `author`) are ignored.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Post;
use crate::error::DomainError;
use crate::ports::{GroupRepository, UserRepository};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";

/// Key under which errors not tied to a single field are stored.
pub const NON_FIELD: &str = "__all__";

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// First path segments owned by fixed routes; nobody may register them.
pub const RESERVED_USERNAMES: &[&str] = &["new", "group", "about", "auth", "health"];

/// Field-level validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise the errors as a domain error.
    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidForm(self))
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// The create/edit post form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<Uuid>,
}

impl PostForm {
    /// Prefill from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
        }
    }

    /// Validate the submission. Fails with [`DomainError::InvalidForm`] when a
    /// field is wrong; repository failures propagate as-is.
    pub async fn clean(&self, groups: &dyn GroupRepository) -> Result<CleanedPost, DomainError> {
        let mut errors = FormErrors::new();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(id) if groups.find_by_id(id).await?.is_some() => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            },
        };

        errors.into_result()?;

        Ok(CleanedPost {
            text: text.to_string(),
            group_id,
        })
    }
}

/// The sign-in form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = FormErrors::new();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()
    }
}

/// The registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl SignupForm {
    pub async fn validate(&self, users: &dyn UserRepository) -> Result<(), DomainError> {
        let mut errors = FormErrors::new();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
            );
        } else if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if is_reserved_username(username)
            || users.find_by_username(username).await?.is_some()
        {
            errors.add("username", "A user with that username already exists.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result()
    }
}

/// Route-owned segments, plus `.` and `..` which clients collapse out of
/// paths before sending them.
fn is_reserved_username(username: &str) -> bool {
    matches!(username, "." | "..")
        || RESERVED_USERNAMES.contains(&username.to_lowercase().as_str())
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Pull the field errors out of a domain error, passing anything else through.
pub fn form_errors(err: DomainError) -> Result<FormErrors, DomainError> {
    match err {
        DomainError::InvalidForm(errors) => Ok(errors),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Group, User};
    use crate::error::RepoError;
    use crate::ports::BaseRepository;
    use async_trait::async_trait;

    struct FixedGroups(Vec<Group>);

    #[async_trait]
    impl BaseRepository<Group, Uuid> for FixedGroups {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
            Ok(self.0.iter().find(|g| g.id == id).cloned())
        }

        async fn save(&self, entity: Group) -> Result<Group, RepoError> {
            Ok(entity)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl GroupRepository for FixedGroups {
        async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
            Ok(self.0.iter().find(|g| g.slug == slug).cloned())
        }

        async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
            Ok(self.0.clone())
        }
    }

    struct FixedUsers(Vec<User>);

    #[async_trait]
    impl BaseRepository<User, Uuid> for FixedUsers {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
            Ok(self.0.iter().find(|u| u.id == id).cloned())
        }

        async fn save(&self, entity: User) -> Result<User, RepoError> {
            Ok(entity)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl UserRepository for FixedUsers {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
            Ok(self.0.iter().find(|u| u.username == username).cloned())
        }
    }

    fn test_group() -> Group {
        Group::new(
            "Test group".to_string(),
            "test".to_string(),
            "Description".to_string(),
        )
    }

    #[tokio::test]
    async fn test_post_form_accepts_text_and_group() {
        let group = test_group();
        let groups = FixedGroups(vec![group.clone()]);
        let form = PostForm {
            text: "  Hello world  ".to_string(),
            group: Some(group.id.to_string()),
        };

        let cleaned = form.clean(&groups).await.unwrap();

        assert_eq!(cleaned.text, "Hello world");
        assert_eq!(cleaned.group_id, Some(group.id));
    }

    #[tokio::test]
    async fn test_post_form_empty_group_means_none() {
        let groups = FixedGroups(vec![]);
        let form = PostForm {
            text: "Hello".to_string(),
            group: Some(String::new()),
        };

        let cleaned = form.clean(&groups).await.unwrap();
        assert_eq!(cleaned.group_id, None);
    }

    #[tokio::test]
    async fn test_post_form_rejects_blank_text_and_unknown_group() {
        let groups = FixedGroups(vec![test_group()]);
        let form = PostForm {
            text: "   ".to_string(),
            group: Some(Uuid::new_v4().to_string()),
        };

        let errors = form_errors(form.clean(&groups).await.unwrap_err()).unwrap();

        assert_eq!(errors.get("text"), [REQUIRED.to_string()]);
        assert_eq!(errors.get("group"), [INVALID_CHOICE.to_string()]);
    }

    #[tokio::test]
    async fn test_post_form_rejects_malformed_group() {
        let groups = FixedGroups(vec![test_group()]);
        let form = PostForm {
            text: "Hello".to_string(),
            group: Some("not-an-id".to_string()),
        };

        let errors = form_errors(form.clean(&groups).await.unwrap_err()).unwrap();
        assert!(errors.has("group"));
        assert!(!errors.has("text"));
    }

    #[tokio::test]
    async fn test_signup_form_rules() {
        let taken = User::new("VasiaBasov".to_string(), "hash".to_string());
        let users = FixedUsers(vec![taken]);

        let ok = SignupForm {
            username: "PetrBasov".to_string(),
            password1: "long-enough".to_string(),
            password2: "long-enough".to_string(),
        };
        assert!(ok.validate(&users).await.is_ok());

        let bad = SignupForm {
            username: "VasiaBasov".to_string(),
            password1: "short".to_string(),
            password2: "other".to_string(),
        };
        let errors = form_errors(bad.validate(&users).await.unwrap_err()).unwrap();
        assert!(errors.has("username"));
        assert!(errors.has("password1"));
        assert!(errors.has("password2"));
    }

    #[tokio::test]
    async fn test_signup_rejects_reserved_and_malformed_usernames() {
        let users = FixedUsers(vec![]);

        for username in ["new", "Group", ".", "..", "has space", "semi;colon"] {
            let form = SignupForm {
                username: username.to_string(),
                password1: "long-enough".to_string(),
                password2: "long-enough".to_string(),
            };
            let errors = form_errors(form.validate(&users).await.unwrap_err()).unwrap();
            assert!(errors.has("username"), "{username} accepted");
        }
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        let errors = form_errors(LoginForm::default().validate().unwrap_err()).unwrap();
        assert!(errors.has("username"));
        assert!(errors.has("password"));
    }
}
