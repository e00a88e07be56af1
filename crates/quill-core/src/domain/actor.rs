use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// The acting identity of a request: the authenticated user behind it.
///
/// Handlers receive it explicitly; anonymous requests carry no `Actor` at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub username: String,
}

impl Actor {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.username.clone())
    }
}
