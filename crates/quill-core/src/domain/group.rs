use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group entity - a named community posts may optionally belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub fn new(title: String, slug: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            slug,
            description,
        }
    }

    /// Slugs are non-empty runs of ASCII letters, digits, `-` and `_`.
    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}
