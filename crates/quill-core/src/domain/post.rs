use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a short text published by its author, optionally in a group.
///
/// `author_id` and `pub_date` are fixed at creation; only `text` and
/// `group_id` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
}

impl Post {
    /// Create a new post stamped with the current time.
    pub fn new(author_id: Uuid, text: String, group_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            pub_date: Utc::now(),
            author_id,
            group_id,
        }
    }

    /// Replace the editable fields.
    pub fn revise(&mut self, text: String, group_id: Option<Uuid>) {
        self.text = text;
        self.group_id = group_id;
    }

    /// First `words` words of the text, with an ellipsis when truncated.
    pub fn excerpt(&self, words: usize) -> String {
        let mut parts = self.text.split_whitespace();
        let head: Vec<&str> = parts.by_ref().take(words).collect();
        if parts.next().is_some() {
            format!("{}…", head.join(" "))
        } else {
            head.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revise_keeps_author_and_date() {
        let author = Uuid::new_v4();
        let mut post = Post::new(author, "first".to_string(), None);
        let pub_date = post.pub_date;

        let group = Uuid::new_v4();
        post.revise("second".to_string(), Some(group));

        assert_eq!(post.text, "second");
        assert_eq!(post.group_id, Some(group));
        assert_eq!(post.author_id, author);
        assert_eq!(post.pub_date, pub_date);
    }

    #[test]
    fn test_excerpt() {
        let post = Post::new(Uuid::new_v4(), "one two three four".to_string(), None);
        assert_eq!(post.excerpt(2), "one two…");
        assert_eq!(post.excerpt(4), "one two three four");
    }
}
