//! Authorization rule for post mutation.

use crate::domain::{Actor, Post};

/// Only the author may edit a post. There is no staff or admin override.
pub fn can_edit(actor: &Actor, post: &Post) -> bool {
    actor.user_id == post.author_id
}
