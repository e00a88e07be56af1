//! In-memory entity store - used when no database is configured, and by tests.
//!
//! All three repositories share one set of tables so that deleting a user or
//! a group can cascade to posts the same way the database schema does.
//! Note: Data is lost on process restart.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Group, Post, User};
use quill_core::error::RepoError;
use quill_core::pagination::{Page, PageRequest, paginate};
use quill_core::ports::{BaseRepository, GroupRepository, PostRepository, PostScope, UserRepository};

#[cfg(test)]
mod tests;

/// Rows kept in insertion order.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
}

/// Shared handle to the in-memory tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            store: self.clone(),
        }
    }

    pub fn groups(&self) -> InMemoryGroupRepository {
        InMemoryGroupRepository {
            store: self.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            store: self.clone(),
        }
    }
}

/// Insert `row`, or replace the row with the same id in place.
fn upsert<T: Clone>(rows: &mut Vec<T>, row: T, id_of: impl Fn(&T) -> Uuid) -> T {
    let id = id_of(&row);
    match rows.iter_mut().find(|r| id_of(r) == id) {
        Some(existing) => *existing = row.clone(),
        None => rows.push(row.clone()),
    }
    row
}

pub struct InMemoryUserRepository {
    store: MemoryStore,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;

        if tables
            .users
            .iter()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint(format!(
                "username '{}' is taken",
                user.username
            )));
        }

        Ok(upsert(&mut tables.users, user, |u| u.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;

        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(RepoError::NotFound);
        }

        // ON DELETE CASCADE
        tables.posts.retain(|p| p.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

pub struct InMemoryGroupRepository {
    store: MemoryStore,
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn save(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.store.tables.write().await;

        if tables
            .groups
            .iter()
            .any(|g| g.slug == group.slug && g.id != group.id)
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is taken",
                group.slug
            )));
        }

        Ok(upsert(&mut tables.groups, group, |g| g.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;

        let before = tables.groups.len();
        tables.groups.retain(|g| g.id != id);
        if tables.groups.len() == before {
            return Err(RepoError::NotFound);
        }

        // ON DELETE SET NULL
        for post in tables.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

pub struct InMemoryPostRepository {
    store: MemoryStore,
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;

        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                post.author_id
            )));
        }
        if let Some(group_id) = post.group_id {
            if !tables.groups.iter().any(|g| g.id == group_id) {
                return Err(RepoError::Constraint(format!(
                    "group {group_id} does not exist"
                )));
            }
        }

        Ok(upsert(&mut tables.posts, post, |p| p.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;

        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_page(
        &self,
        scope: PostScope,
        request: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let tables = self.store.tables.read().await;

        // Newest insertion first, then a stable sort keeps that order for
        // posts sharing a timestamp.
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .rev()
            .filter(|p| match scope {
                PostScope::All => true,
                PostScope::Group(id) => p.group_id == Some(id),
                PostScope::Author(id) => p.author_id == id,
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));

        Ok(paginate(posts, request))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .count() as u64)
    }
}
