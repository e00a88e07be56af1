use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Group, Post, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository.
///
/// Deleting a user deletes every post they authored.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Group repository.
///
/// Deleting a group detaches its posts instead of deleting them.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups ordered by title.
    async fn list_all(&self) -> Result<Vec<Group>, RepoError>;
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(Uuid),
    Author(Uuid),
}

/// Post repository. Listings are always newest-first by `pub_date`.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_page(&self, scope: PostScope, request: PageRequest)
    -> Result<Page<Post>, RepoError>;

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}
