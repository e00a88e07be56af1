//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use quill_core::domain::{Group, Post, User};
use quill_core::error::RepoError;
use quill_core::pagination::{Page, PageRequest, PageWindow};
use quill_core::ports::{GroupRepository, PostRepository, PostScope, UserRepository};

use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL group repository.
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_page(
        &self,
        scope: PostScope,
        request: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let query = match scope {
            PostScope::All => PostEntity::find(),
            PostScope::Group(group_id) => {
                PostEntity::find().filter(post::Column::GroupId.eq(group_id))
            }
            PostScope::Author(author_id) => {
                PostEntity::find().filter(post::Column::AuthorId.eq(author_id))
            }
        };

        let total = query.clone().count(&self.db).await.map_err(repo_error)?;
        let window = PageWindow::resolve(total, request);

        let rows = query
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .offset(window.offset())
            .limit(window.per_page)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        tracing::debug!(?scope, page = window.number, total, "Fetched post page");

        Ok(Page::from_window(
            window,
            rows.into_iter().map(Into::into).collect(),
        ))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(repo_error)
    }
}
