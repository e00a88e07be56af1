//! Posts, groups and the feeds built from them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Actor, Group, Post, User};
use crate::error::{DomainError, RepoError};
use crate::forms::{FormErrors, PostForm, form_errors};
use crate::pagination::{Page, PageRequest};
use crate::policy::can_edit;
use crate::ports::{GroupRepository, PostRepository, PostScope, UserRepository};

const DATE_FORMAT: &str = "%d %b %Y %H:%M";

/// A post together with what a listing shows about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
    pub published: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: User,
    pub page: Page<PostCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub card: PostCard,
    pub post_count: u64,
}

/// Result of submitting the new-post form.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Post),
    Invalid { form: PostForm, errors: FormErrors },
}

/// Result of visiting or submitting the edit form.
#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// The actor is not the author; nothing was changed.
    Refused(Post),
    /// Show the form, prefilled or with the rejected submission.
    Form {
        post: Post,
        form: PostForm,
        errors: FormErrors,
    },
    Saved(Post),
}

/// Blog operations over the entity store.
#[derive(Clone)]
pub struct BlogService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
}

impl BlogService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            users,
            groups,
            posts,
        }
    }

    /// Every post, newest first.
    pub async fn index(&self, request: PageRequest) -> Result<Page<PostCard>, DomainError> {
        let page = self.posts.find_page(PostScope::All, request).await?;
        self.cards(page).await
    }

    pub async fn group_feed(
        &self,
        slug: &str,
        request: PageRequest,
    ) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("group", slug))?;

        let page = self
            .posts
            .find_page(PostScope::Group(group.id), request)
            .await?;

        Ok(GroupFeed {
            page: self.cards(page).await?,
            group,
        })
    }

    pub async fn profile(
        &self,
        username: &str,
        request: PageRequest,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self.find_author(username).await?;
        let page = self
            .posts
            .find_page(PostScope::Author(author.id), request)
            .await?;

        Ok(ProfileFeed {
            page: self.cards(page).await?,
            author,
        })
    }

    /// A single post, addressed by its author's username and its id. A post
    /// that exists under a different author is reported as missing.
    pub async fn post_detail(
        &self,
        username: &str,
        post_id: Uuid,
    ) -> Result<PostDetail, DomainError> {
        let (author, post) = self.find_scoped(username, post_id).await?;
        let post_count = self.posts.count_by_author(author.id).await?;
        let group = self.group_of(&post).await?;

        Ok(PostDetail {
            card: card(post, author, group),
            post_count,
        })
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, DomainError> {
        Ok(self.groups.list_all().await?)
    }

    /// Publish a post as `actor`. The author is always the actor.
    pub async fn create_post(
        &self,
        actor: &Actor,
        form: PostForm,
    ) -> Result<CreateOutcome, DomainError> {
        let cleaned = match form.clean(self.groups.as_ref()).await {
            Ok(cleaned) => cleaned,
            Err(err) => {
                let errors = form_errors(err)?;
                return Ok(CreateOutcome::Invalid { form, errors });
            }
        };

        let post = Post::new(actor.user_id, cleaned.text, cleaned.group_id);
        let saved = self.posts.save(post).await?;

        tracing::info!(post_id = %saved.id, author = %actor.username, "Post created");
        Ok(CreateOutcome::Created(saved))
    }

    /// Show or apply the edit form for `username`'s post `post_id`.
    ///
    /// `submission` is `None` for a plain visit. Non-authors are refused
    /// without any change.
    pub async fn edit_post(
        &self,
        actor: &Actor,
        username: &str,
        post_id: Uuid,
        submission: Option<PostForm>,
    ) -> Result<EditOutcome, DomainError> {
        let (_, mut post) = self.find_scoped(username, post_id).await?;

        if !can_edit(actor, &post) {
            tracing::info!(%post_id, actor = %actor.username, "Edit refused for non-author");
            return Ok(EditOutcome::Refused(post));
        }

        let Some(form) = submission else {
            return Ok(EditOutcome::Form {
                form: PostForm::from_post(&post),
                post,
                errors: FormErrors::new(),
            });
        };

        match form.clean(self.groups.as_ref()).await {
            Ok(cleaned) => {
                post.revise(cleaned.text, cleaned.group_id);
                let saved = self.posts.save(post).await?;
                tracing::info!(%post_id, "Post updated");
                Ok(EditOutcome::Saved(saved))
            }
            Err(err) => Ok(EditOutcome::Form {
                errors: form_errors(err)?,
                post,
                form,
            }),
        }
    }

    /// Register a group. Used by the administration tooling.
    pub async fn create_group(
        &self,
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<Group, DomainError> {
        let mut errors = FormErrors::new();
        if title.trim().is_empty() {
            errors.add("title", crate::forms::REQUIRED);
        }
        if !Group::is_valid_slug(slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        errors.into_result()?;

        let group = Group::new(
            title.trim().to_string(),
            slug.to_string(),
            description.trim().to_string(),
        );

        match self.groups.save(group).await {
            Ok(saved) => Ok(saved),
            Err(RepoError::Constraint(_)) => Err(DomainError::Duplicate(format!(
                "group with slug '{slug}' already exists"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))
    }

    async fn find_scoped(&self, username: &str, post_id: Uuid) -> Result<(User, Post), DomainError> {
        let author = self.find_author(username).await?;
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .filter(|post| post.author_id == author.id)
            .ok_or_else(|| DomainError::not_found("post", post_id.to_string()))?;

        Ok((author, post))
    }

    async fn group_of(&self, post: &Post) -> Result<Option<Group>, DomainError> {
        match post.group_id {
            Some(id) => Ok(self.groups.find_by_id(id).await?),
            None => Ok(None),
        }
    }

    async fn cards(&self, mut page: Page<Post>) -> Result<Page<PostCard>, DomainError> {
        let mut authors: HashMap<Uuid, User> = HashMap::new();
        let mut groups: HashMap<Uuid, Option<Group>> = HashMap::new();
        let posts = std::mem::take(&mut page.items);
        let mut cards = Vec::with_capacity(posts.len());

        for post in posts {
            let author = match authors.get(&post.author_id) {
                Some(author) => author.clone(),
                None => {
                    let author = self.users.find_by_id(post.author_id).await?.ok_or_else(|| {
                        DomainError::Internal(format!(
                            "post {} references missing author {}",
                            post.id, post.author_id
                        ))
                    })?;
                    authors.insert(author.id, author.clone());
                    author
                }
            };

            let group = match post.group_id {
                None => None,
                Some(id) => match groups.get(&id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let group = self.groups.find_by_id(id).await?;
                        groups.insert(id, group.clone());
                        group
                    }
                },
            };

            cards.push(card(post, author, group));
        }

        Ok(page.with_items(cards))
    }
}

fn card(post: Post, author: User, group: Option<Group>) -> PostCard {
    PostCard {
        published: post.pub_date.format(DATE_FORMAT).to_string(),
        post,
        author,
        group,
    }
}
