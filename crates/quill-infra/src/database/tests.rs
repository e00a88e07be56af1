use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use quill_core::domain::{Group, Post, User};
use quill_core::ports::{BaseRepository, GroupRepository, UserRepository};

use crate::database::entity::{group, post, user};
use crate::database::postgres_repo::{
    PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository,
};

fn post_model(author_id: Uuid, group_id: Option<Uuid>) -> post::Model {
    post::Model {
        id: Uuid::new_v4(),
        text: "Test post".to_owned(),
        pub_date: chrono::Utc::now().into(),
        author_id,
        group_id,
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let model = post_model(Uuid::new_v4(), None);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post: Post = repo.find_by_id(model.id).await.unwrap().unwrap();

    assert_eq!(post.id, model.id);
    assert_eq!(post.text, "Test post");
    assert_eq!(post.author_id, model.author_id);
    assert_eq!(post.group_id, None);
}

#[tokio::test]
async fn test_find_user_by_username() {
    let model = user::Model {
        id: Uuid::new_v4(),
        username: "VasiaBasov".to_owned(),
        password_hash: "hash".to_owned(),
        date_joined: chrono::Utc::now().into(),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let found: User = repo.find_by_username("VasiaBasov").await.unwrap().unwrap();
    assert_eq!(found.id, model.id);
    assert_eq!(found.username, "VasiaBasov");
}

#[tokio::test]
async fn test_find_group_by_slug_missing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<group::Model>::new()])
        .into_connection();

    let repo = PostgresGroupRepository::new(db);

    assert!(repo.find_by_slug("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_inserts_new_post() {
    let model = post_model(Uuid::new_v4(), Some(Uuid::new_v4()));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // existence check finds nothing
        .append_query_results([Vec::<post::Model>::new()])
        // INSERT ... RETURNING
        .append_query_results([vec![model.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let post: Post = model.clone().into();

    let saved: Post = repo.save(post.clone()).await.unwrap();

    assert_eq!(saved, post);
}

#[tokio::test]
async fn test_list_groups() {
    let models = vec![
        group::Model {
            id: Uuid::new_v4(),
            title: "Alpha".to_owned(),
            slug: "alpha".to_owned(),
            description: String::new(),
        },
        group::Model {
            id: Uuid::new_v4(),
            title: "Beta".to_owned(),
            slug: "beta".to_owned(),
            description: "second".to_owned(),
        },
    ];
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([models])
        .into_connection();

    let repo = PostgresGroupRepository::new(db);

    let groups: Vec<Group> = repo.list_all().await.unwrap();
    let slugs: Vec<&str> = groups.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, ["alpha", "beta"]);
}
