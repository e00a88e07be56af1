use chrono::{Duration, Utc};

use super::*;

async fn seed_user(store: &MemoryStore, username: &str) -> User {
    store
        .users()
        .save(User::new(username.to_string(), "hash".to_string()))
        .await
        .unwrap()
}

async fn seed_group(store: &MemoryStore, slug: &str) -> Group {
    store
        .groups()
        .save(Group::new(
            format!("Group {slug}"),
            slug.to_string(),
            String::new(),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_usernames_are_unique() {
    let store = MemoryStore::new();
    seed_user(&store, "VasiaBasov").await;

    let result = store
        .users()
        .save(User::new("VasiaBasov".to_string(), "hash".to_string()))
        .await;

    assert!(matches!(result, Err(RepoError::Constraint(_))));
}

#[tokio::test]
async fn test_slugs_are_unique() {
    let store = MemoryStore::new();
    seed_group(&store, "test").await;

    let result = store
        .groups()
        .save(Group::new(
            "Other".to_string(),
            "test".to_string(),
            String::new(),
        ))
        .await;

    assert!(matches!(result, Err(RepoError::Constraint(_))));
}

#[tokio::test]
async fn test_save_updates_in_place() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "VasiaBasov").await;
    let mut post = store
        .posts()
        .save(Post::new(author.id, "before".to_string(), None))
        .await
        .unwrap();

    post.text = "after".to_string();
    store.posts().save(post.clone()).await.unwrap();

    let stored = store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "after");
    assert_eq!(store.posts().count_by_author(author.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_post_requires_existing_author_and_group() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "VasiaBasov").await;

    let orphan = store
        .posts()
        .save(Post::new(Uuid::new_v4(), "text".to_string(), None))
        .await;
    assert!(matches!(orphan, Err(RepoError::Constraint(_))));

    let dangling = store
        .posts()
        .save(Post::new(author.id, "text".to_string(), Some(Uuid::new_v4())))
        .await;
    assert!(matches!(dangling, Err(RepoError::Constraint(_))));
}

#[tokio::test]
async fn test_find_page_is_newest_first_and_scoped() {
    let store = MemoryStore::new();
    let vasia = seed_user(&store, "VasiaBasov").await;
    let petr = seed_user(&store, "PetrBasov").await;
    let group = seed_group(&store, "test").await;

    let base = Utc::now();
    for (i, author) in [&vasia, &petr, &vasia].into_iter().enumerate() {
        let mut post = Post::new(author.id, format!("post {i}"), Some(group.id));
        post.pub_date = base + Duration::minutes(i as i64);
        store.posts().save(post).await.unwrap();
    }

    let all = store
        .posts()
        .find_page(PostScope::All, PageRequest::default())
        .await
        .unwrap();
    let texts: Vec<&str> = all.items.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, ["post 2", "post 1", "post 0"]);

    let by_vasia = store
        .posts()
        .find_page(PostScope::Author(vasia.id), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(by_vasia.total, 2);
    assert!(by_vasia.items.iter().all(|p| p.author_id == vasia.id));

    let in_group = store
        .posts()
        .find_page(PostScope::Group(group.id), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(in_group.total, 3);
}

#[tokio::test]
async fn test_pages_partition_posts_with_equal_timestamps() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "VasiaBasov").await;
    let stamp = Utc::now();

    let mut ids = Vec::new();
    for i in 0..14 {
        let mut post = Post::new(author.id, format!("post {i}"), None);
        post.pub_date = stamp;
        ids.push(store.posts().save(post).await.unwrap().id);
    }
    ids.reverse();

    let first = store
        .posts()
        .find_page(PostScope::All, PageRequest::new(Some(1)))
        .await
        .unwrap();
    let second = store
        .posts()
        .find_page(PostScope::All, PageRequest::new(Some(2)))
        .await
        .unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 4);
    let served: Vec<Uuid> = first
        .items
        .iter()
        .chain(second.items.iter())
        .map(|p| p.id)
        .collect();
    assert_eq!(served, ids);
}

#[tokio::test]
async fn test_deleting_user_cascades_to_posts() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "VasiaBasov").await;
    let other = seed_user(&store, "PetrBasov").await;
    store
        .posts()
        .save(Post::new(author.id, "mine".to_string(), None))
        .await
        .unwrap();
    store
        .posts()
        .save(Post::new(other.id, "theirs".to_string(), None))
        .await
        .unwrap();

    store.users().delete(author.id).await.unwrap();

    let remaining = store
        .posts()
        .find_page(PostScope::All, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(remaining.total, 1);
    assert_eq!(remaining.items[0].text, "theirs");
}

#[tokio::test]
async fn test_deleting_group_detaches_posts() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "VasiaBasov").await;
    let group = seed_group(&store, "test").await;
    let post = store
        .posts()
        .save(Post::new(author.id, "text".to_string(), Some(group.id)))
        .await
        .unwrap();

    store.groups().delete(group.id).await.unwrap();

    let stored = store.posts().find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.group_id, None);
}

#[tokio::test]
async fn test_delete_missing_row() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.posts().delete(Uuid::new_v4()).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_groups_listed_by_title() {
    let store = MemoryStore::new();
    seed_group(&store, "zeta").await;
    seed_group(&store, "alpha").await;

    let titles: Vec<String> = store
        .groups()
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.title)
        .collect();
    assert_eq!(titles, ["Group alpha", "Group zeta"]);
}
