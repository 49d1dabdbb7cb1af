use chrono::Utc;

use blogsite_store::app_state::AppState;
use blogsite_store::config::Config;
use blogsite_store::core::strong_types::{DocumentId, UserId};
use blogsite_store::error::AppError;
use blogsite_store::models::{
    LikeOutcome, NewComment, NewPost, NotificationReference, NotificationType, PageRequest,
};

const CATEGORY: &str = "Technology and Innovation";

fn new_post(category_id: &DocumentId, title: &str, content: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: content.to_string(),
        category_id: category_id.clone(),
        author_id: UserId(42),
        author_name: "Grace Hopper".to_string(),
        tag_ids: Vec::new(),
        publish: true,
    }
}

#[tokio::test]
async fn test_publish_comment_like_and_read() {
    let state = AppState::in_memory().await.unwrap();

    let category = state.categories.create(CATEGORY, None).await.unwrap();
    let tag = state.tags.get_or_create("compilers").await.unwrap();

    let mut input = new_post(
        &category.id,
        "Writing a compiler in a weekend",
        "<p>Lexing, parsing and code generation</p>",
    );
    input.tag_ids = vec![tag.id.clone(), tag.id.clone()];
    let post = state.posts.create(input).await.unwrap();
    assert_eq!(post.tag_ids, vec![tag.id.clone()]);

    let category = state.categories.get(&category.id).await.unwrap();
    assert_eq!(category.post_ids, vec![post.id.clone()]);
    assert_eq!(category.post_count, 1);
    assert_eq!(state.tags.get(&tag.id).await.unwrap().post_count, 1);

    // Comment thread
    let root = state
        .comments
        .add(NewComment {
            post_id: post.id.clone(),
            author_id: UserId(7),
            author_name: Some("Linus".to_string()),
            content: "Great read".to_string(),
            parent_comment_id: None,
        })
        .await
        .unwrap();
    state
        .comments
        .add(NewComment {
            post_id: post.id.clone(),
            author_id: UserId(42),
            author_name: None,
            content: "Thanks!".to_string(),
            parent_comment_id: Some(root.id.clone()),
        })
        .await
        .unwrap();

    let threads = state.comments.threads(&post.id).await.unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].total(), 2);

    // Likes are unique per user and post
    assert!(state.likes.like(UserId(7), &post.id).await.unwrap().is_liked());
    assert_eq!(state.likes.like(UserId(7), &post.id).await.unwrap(), LikeOutcome::AlreadyLiked);
    assert!(state.likes.has_liked(UserId(7), &post.id).await.unwrap());

    state.posts.record_view(&post.id).await.unwrap();

    let blog = state.blogs.blog(&post.id).await.unwrap();
    assert_eq!(blog.blog_name, "Writing a compiler in a weekend");
    assert_eq!(blog.category, CATEGORY);
    assert_eq!(blog.word_count, 5);
    assert_eq!(blog.like_count, 1);
    assert_eq!(blog.comment_count, 2);
    assert_eq!(blog.view_count, 1);
    assert_eq!(blog.author.author_id, UserId(42));

    let page = state.blogs.blogs_by_category(CATEGORY, PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].post_id, post.id);

    let found = state.blogs.search("parsing", PageRequest::default()).await.unwrap();
    assert_eq!(found.total_elements, 1);

    // Cascade delete leaves no dangling references
    assert!(state.posts.delete(&post.id).await.unwrap());
    assert!(state.likes.likes_for_post(&post.id).await.unwrap().is_empty());
    assert!(state.comments.threads(&post.id).await.unwrap().is_empty());
    let category = state.categories.get(&category.id).await.unwrap();
    assert!(category.post_ids.is_empty());
    assert_eq!(category.post_count, 0);
    assert!(matches!(state.blogs.blog(&post.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_post_requires_existing_category() {
    let state = AppState::in_memory().await.unwrap();
    let err = state
        .posts
        .create(new_post(&DocumentId::new("missing"), "A post without any category", "body"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_short_category_name_is_rejected() {
    let state = AppState::in_memory().await.unwrap();
    assert!(matches!(
        state.categories.create("Tech", None).await,
        Err(AppError::Validation(_))
    ));

    state.categories.create(CATEGORY, None).await.unwrap();
    assert!(matches!(
        state.categories.create(CATEGORY, None).await,
        Err(AppError::AlreadyExists(_))
    ));
    assert!(matches!(
        state.categories.create(&CATEGORY.to_lowercase(), None).await,
        Err(AppError::AlreadyExists(_))
    ));
    assert!(matches!(
        state.categories.create("  TECHNOLOGY AND INNOVATION ", None).await,
        Err(AppError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn test_drafts_are_hidden_from_readers() {
    let state = AppState::in_memory().await.unwrap();
    let category = state.categories.create(CATEGORY, None).await.unwrap();

    let mut draft = new_post(&category.id, "Draft about distributed systems", "not ready");
    draft.publish = false;
    let draft = state.posts.create(draft).await.unwrap();

    assert!(matches!(state.blogs.blog(&draft.id).await, Err(AppError::NotFound(_))));
    let page = state.blogs.blogs_by_category(CATEGORY, PageRequest::default()).await.unwrap();
    assert_eq!(page.total_elements, 0);

    state.posts.publish(&draft.id).await.unwrap();
    state.blogs.blog(&draft.id).await.unwrap();
}

#[tokio::test]
async fn test_category_pagination() {
    let state = AppState::in_memory().await.unwrap();
    let category = state.categories.create(CATEGORY, None).await.unwrap();
    for i in 0..25 {
        state
            .posts
            .create(new_post(&category.id, &format!("Numbered article number {:02}", i), "body"))
            .await
            .unwrap();
    }

    let first = state.blogs.blogs_by_category(CATEGORY, PageRequest::new(0, 10)).await.unwrap();
    assert_eq!(first.content.len(), 10);
    assert_eq!(first.total_elements, 25);
    assert_eq!(first.total_pages, 3);
    assert!(first.first);
    assert!(!first.last);

    let last = state.blogs.blogs_by_category(CATEGORY, PageRequest::new(2, 10)).await.unwrap();
    assert_eq!(last.content.len(), 5);
    assert!(last.last);

    let beyond = state.blogs.blogs_by_category(CATEGORY, PageRequest::new(5, 10)).await.unwrap();
    assert!(beyond.content.is_empty());
    assert_eq!(beyond.total_elements, 25);

    let everything = state.blogs.blogs_by_category("all", PageRequest::new(0, 100)).await.unwrap();
    assert_eq!(everything.content.len(), 25);

    let far = state
        .blogs
        .blogs_by_category(CATEGORY, PageRequest::from_params(Some(i64::MAX), Some(10)))
        .await
        .unwrap();
    assert!(far.content.is_empty());
    assert_eq!(far.total_elements, 25);

    let unknown = state
        .blogs
        .blogs_by_category("No category has this name", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(unknown.total_elements, 0);
}

#[tokio::test]
async fn test_date_range_query() {
    let state = AppState::in_memory().await.unwrap();
    let category = state.categories.create(CATEGORY, None).await.unwrap();
    state
        .posts
        .create(new_post(&category.id, "Written today and found today", "body"))
        .await
        .unwrap();

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let page = state
        .blogs
        .blogs_by_category_and_dates(CATEGORY, &today, &today, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_elements, 1);

    let page = state
        .blogs
        .blogs_by_category_and_dates(CATEGORY, "2000-01-01", "2000-12-31", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_elements, 0);

    assert!(matches!(
        state
            .blogs
            .blogs_by_category_and_dates(CATEGORY, "01/02/2024", &today, PageRequest::default())
            .await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn test_concurrent_likes_record_one() {
    let state = AppState::in_memory().await.unwrap();
    let category = state.categories.create(CATEGORY, None).await.unwrap();
    let post = state
        .posts
        .create(new_post(&category.id, "Everyone likes this article", "body"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let likes = state.likes.clone();
            let post_id = post.id.clone();
            tokio::spawn(async move { likes.like(UserId(5), &post_id).await })
        })
        .collect();

    let mut liked = 0;
    for result in futures::future::join_all(handles).await {
        if result.unwrap().unwrap().is_liked() {
            liked += 1;
        }
    }
    assert_eq!(liked, 1);
    assert_eq!(state.likes.count_for_post(&post.id).await.unwrap(), 1);
    assert_eq!(state.posts.get(&post.id).await.unwrap().like_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_on_file_database_keep_counts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::in_memory();
    config.database.url = format!("sqlite://{}", dir.path().join("blogsite.db").display());
    config.database.max_connections = 8;
    let state = AppState::new(config).await.unwrap();

    let category = state.categories.create(CATEGORY, None).await.unwrap();
    let post = state
        .posts
        .create(new_post(&category.id, "A crowd likes this article", "body"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..64)
        .map(|user| {
            let likes = state.likes.clone();
            let post_id = post.id.clone();
            tokio::spawn(async move { likes.like(UserId(user), &post_id).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert!(result.unwrap().unwrap().is_liked());
    }

    let post = state.posts.get(&post.id).await.unwrap();
    assert_eq!(post.like_count, 64);
    assert_eq!(post.like_ids.len(), 64);
    assert_eq!(state.likes.count_for_post(&post.id).await.unwrap(), 64);
}

#[tokio::test]
async fn test_notification_feed() {
    let state = AppState::in_memory().await.unwrap();
    let user = UserId(11);

    let first = state
        .notifications
        .notify(
            user,
            NotificationType::Like,
            "Someone liked your post",
            Some(NotificationReference::Post(DocumentId::new("p1"))),
        )
        .await
        .unwrap();
    state
        .notifications
        .notify(user, NotificationType::System, "Welcome aboard", None)
        .await
        .unwrap();
    state
        .notifications
        .notify(UserId(12), NotificationType::Follow, "New follower", Some(NotificationReference::User(user)))
        .await
        .unwrap();

    let feed = state.notifications.feed(user, PageRequest::default()).await.unwrap();
    assert_eq!(feed.total_elements, 2);
    assert_eq!(state.notifications.unread_count(user).await.unwrap(), 2);

    assert!(state.notifications.mark_read(&first.id).await.unwrap());
    assert_eq!(state.notifications.unread_count(user).await.unwrap(), 1);
    assert_eq!(state.notifications.mark_all_read(user).await.unwrap(), 1);
    assert_eq!(state.notifications.unread_count(user).await.unwrap(), 0);

    let likes = state.notifications.by_type(user, NotificationType::Like).await.unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0].reference, Some(NotificationReference::Post(DocumentId::new("p1"))));
}

#[tokio::test]
async fn test_reconcile_repairs_drifted_counters() {
    let state = AppState::in_memory().await.unwrap();
    let category = state.categories.create(CATEGORY, None).await.unwrap();
    let post = state
        .posts
        .create(new_post(&category.id, "Counters drift, reconciliation fixes", "body"))
        .await
        .unwrap();
    state.likes.like(UserId(1), &post.id).await.unwrap();

    state
        .store
        .update(
            blogsite_store::ent_schema::Collection::Posts,
            &post.id,
            &[blogsite_store::infrastructure::Update::set("like_count", 9)],
        )
        .await
        .unwrap();

    let report = state.posts.reconcile_all().await.unwrap();
    assert_eq!(report.posts_repaired, 1);
    assert_eq!(state.posts.get(&post.id).await.unwrap().like_count, 1);

    let again = state.posts.reconcile_all().await.unwrap();
    assert_eq!(again.posts_repaired, 0);
}
