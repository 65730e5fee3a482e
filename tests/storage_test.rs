//! Storage facade against real databases.
//!
//! SQLite tests run against a file in a temporary directory. MySQL tests are
//! skipped unless TEST_MYSQL_HOST and TEST_MYSQL_DB are set.

use std::time::Duration;

use sqlx::any::AnyRow;
use sqlx::FromRow;
use storekeep::{
    Changes, Context, Fields, Filter, Model, Query, Relation, SqlConfig, SqlStorage, Storage,
    StorageError, Value,
};
use tokio_test::{assert_err, assert_ok};

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Clone, PartialEq, FromRow)]
struct Comment {
    id: i64,
    post_id: i64,
    body: String,
}

impl Model for Comment {
    const TABLE: &'static str = "comments";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Fields {
        Fields::new()
            .with("post_id", self.post_id)
            .with("body", self.body.as_str())
    }
}

static POST_RELATIONS: &[Relation] = &[Relation::has_many("comments", "comments", "post_id")];

#[derive(Debug, Clone, PartialEq, FromRow)]
struct Post {
    id: i64,
    title: String,
    views: i64,
    #[sqlx(skip)]
    comments: Vec<Comment>,
}

impl Post {
    fn new(title: &str, views: i64) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            views,
            comments: Vec::new(),
        }
    }
}

impl Model for Post {
    const TABLE: &'static str = "posts";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Fields {
        Fields::new()
            .with("title", self.title.as_str())
            .with("views", self.views)
    }

    fn relations() -> &'static [Relation] {
        POST_RELATIONS
    }

    fn attach(&mut self, relation: &str, rows: &[AnyRow]) -> Result<(), sqlx::Error> {
        if relation == "comments" {
            self.comments = rows
                .iter()
                .map(|row| Comment::from_row(row))
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }
}

/// Reads `posts` but reports a key that disagrees with the `id` column.
#[derive(Debug, FromRow)]
struct SkewedPost {
    id: i64,
    title: String,
}

impl Model for SkewedPost {
    const TABLE: &'static str = "posts";

    fn id(&self) -> i64 {
        self.id * 10
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Fields {
        Fields::new().with("title", self.title.as_str())
    }
}

static TAGGED_POST_RELATIONS: &[Relation] = &[Relation::has_many("tags", "tags", "post_id")];

/// Reads `posts` and declares a relation whose table does not exist.
#[derive(Debug, FromRow)]
struct TaggedPost {
    id: i64,
    title: String,
}

impl Model for TaggedPost {
    const TABLE: &'static str = "posts";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Fields {
        Fields::new().with("title", self.title.as_str())
    }

    fn relations() -> &'static [Relation] {
        TAGGED_POST_RELATIONS
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn sqlite_storage() -> (tempfile::TempDir, SqlStorage) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("storekeep=debug")
        .try_init();

    let dir = tempfile::tempdir().unwrap();
    let cfg = SqlConfig::builder()
        .engine("sqlite3")
        .database(dir.path().join("storage.db").to_string_lossy())
        .max_open_conns(4)
        .build()
        .unwrap();
    let storage = SqlStorage::new(storekeep::open(&cfg).await.unwrap());

    let pool = storage.client().pool();
    sqlx::query(
        "CREATE TABLE posts (\
         id INTEGER PRIMARY KEY AUTOINCREMENT, \
         title TEXT NOT NULL, \
         views INTEGER NOT NULL DEFAULT 0)",
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TABLE comments (\
         id INTEGER PRIMARY KEY AUTOINCREMENT, \
         post_id INTEGER NOT NULL, \
         body TEXT NOT NULL)",
    )
    .execute(pool)
    .await
    .unwrap();

    (dir, storage)
}

async fn seed_posts(storage: &SqlStorage, ctx: &Context, count: i64) -> Vec<Post> {
    let mut posts = Vec::new();
    for i in 1..=count {
        let mut post = Post::new(&format!("post {i}"), i % 3);
        storage.create(ctx, &mut post).await.unwrap();
        posts.push(post);
    }
    posts
}

async fn add_comment(storage: &SqlStorage, ctx: &Context, post_id: i64, body: &str) -> Comment {
    let mut comment = Comment {
        id: 0,
        post_id,
        body: body.to_string(),
    };
    storage.create(ctx, &mut comment).await.unwrap();
    comment
}

// =============================================================================
// Create / Get
// =============================================================================

#[tokio::test]
async fn test_create_assigns_id_and_get_round_trips() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background().with_trace_id("trace-create");

    let mut post = Post::new("hello", 7);
    assert_ok!(storage.create(&ctx, &mut post).await);
    assert!(post.id > 0);

    let loaded: Post = storage.get(&ctx, post.id).await.unwrap();
    assert_eq!(loaded, post);
}

#[tokio::test]
async fn test_create_assigns_distinct_generated_ids() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let mut first = Post::new("first", 0);
    let mut second = Post::new("second", 0);
    storage.create(&ctx, &mut first).await.unwrap();
    storage.create(&ctx, &mut second).await.unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    let comment = add_comment(&storage, &ctx, second.id, "child").await;
    assert_eq!(comment.id, 1);
    let loaded: Comment = storage.get(&ctx, comment.id).await.unwrap();
    assert_eq!(loaded, comment);
}

#[tokio::test]
async fn test_get_rejects_mismatched_key_mapping() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 1).await;

    let result = storage.get::<SkewedPost>(&ctx, 1).await;
    assert!(matches!(result, Err(StorageError::InvalidQuery(_))));
}

#[tokio::test]
async fn test_create_with_explicit_id() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let mut post = Post::new("fixed", 1);
    post.id = 42;
    storage.create(&ctx, &mut post).await.unwrap();
    assert_eq!(post.id, 42);

    let loaded: Post = storage.get(&ctx, 42).await.unwrap();
    assert_eq!(loaded.title, "fixed");
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let err = storage.get::<Post>(&ctx, 999).await.unwrap_err();
    assert!(matches!(err, StorageError::RecordNotFound));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_non_positive_id_is_rejected() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    assert!(matches!(
        storage.get::<Post>(&ctx, 0).await,
        Err(StorageError::InvalidId(0))
    ));
    assert!(matches!(
        storage.delete::<Post>(&ctx, -3).await,
        Err(StorageError::InvalidId(-3))
    ));
}

#[tokio::test]
async fn test_get_by_returns_first_match() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    let posts = seed_posts(&storage, &ctx, 6).await;

    let filter = Filter::new().with("views", 2);
    let post: Post = storage.get_by(&ctx, &filter).await.unwrap();
    assert_eq!(post.id, posts[1].id);

    let filter = Filter::new().with("title", "nope");
    assert!(matches!(
        storage.get_by::<Post>(&ctx, &filter).await,
        Err(StorageError::RecordNotFound)
    ));
}

#[tokio::test]
async fn test_injection_in_filter_key_is_rejected() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 2).await;

    let filter = Filter::new().with("title; DROP TABLE posts; --", "x");
    let err = storage.get_by::<Post>(&ctx, &filter).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidColumn(_)));
    assert!(err.is_bad_input());

    let mut posts: Vec<Post> = Vec::new();
    let total = storage.list(&ctx, &Query::new(), &mut posts).await.unwrap();
    assert_eq!(total, 2);
}

// =============================================================================
// Update / Delete
// =============================================================================

#[tokio::test]
async fn test_update_changes_columns() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    let posts = seed_posts(&storage, &ctx, 2).await;

    let changes = Changes::new().with("title", "renamed").with("views", 100);
    storage.update::<Post>(&ctx, posts[0].id, &changes).await.unwrap();

    let loaded: Post = storage.get(&ctx, posts[0].id).await.unwrap();
    assert_eq!(loaded.title, "renamed");
    assert_eq!(loaded.views, 100);

    let untouched: Post = storage.get(&ctx, posts[1].id).await.unwrap();
    assert_eq!(untouched, posts[1]);
}

#[tokio::test]
async fn test_update_missing_id_is_ok() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let changes = Changes::new().with("title", "ghost");
    assert_ok!(storage.update::<Post>(&ctx, 12345, &changes).await);
}

#[tokio::test]
async fn test_update_with_empty_changes_is_rejected() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    assert!(matches!(
        storage.update::<Post>(&ctx, 1, &Changes::new()).await,
        Err(StorageError::EmptyChanges)
    ));
}

#[tokio::test]
async fn test_update_by_counts_rows() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 9).await;

    let filter = Filter::new().with("views", 0);
    let changes = Changes::new().with("title", "zeroed");
    let affected = storage
        .update_by::<Post>(&ctx, &filter, &changes)
        .await
        .unwrap();
    assert_eq!(affected, 3);

    let filter = Filter::new().with("title", "zeroed");
    let mut posts: Vec<Post> = Vec::new();
    let query = Query {
        filter,
        ..Query::default()
    };
    assert_eq!(storage.list(&ctx, &query, &mut posts).await.unwrap(), 3);
}

#[tokio::test]
async fn test_update_by_without_match_is_not_found() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 2).await;

    let filter = Filter::new().with("title", "missing");
    let changes = Changes::new().with("views", 1);
    assert!(matches!(
        storage.update_by::<Post>(&ctx, &filter, &changes).await,
        Err(StorageError::RecordNotFound)
    ));
}

#[tokio::test]
async fn test_delete_is_physical_and_idempotent() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    let posts = seed_posts(&storage, &ctx, 2).await;

    storage.delete::<Post>(&ctx, posts[0].id).await.unwrap();
    assert!(storage.get::<Post>(&ctx, posts[0].id).await.is_err());
    assert_ok!(storage.delete::<Post>(&ctx, posts[0].id).await);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(storage.client().pool())
        .await
        .unwrap();
    assert_eq!(remaining, 1);
}

#[tokio::test]
async fn test_delete_by() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 6).await;

    let filter = Filter::new().with("views", 1);
    storage.delete_by::<Post>(&ctx, &filter).await.unwrap();

    let mut posts: Vec<Post> = Vec::new();
    let total = storage.list(&ctx, &Query::new(), &mut posts).await.unwrap();
    assert_eq!(total, 4);
    assert!(posts.iter().all(|p| p.views != 1));

    // Nothing left to match.
    assert_ok!(storage.delete_by::<Post>(&ctx, &filter).await);
}

#[tokio::test]
async fn test_delete_by_empty_filter_is_rejected() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 3).await;

    let result = storage.delete_by::<Post>(&ctx, &Filter::new()).await;
    assert!(matches!(result, Err(StorageError::EmptyFilter)));
    assert_err!(result);

    let mut posts: Vec<Post> = Vec::new();
    assert_eq!(storage.list(&ctx, &Query::new(), &mut posts).await.unwrap(), 3);
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_list_paginates_with_total() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 25).await;

    let query = Query::new().paginate(2, 10).order_by("id", "asc");
    let mut posts: Vec<Post> = Vec::new();
    let total = storage.list(&ctx, &query, &mut posts).await.unwrap();

    assert_eq!(total, 25);
    assert_eq!(posts.len(), 10);
    assert_eq!(posts[0].id, 11);
    assert_eq!(posts[9].id, 20);

    let query = Query::new().paginate(3, 10).order_by("id", "asc");
    storage.list(&ctx, &query, &mut posts).await.unwrap();
    assert_eq!(posts.len(), 5);
}

#[tokio::test]
async fn test_list_without_pagination_returns_everything() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 25).await;

    let query = Query::new().paginate(0, 0);
    let mut posts: Vec<Post> = Vec::new();
    assert_eq!(storage.list(&ctx, &query, &mut posts).await.unwrap(), 25);
    assert_eq!(posts.len(), 25);
}

#[tokio::test]
async fn test_list_filter_and_descending_sort() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 9).await;

    let query = Query::new()
        .with_filter("views", 2)
        .order_by("id", "desc")
        .paginate(1, 2);
    let mut posts: Vec<Post> = Vec::new();
    let total = storage.list(&ctx, &query, &mut posts).await.unwrap();

    assert_eq!(total, 3);
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![8, 5]);
}

#[tokio::test]
async fn test_list_from_json_query() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 4).await;

    let query: Query = serde_json::from_str(
        r#"{"filter": {"title": "post 3"}, "page": 1, "size": 10, "sort": {"id": "asc"}}"#,
    )
    .unwrap();
    let mut posts: Vec<Post> = Vec::new();
    assert_eq!(storage.list(&ctx, &query, &mut posts).await.unwrap(), 1);
    assert_eq!(posts[0].title, "post 3");
}

#[tokio::test]
async fn test_list_null_filter() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 2).await;

    let query = Query::new().with_filter("title", Value::Null);
    let mut posts: Vec<Post> = Vec::new();
    assert_eq!(storage.list(&ctx, &query, &mut posts).await.unwrap(), 0);
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_list_blank_sort_direction_is_ascending() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 3).await;

    let query = Query::new().order_by("id", "").paginate(1, 2);
    let mut posts: Vec<Post> = Vec::new();
    assert_eq!(storage.list(&ctx, &query, &mut posts).await.unwrap(), 3);
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_list_invalid_sort_order() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let query = Query::new().order_by("id", "sideways");
    let mut posts: Vec<Post> = Vec::new();
    assert!(matches!(
        storage.list(&ctx, &query, &mut posts).await,
        Err(StorageError::InvalidSortOrder { .. })
    ));
}

// =============================================================================
// Preload / Association
// =============================================================================

#[tokio::test]
async fn test_preload_attaches_children() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    let posts = seed_posts(&storage, &ctx, 3).await;
    add_comment(&storage, &ctx, posts[0].id, "first").await;
    add_comment(&storage, &ctx, posts[0].id, "second").await;
    add_comment(&storage, &ctx, posts[2].id, "third").await;

    for query in [
        Query::new().with_preload("comments").order_by("id", "asc"),
        Query::new().with_all_preload().order_by("id", "asc"),
    ] {
        let mut loaded: Vec<Post> = Vec::new();
        let total = storage.list(&ctx, &query, &mut loaded).await.unwrap();
        assert_eq!(total, 3);

        let counts: Vec<usize> = loaded.iter().map(|p| p.comments.len()).collect();
        assert_eq!(counts, vec![2, 0, 1]);
        assert_eq!(loaded[2].comments[0].body, "third");
    }
}

#[tokio::test]
async fn test_plain_list_leaves_relations_empty() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    let posts = seed_posts(&storage, &ctx, 1).await;
    add_comment(&storage, &ctx, posts[0].id, "hidden").await;

    let mut loaded: Vec<Post> = Vec::new();
    storage.list(&ctx, &Query::new(), &mut loaded).await.unwrap();
    assert!(loaded[0].comments.is_empty());
}

#[tokio::test]
async fn test_association_wins_over_preload() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    let posts = seed_posts(&storage, &ctx, 3).await;
    add_comment(&storage, &ctx, posts[0].id, "a").await;
    add_comment(&storage, &ctx, posts[1].id, "b").await;
    add_comment(&storage, &ctx, posts[1].id, "c").await;

    let query = Query::new()
        .with_filter("title", "post 2")
        .with_association("comments")
        .with_preload("comments");
    let mut loaded: Vec<Post> = Vec::new();
    let mut comments: Vec<Comment> = Vec::new();
    let total = storage
        .list_with(&ctx, &query, &mut loaded, &mut comments)
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert!(loaded.is_empty());
    let mut bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
    bodies.sort_unstable();
    assert_eq!(bodies, vec!["b", "c"]);
}

#[tokio::test]
async fn test_association_without_parents_is_empty() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let query = Query::new().with_association("comments");
    let mut loaded: Vec<Post> = Vec::new();
    let mut comments = vec![Comment {
        id: 1,
        post_id: 1,
        body: "stale".to_string(),
    }];
    let total = storage
        .list_with(&ctx, &query, &mut loaded, &mut comments)
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_association_requires_target() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let query = Query::new().with_association("comments");
    let mut loaded: Vec<Post> = Vec::new();
    assert!(matches!(
        storage.list(&ctx, &query, &mut loaded).await,
        Err(StorageError::InvalidQuery(_))
    ));
}

#[tokio::test]
async fn test_failed_preload_reports_error_instead_of_total() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();
    seed_posts(&storage, &ctx, 2).await;

    let query = Query::new().with_preload("tags");
    let mut posts: Vec<TaggedPost> = Vec::new();
    let err = storage.list(&ctx, &query, &mut posts).await.unwrap_err();
    assert!(matches!(err, StorageError::Database(_)));
    assert_eq!(err.kind(), storekeep::ErrorKind::Backend);
}

#[tokio::test]
async fn test_unknown_relation() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background();

    let query = Query::new().with_preload("authors");
    let mut loaded: Vec<Post> = Vec::new();
    assert!(matches!(
        storage.list(&ctx, &query, &mut loaded).await,
        Err(StorageError::UnknownRelation(name)) if name == "authors"
    ));
}

// =============================================================================
// Context
// =============================================================================

#[tokio::test]
async fn test_cancelled_context_skips_backend() {
    let (_dir, storage) = sqlite_storage().await;
    let (ctx, handle) = Context::background().with_cancel();
    handle.cancel();

    let mut post = Post::new("never", 0);
    assert!(matches!(
        storage.create(&ctx, &mut post).await,
        Err(StorageError::Cancelled)
    ));

    let mut posts: Vec<Post> = Vec::new();
    let total = storage
        .list(&Context::background(), &Query::new(), &mut posts)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_expired_deadline() {
    let (_dir, storage) = sqlite_storage().await;
    let ctx = Context::background().with_timeout(Duration::ZERO);

    let err = storage.get::<Post>(&ctx, 1).await.unwrap_err();
    assert!(matches!(err, StorageError::DeadlineExceeded));
}

// =============================================================================
// MySQL
// =============================================================================

fn test_mysql_config() -> Option<SqlConfig> {
    let host = std::env::var("TEST_MYSQL_HOST").ok()?;
    let database = std::env::var("TEST_MYSQL_DB").ok()?;
    SqlConfig::builder()
        .engine("mysql")
        .host(host)
        .user(std::env::var("TEST_MYSQL_USER").unwrap_or_default())
        .password(std::env::var("TEST_MYSQL_PASSWORD").unwrap_or_default())
        .database(database)
        .max_open_conns(2)
        .build()
        .ok()
}

/// Skip test if TEST_MYSQL_HOST / TEST_MYSQL_DB are not set
macro_rules! require_db {
    () => {
        match test_mysql_config() {
            Some(cfg) => cfg,
            None => {
                eprintln!("Skipping test: TEST_MYSQL_HOST not set");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_mysql_crud() {
    let cfg = require_db!();
    let storage = SqlStorage::new(storekeep::open(&cfg).await.unwrap());
    let pool = storage.client().pool();

    sqlx::query("DROP TABLE IF EXISTS posts").execute(pool).await.unwrap();
    sqlx::query(
        "CREATE TABLE posts (\
         id BIGINT AUTO_INCREMENT PRIMARY KEY, \
         title VARCHAR(255) NOT NULL, \
         views BIGINT NOT NULL DEFAULT 0)",
    )
    .execute(pool)
    .await
    .unwrap();

    let ctx = Context::background();
    let mut post = Post::new("mysql", 3);
    storage.create(&ctx, &mut post).await.unwrap();
    assert!(post.id > 0);

    let loaded: Post = storage.get(&ctx, post.id).await.unwrap();
    assert_eq!(loaded.title, "mysql");

    let changes = Changes::new().with("views", 4);
    let affected = storage
        .update_by::<Post>(&ctx, &Filter::new().with("title", "mysql"), &changes)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let mut posts: Vec<Post> = Vec::new();
    let query = Query::new().paginate(1, 10).order_by("id", "asc");
    assert_eq!(storage.list(&ctx, &query, &mut posts).await.unwrap(), 1);

    storage.delete::<Post>(&ctx, post.id).await.unwrap();
    assert!(storage.get::<Post>(&ctx, post.id).await.unwrap_err().is_not_found());

    sqlx::query("DROP TABLE posts").execute(pool).await.unwrap();
    storage.client().close().await;
}
