//! # tb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `tb-core` domain models, for both the post/comment store and the
//! user directory.
//!
//! Comments are eager-loaded with a recursive CTE that stops at the requested
//! nesting level, so the feed never walks deeper than it renders.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tb_core::models::{
    Comment, CommentId, CommentRecord, NewComment, NewPost, NewUser, Post, PostId, PostRecord,
    User, UserId,
};
use tb_core::traits::{PostRepo, UserDirectory};
use tracing::debug;

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.user_id, p.created_at, p.updated_at";

const COMMENT_COLUMNS: &str =
    "c.id, c.content, c.user_id, c.post_id, c.parent_id, c.created_at, c.updated_at";

/// Author columns, aliased so one mapper serves every join.
const USER_COLUMNS: &str = "u.id AS user_ref, u.name AS user_name, u.email AS user_email, \
     u.email_verified_at AS user_email_verified_at, u.created_at AS user_created_at, \
     u.updated_at AS user_updated_at";

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Opens (creating if needed) the database at `url`.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// A migrated, private in-memory database. Pinned to a single connection
    /// because every SQLite memory connection is its own database.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("user_ref")?,
        name: row.try_get("user_name")?,
        email: row.try_get("user_email")?,
        email_verified_at: row.try_get("user_email_verified_at")?,
        created_at: row.try_get("user_created_at")?,
        updated_at: row.try_get("user_updated_at")?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        user_id: row.try_get("user_id")?,
        post_id: row.try_get("post_id")?,
        parent_id: row.try_get("parent_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl PostRepo for SqliteRepo {
    async fn count_posts(&self) -> anyhow::Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(total)?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_posts(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<PostRecord>> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, {USER_COLUMNS} FROM posts p \
             JOIN users u ON u.id = p.user_id \
             ORDER BY p.id ASC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(PostRecord {
                    post: post_from_row(row)?,
                    user: user_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(records)
    }

    /// Walks each post's reply forest breadth-first inside SQLite, stopping
    /// before `max_levels`.
    #[tracing::instrument(skip(self, post_ids), fields(posts = post_ids.len()))]
    async fn comments_for_posts(
        &self,
        post_ids: &[PostId],
        max_levels: usize,
    ) -> anyhow::Result<Vec<CommentRecord>> {
        if post_ids.is_empty() || max_levels == 0 {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "WITH RECURSIVE thread(id, level) AS (\
             SELECT id, 0 FROM comments WHERE parent_id IS NULL AND post_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in post_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(
            ") UNION ALL \
             SELECT c.id, thread.level + 1 FROM comments c \
             JOIN thread ON c.parent_id = thread.id \
             WHERE thread.level + 1 < ",
        );
        query.push_bind(i64::try_from(max_levels)?);
        query.push(format!(
            ") SELECT {COMMENT_COLUMNS}, {USER_COLUMNS} FROM thread \
             JOIN comments c ON c.id = thread.id \
             JOIN users u ON u.id = c.user_id \
             ORDER BY c.id ASC"
        ));

        let rows = query.build().fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "comments eager-loaded");

        let records = rows
            .iter()
            .map(|row| {
                Ok(CommentRecord {
                    comment: comment_from_row(row)?,
                    user: user_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(records)
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO posts (title, content, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Post {
            id: result.last_insert_rowid(),
            title: post.title,
            content: post.content,
            user_id: post.user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Inserts a comment. A reply must name a parent on the same post.
    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
        if let Some(parent_id) = comment.parent_id {
            let parent_post: Option<i64> =
                sqlx::query_scalar("SELECT post_id FROM comments WHERE id = ?")
                    .bind(parent_id)
                    .fetch_optional(&self.pool)
                    .await?;
            match parent_post {
                None => anyhow::bail!("parent comment {parent_id} does not exist"),
                Some(post_id) if post_id != comment.post_id => anyhow::bail!(
                    "reply to comment {parent_id} must belong to post {post_id}, not {}",
                    comment.post_id
                ),
                Some(_) => {}
            }
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO comments (content, user_id, post_id, parent_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&comment.content)
        .bind(comment.user_id)
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            content: comment.content,
            user_id: comment.user_id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn delete_post(&self, id: PostId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment(&self, id: CommentId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserDirectory for SqliteRepo {
    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let users = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> anyhow::Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (name, email, email_verified_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.email_verified_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: user.name,
            email: user.email,
            email_verified_at: user.email_verified_at,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo_with_author() -> (SqliteRepo, User) {
        let repo = SqliteRepo::in_memory().await.unwrap();
        let author = repo
            .create_user(NewUser {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                email_verified_at: None,
            })
            .await
            .unwrap();
        (repo, author)
    }

    async fn new_post(repo: &SqliteRepo, author: &User, title: &str) -> Post {
        repo.create_post(NewPost {
            title: title.into(),
            content: format!("{title} body"),
            user_id: author.id,
        })
        .await
        .unwrap()
    }

    async fn reply(repo: &SqliteRepo, parent: &Comment, author: &User) -> Comment {
        repo.create_comment(NewComment::reply_to(parent, author.id, "reply"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn lists_posts_in_id_order_with_authors() {
        let (repo, author) = repo_with_author().await;
        for n in 1..=7 {
            new_post(&repo, &author, &format!("post {n}")).await;
        }

        assert_eq!(repo.count_posts().await.unwrap(), 7);

        let page = repo.list_posts(5, 5).await.unwrap();
        let titles: Vec<_> = page.iter().map(|r| r.post.title.as_str()).collect();
        assert_eq!(titles, vec!["post 6", "post 7"]);
        assert!(page.iter().all(|r| r.user == author));
    }

    #[tokio::test]
    async fn comment_query_stops_at_the_level_bound() {
        let (repo, author) = repo_with_author().await;
        let post = new_post(&repo, &author, "deep").await;

        let top = repo
            .create_comment(NewComment::top_level(post.id, author.id, "top"))
            .await
            .unwrap();
        let level1 = reply(&repo, &top, &author).await;
        let level2 = reply(&repo, &level1, &author).await;
        let level3 = reply(&repo, &level2, &author).await;

        let rows = repo.comments_for_posts(&[post.id], 3).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.comment.id).collect();
        assert_eq!(ids, vec![top.id, level1.id, level2.id]);
        assert!(!ids.contains(&level3.id));
        assert!(rows.iter().all(|r| r.user.name == "Ada"));

        let shallow = repo.comments_for_posts(&[post.id], 1).await.unwrap();
        assert_eq!(shallow.len(), 1);
    }

    #[tokio::test]
    async fn comment_query_is_scoped_to_the_requested_posts() {
        let (repo, author) = repo_with_author().await;
        let first = new_post(&repo, &author, "first").await;
        let second = new_post(&repo, &author, "second").await;
        let third = new_post(&repo, &author, "third").await;
        for post in [&first, &second, &third] {
            repo.create_comment(NewComment::top_level(post.id, author.id, "hi"))
                .await
                .unwrap();
        }

        let rows = repo
            .comments_for_posts(&[first.id, third.id], 3)
            .await
            .unwrap();

        let posts: Vec<_> = rows.iter().map(|r| r.comment.post_id).collect();
        assert_eq!(posts, vec![first.id, third.id]);
        assert!(repo.comments_for_posts(&[], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replies_must_stay_on_their_parents_post() {
        let (repo, author) = repo_with_author().await;
        let first = new_post(&repo, &author, "first").await;
        let second = new_post(&repo, &author, "second").await;
        let top = repo
            .create_comment(NewComment::top_level(first.id, author.id, "top"))
            .await
            .unwrap();

        let mut stray = NewComment::reply_to(&top, author.id, "wrong post");
        stray.post_id = second.id;
        assert!(repo.create_comment(stray).await.is_err());

        let mut orphan = NewComment::top_level(first.id, author.id, "orphan");
        orphan.parent_id = Some(9_999);
        assert!(repo.create_comment(orphan).await.is_err());
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_subtree() {
        let (repo, author) = repo_with_author().await;
        let post = new_post(&repo, &author, "cascade").await;
        let keep = repo
            .create_comment(NewComment::top_level(post.id, author.id, "keep"))
            .await
            .unwrap();
        let doomed = repo
            .create_comment(NewComment::top_level(post.id, author.id, "doomed"))
            .await
            .unwrap();
        let child = reply(&repo, &doomed, &author).await;
        reply(&repo, &child, &author).await;

        assert!(repo.delete_comment(doomed.id).await.unwrap());

        let rows = repo.comments_for_posts(&[post.id], 3).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.comment.id).collect();
        assert_eq!(ids, vec![keep.id]);
        assert!(!repo.delete_comment(doomed.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_comments() {
        let (repo, author) = repo_with_author().await;
        let post = new_post(&repo, &author, "gone").await;
        let top = repo
            .create_comment(NewComment::top_level(post.id, author.id, "top"))
            .await
            .unwrap();
        reply(&repo, &top, &author).await;

        assert!(repo.delete_post(post.id).await.unwrap());

        assert_eq!(repo.count_posts().await.unwrap(), 0);
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn user_directory_round_trip() {
        let (repo, author) = repo_with_author().await;

        assert_eq!(repo.find_user(author.id).await.unwrap(), Some(author.clone()));
        assert_eq!(repo.find_user(author.id + 1).await.unwrap(), None);
        assert_eq!(repo.list_users().await.unwrap(), vec![author]);
    }
}
