//! Fills the configured database with demo users, posts and comment threads.
//!
//! Per post: 3 to 8 top-level comments; each has a 60% chance of 1 to 4
//! replies, and each reply a 30% chance of 1 to 2 nested replies.

use anyhow::Context;
use fake::faker::boolean::en::Boolean;
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::Name;
use fake::Fake;
use tb_config::Settings;
use tb_core::{Comment, NewComment, NewPost, NewUser, PostRepo, User, UserDirectory};
use tb_db_sqlite::SqliteRepo;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USERS: usize = 10;
const POSTS: usize = 15;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter)),
        )
        .init();

    let repo = SqliteRepo::connect(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("failed to open {}", settings.database.url))?;
    repo.migrate().await?;

    let users = seed_users(&repo).await?;
    let mut comments = 0;
    for n in 0..POSTS {
        let author = pick(&users, n);
        let title: String = Sentence(3..8).fake();
        let post = repo
            .create_post(NewPost {
                title: title.trim_end_matches('.').to_string(),
                content: Paragraph(2..5).fake(),
                user_id: author.id,
            })
            .await?;
        comments += seed_thread(&repo, &users, post.id).await?;
    }

    info!(users = users.len(), posts = POSTS, comments, "database seeded");
    Ok(())
}

async fn seed_users(repo: &SqliteRepo) -> anyhow::Result<Vec<User>> {
    let mut users = Vec::with_capacity(USERS);
    for n in 0..USERS {
        let name: String = Name().fake();
        let user = repo
            .create_user(NewUser {
                email: format!("user{}@example.com", n + 1),
                name,
                email_verified_at: None,
            })
            .await?;
        users.push(user);
    }
    Ok(users)
}

/// Writes one post's comments and returns how many were created.
async fn seed_thread(repo: &SqliteRepo, users: &[User], post_id: i64) -> anyhow::Result<usize> {
    let mut created = 0;
    let top_level: usize = (3..9).fake();
    for _ in 0..top_level {
        let top = comment(repo, NewComment::top_level(post_id, random_user(users).id, line())).await?;
        created += 1;

        if !Boolean(60).fake::<bool>() {
            continue;
        }
        let replies: usize = (1..5).fake();
        for _ in 0..replies {
            let reply = comment(repo, NewComment::reply_to(&top, random_user(users).id, line())).await?;
            created += 1;

            if !Boolean(30).fake::<bool>() {
                continue;
            }
            let nested: usize = (1..3).fake();
            for _ in 0..nested {
                comment(repo, NewComment::reply_to(&reply, random_user(users).id, line())).await?;
                created += 1;
            }
        }
    }
    Ok(created)
}

async fn comment(repo: &SqliteRepo, new: NewComment) -> anyhow::Result<Comment> {
    repo.create_comment(new).await
}

fn line() -> String {
    Sentence(4..14).fake()
}

fn pick(users: &[User], n: usize) -> &User {
    &users[n % users.len()]
}

fn random_user(users: &[User]) -> &User {
    pick(users, (0..users.len()).fake())
}
