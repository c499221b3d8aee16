use std::collections::HashSet;

use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Member roles, stored as plain text in the users table
pub const ROLES: [&str; 3] = ["admin", "member", "guest"];

/// A registered member, as shown on the member management screens
#[derive(Debug, Clone, serde::Serialize)]
pub struct Member {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

/// Member counts per role for the admin dashboard
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MemberStats {
    pub total: i64,
    pub admin: i64,
    pub member: i64,
    pub guest: i64,
}

/// A bulletin / news item
#[derive(Debug, Clone, serde::Serialize)]
pub struct NewsPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub drive_file_id: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
}

/// A sermon video item
#[derive(Debug, Clone, serde::Serialize)]
pub struct SermonPost {
    pub id: String,
    pub title: String,
    pub youtube_url: String,
    pub video_id: String,
    pub thumbnail_url: Option<String>,
    pub preacher: String,
    pub published_at: Option<String>,
    pub created_at: String,
}

/// Fields for a new bulletin row, from the admin form or the Drive sync
#[derive(Debug, Clone)]
pub struct NewNewsPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub drive_file_id: Option<String>,
    pub published_at: Option<String>,
}

/// Fields for a new sermon row, from the admin form or the YouTube sync
#[derive(Debug, Clone)]
pub struct NewSermonPost {
    pub title: String,
    pub youtube_url: String,
    pub video_id: String,
    pub thumbnail_url: Option<String>,
    pub preacher: String,
    pub published_at: Option<String>,
}

/// Database storage layer - handles member accounts and site content
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Initialize storage and run migrations
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Connect to database
        let pool = SqlitePool::connect(database_url).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Internal(format!("Migration failed: {}", e)))?;

        let storage = Self { pool };

        // Initialize admin user if no users exist
        storage.init_admin_if_needed().await?;

        Ok(storage)
    }

    /// Create initial admin user with random password if no users exist
    async fn init_admin_if_needed(&self) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        if count == 0 {
            let random_password = generate_random_password();
            let password_hash = hash_password(&random_password)?;

            sqlx::query(
                "INSERT INTO users (id, username, password, token, role) VALUES (?, ?, ?, NULL, 'admin')",
            )
            .bind(Uuid::new_v4().to_string())
            .bind("admin")
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

            tracing::warn!("═══════════════════════════════════════════════════════════");
            tracing::warn!("Initial admin user created!");
            tracing::warn!("Username: admin");
            tracing::warn!("Password: {}", random_password);
            tracing::warn!("Please change this password immediately after first login!");
            tracing::warn!("═══════════════════════════════════════════════════════════");
        }

        Ok(())
    }

    /// Verify username and password, return session token on success
    /// Records last_login on every successful verification
    pub async fn verify_user(&self, username: &str, password: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT password, token FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let password_hash: String = row.get("password");

            if !verify_password(password, &password_hash)? {
                tracing::debug!("Password verification failed for user: {}", username);
                return Ok(None);
            }

            tracing::debug!("User {} verified successfully", username);

            // Return existing token or generate new one
            let token: Option<String> = row.get("token");
            let token = match token {
                Some(existing) => existing,
                None => Uuid::new_v4().to_string(),
            };

            sqlx::query(
                "UPDATE users SET token = ?, last_login = datetime('now') WHERE username = ?",
            )
            .bind(&token)
            .bind(username)
            .execute(&self.pool)
            .await?;

            Ok(Some(token))
        } else {
            tracing::debug!("User not found: {}", username);
            Ok(None)
        }
    }

    /// Verify session token, return username on success
    pub async fn verify_token(&self, token: &str) -> Result<Option<String>> {
        let username: Option<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        Ok(username)
    }

    /// Check if the session token belongs to an admin
    pub async fn verify_admin(&self, token: &str) -> Result<bool> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role.map(|r| r == "admin").unwrap_or(false))
    }

    /// Check if username exists
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Check if user is admin by username
    pub async fn is_admin(&self, username: &str) -> Result<bool> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role.map(|r| r == "admin").unwrap_or(false))
    }

    /// Create a new user with the given role
    pub async fn create_user(&self, username: &str, password: &str, role: &str) -> Result<String> {
        if !ROLES.contains(&role) {
            return Err(Error::BadRequest(format!("Unknown role: {}", role)));
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(password)?;

        sqlx::query("INSERT INTO users (id, username, password, token, role) VALUES (?, ?, ?, NULL, ?)")
            .bind(&id)
            .bind(username)
            .bind(&password_hash)
            .bind(role)
            .execute(&self.pool)
            .await?;

        tracing::info!("Created user: {} (role: {})", username, role);
        Ok(id)
    }

    /// List all members, newest signups first
    pub async fn list_members(&self) -> Result<Vec<Member>> {
        let rows = sqlx::query(
            "SELECT id, username, role, created_at, last_login FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let members = rows
            .into_iter()
            .map(|row| Member {
                id: row.get("id"),
                username: row.get("username"),
                role: row.get("role"),
                created_at: row.get("created_at"),
                last_login: row.get("last_login"),
            })
            .collect();

        Ok(members)
    }

    /// Fetch a single member by id
    pub async fn get_member(&self, id: &str) -> Result<Option<Member>> {
        let row = sqlx::query(
            "SELECT id, username, role, created_at, last_login FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Member {
            id: row.get("id"),
            username: row.get("username"),
            role: row.get("role"),
            created_at: row.get("created_at"),
            last_login: row.get("last_login"),
        }))
    }

    /// Change a member's role
    pub async fn update_member_role(&self, id: &str, role: &str) -> Result<()> {
        if !ROLES.contains(&role) {
            return Err(Error::BadRequest(format!("Unknown role: {}", role)));
        }

        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Member not found: {}", id)));
        }

        tracing::info!("Member {} role updated to {}", id, role);
        Ok(())
    }

    /// Member counts per role
    pub async fn member_stats(&self) -> Result<MemberStats> {
        let rows = sqlx::query("SELECT role, COUNT(*) AS n FROM users GROUP BY role")
            .fetch_all(&self.pool)
            .await?;

        let mut stats = MemberStats::default();
        for row in rows {
            let role: String = row.get("role");
            let n: i64 = row.get("n");
            stats.total += n;
            match role.as_str() {
                "admin" => stats.admin = n,
                "member" => stats.member = n,
                "guest" => stats.guest = n,
                _ => {}
            }
        }

        Ok(stats)
    }

    /// Change a user's password after verifying the current one
    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if self.verify_user(username, current_password).await?.is_none() {
            return Err(Error::AuthFailed);
        }

        let password_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password = ? WHERE username = ?")
            .bind(&password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;

        tracing::info!("Password changed for user: {}", username);
        Ok(())
    }

    /// Logout user (clear session token)
    pub async fn logout(&self, token: &str) -> Result<()> {
        sqlx::query("UPDATE users SET token = NULL WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ---- Bulletin / news content ----

    /// Insert a bulletin row (admin form path, no external identifier)
    pub async fn insert_news(&self, post: NewNewsPost) -> Result<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO posts_news (id, title, content, image_url, link_url, drive_file_id, published_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(&post.link_url)
        .bind(&post.drive_file_id)
        .bind(&post.published_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Inserted news post: {}", post.title);
        Ok(id)
    }

    /// Upsert a bulletin row keyed on drive_file_id (Drive sync path).
    /// Re-syncing the same file overwrites the row, last write wins.
    pub async fn upsert_news(&self, post: NewNewsPost) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts_news (id, title, content, image_url, link_url, drive_file_id, published_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(drive_file_id) DO UPDATE SET
                 title = excluded.title,
                 content = excluded.content,
                 image_url = excluded.image_url,
                 link_url = excluded.link_url,
                 published_at = excluded.published_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(&post.link_url)
        .bind(&post.drive_file_id)
        .bind(&post.published_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all bulletin posts (display ordering is applied by the caller)
    pub async fn list_news(&self) -> Result<Vec<NewsPost>> {
        let rows = sqlx::query(
            "SELECT id, title, content, image_url, link_url, drive_file_id, published_at, created_at
             FROM posts_news",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(news_from_row).collect())
    }

    /// The existing-identifier set for the Drive sync, loaded once per run
    pub async fn existing_drive_file_ids(&self) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT drive_file_id FROM posts_news WHERE drive_file_id IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    pub async fn news_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts_news")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    // ---- Sermon content ----

    /// Insert a sermon row (admin form path)
    pub async fn insert_sermon(&self, post: NewSermonPost) -> Result<String> {
        if self.sermon_url_exists(&post.youtube_url).await? {
            return Err(Error::Conflict(format!(
                "Sermon already registered: {}",
                post.youtube_url
            )));
        }

        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO posts_sermons (id, title, youtube_url, video_id, thumbnail_url, preacher, published_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&post.title)
        .bind(&post.youtube_url)
        .bind(&post.video_id)
        .bind(&post.thumbnail_url)
        .bind(&post.preacher)
        .bind(&post.published_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Inserted sermon post: {}", post.title);
        Ok(id)
    }

    /// Upsert a sermon row keyed on youtube_url (YouTube sync path).
    /// Re-syncing the same video overwrites the row, last write wins.
    pub async fn upsert_sermon(&self, post: NewSermonPost) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts_sermons (id, title, youtube_url, video_id, thumbnail_url, preacher, published_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(youtube_url) DO UPDATE SET
                 title = excluded.title,
                 video_id = excluded.video_id,
                 thumbnail_url = excluded.thumbnail_url,
                 preacher = excluded.preacher,
                 published_at = excluded.published_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&post.title)
        .bind(&post.youtube_url)
        .bind(&post.video_id)
        .bind(&post.thumbnail_url)
        .bind(&post.preacher)
        .bind(&post.published_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all sermon posts (display ordering is applied by the caller)
    pub async fn list_sermons(&self) -> Result<Vec<SermonPost>> {
        let rows = sqlx::query(
            "SELECT id, title, youtube_url, video_id, thumbnail_url, preacher, published_at, created_at
             FROM posts_sermons",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(sermon_from_row).collect())
    }

    /// The existing-identifier set for the YouTube sync, loaded once per run
    pub async fn existing_sermon_urls(&self) -> Result<HashSet<String>> {
        let urls: Vec<String> = sqlx::query_scalar("SELECT youtube_url FROM posts_sermons")
            .fetch_all(&self.pool)
            .await?;

        Ok(urls.into_iter().collect())
    }

    async fn sermon_url_exists(&self, youtube_url: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts_sermons WHERE youtube_url = ?")
                .bind(youtube_url)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    pub async fn sermon_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts_sermons")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    /// Get database pool for advanced operations (session store)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn news_from_row(row: sqlx::sqlite::SqliteRow) -> NewsPost {
    NewsPost {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        image_url: row.get("image_url"),
        link_url: row.get("link_url"),
        drive_file_id: row.get("drive_file_id"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    }
}

fn sermon_from_row(row: sqlx::sqlite::SqliteRow) -> SermonPost {
    SermonPost {
        id: row.get("id"),
        title: row.get("title"),
        youtube_url: row.get("youtube_url"),
        video_id: row.get("video_id"),
        thumbnail_url: row.get("thumbnail_url"),
        preacher: row.get("preacher"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    }
}

/// Hash a password using bcrypt
fn hash_password(password: &str) -> Result<String> {
    hash(password, DEFAULT_COST).map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a hash
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    verify(password, hash).map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))
}

/// Generate a random password for the initial admin
fn generate_random_password() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                             abcdefghijklmnopqrstuvwxyz\
                             0123456789";
    const PASSWORD_LEN: usize = 12;
    let mut rng = rand::thread_rng();

    (0..PASSWORD_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
