//! SQLite-backed collaborators
//!
//! Each call opens its own connection on the blocking pool, so the store is
//! `Send + Sync` and concurrent lookups do not serialize on one handle.

use crate::collaborator;
use crate::dataset::Dataset;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discovery_core::tokenizer::{excerpt_around, tokenize_query};
use discovery_core::{
    DiscoveryError, Document, DocumentStore, EngagementStore, FollowGraph, Result,
    SuggestionSource, TagAssignmentStore, TagEngagement, UserDirectory, UserId,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const MAX_QUERY_TERMS: usize = 16;
const DEFAULT_EXCERPT_RADIUS: usize = 12;
/// Content rows fetched per requested excerpt; bodies can collapse to one excerpt
const CONTENT_OVERFETCH: usize = 4;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS circles (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        author_id INTEGER NOT NULL,
        circle_id INTEGER,
        created_at INTEGER NOT NULL,
        views INTEGER NOT NULL DEFAULT 0,
        likes INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0,
        hidden INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);
    CREATE TABLE IF NOT EXISTS post_tags (
        post_id INTEGER NOT NULL,
        tag TEXT NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY (post_id, tag)
    );
    CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag);
    CREATE TABLE IF NOT EXISTS user_tags (
        user_id INTEGER NOT NULL,
        tag TEXT NOT NULL,
        PRIMARY KEY (user_id, tag)
    );
    CREATE TABLE IF NOT EXISTS follows (
        follower_id INTEGER NOT NULL,
        followee_id INTEGER NOT NULL,
        PRIMARY KEY (follower_id, followee_id)
    );
    CREATE TABLE IF NOT EXISTS engagements (
        user_id INTEGER NOT NULL,
        post_id INTEGER NOT NULL,
        at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_engagements_at ON engagements(at);
";

const DOCUMENT_SELECT: &str = "
    SELECT p.id, p.title, p.content, p.author_id, COALESCE(u.username, ''),
           p.circle_id, c.name, p.created_at, p.views, p.likes
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_id
    LEFT JOIN circles c ON c.id = p.circle_id
    WHERE p.deleted = 0 AND p.hidden = 0";

/// Open a connection with `unicode_lower(text)` registered.
///
/// SQLite's own `lower()` and `LIKE` only fold ASCII, so every text match
/// compares `unicode_lower(column)` against an already lower-cased pattern.
pub(crate) fn open_connection(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )?;
    Ok(conn)
}

/// Run `f` against a fresh connection on the blocking pool
pub(crate) async fn with_connection<T, F>(
    db_path: &Path,
    collaborator: &'static str,
    f: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
{
    let db_path = db_path.to_path_buf();
    tokio::task::spawn_blocking(move || -> anyhow::Result<T> {
        let mut conn = open_connection(&db_path)?;
        f(&mut conn)
    })
    .await?
    .map_err(|e| DiscoveryError::upstream(collaborator, e))
}

pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn to_datetime(millis: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| anyhow!("invalid timestamp {}", millis))
}

fn read_documents<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> anyhow::Result<Vec<Document>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<i64>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, i64>(7)?,
            row.get::<_, i64>(8)?,
            row.get::<_, i64>(9)?,
        ))
    })?;

    let mut tag_stmt =
        conn.prepare_cached("SELECT tag FROM post_tags WHERE post_id = ?1 ORDER BY position")?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, title, content, author_id, author_name, circle_id, circle_name, created, views, likes) =
            row?;
        let tags = tag_stmt
            .query_map(params![id], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        documents.push(Document {
            id,
            title,
            content,
            tags,
            author_id,
            author_name,
            circle_id,
            circle_name,
            created_at: to_datetime(created)?,
            views: views.max(0) as u64,
            likes: likes.max(0) as u64,
        });
    }
    Ok(documents)
}

fn read_tag_counts<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> anyhow::Result<Vec<TagEngagement>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(TagEngagement::new(
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?.max(0) as u64,
        ))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn read_strings<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
    excerpt_radius: usize,
}

impl SqliteStore {
    pub fn new(db_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            db_path,
            excerpt_radius: DEFAULT_EXCERPT_RADIUS,
        };
        store.init_db()?;
        Ok(store)
    }

    pub fn with_excerpt_radius(mut self, radius: usize) -> Self {
        self.excerpt_radius = radius;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn init_db(&self) -> anyhow::Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Upsert every record of the dataset in one transaction
    pub fn import(&self, dataset: &Dataset) -> anyhow::Result<usize> {
        let mut conn = Connection::open(&self.db_path)?;
        let tx = conn.transaction()?;

        for user in &dataset.users {
            tx.execute(
                "INSERT OR REPLACE INTO users (id, username) VALUES (?1, ?2)",
                params![user.id, &user.username],
            )?;
        }
        for circle in &dataset.circles {
            tx.execute(
                "INSERT OR REPLACE INTO circles (id, name) VALUES (?1, ?2)",
                params![circle.id, &circle.name],
            )?;
        }
        for post in &dataset.posts {
            tx.execute(
                "INSERT OR REPLACE INTO posts
                 (id, title, content, author_id, circle_id, created_at, views, likes, deleted, hidden)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    post.id,
                    &post.title,
                    &post.content,
                    post.author_id,
                    post.circle_id,
                    post.created_at.timestamp_millis(),
                    post.views as i64,
                    post.likes as i64,
                    post.deleted,
                    post.hidden,
                ],
            )?;
            tx.execute("DELETE FROM post_tags WHERE post_id = ?1", params![post.id])?;
            for (position, tag) in post.tags.iter().enumerate() {
                tx.execute(
                    "INSERT OR IGNORE INTO post_tags (post_id, tag, position) VALUES (?1, ?2, ?3)",
                    params![post.id, tag, position as i64],
                )?;
            }
        }
        for assignment in &dataset.user_tags {
            tx.execute(
                "INSERT OR IGNORE INTO user_tags (user_id, tag) VALUES (?1, ?2)",
                params![assignment.user_id, &assignment.tag],
            )?;
        }
        for follow in &dataset.follows {
            tx.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followee_id) VALUES (?1, ?2)",
                params![follow.follower_id, follow.followee_id],
            )?;
        }
        for engagement in &dataset.engagements {
            tx.execute(
                "INSERT INTO engagements (user_id, post_id, at) VALUES (?1, ?2, ?3)",
                params![
                    engagement.user_id,
                    engagement.post_id,
                    engagement.at.timestamp_millis()
                ],
            )?;
        }

        tx.commit()?;
        tracing::info!(posts = dataset.posts.len(), users = dataset.users.len(), "dataset imported");
        Ok(dataset.posts.len())
    }

    pub fn get_stats(&self) -> anyhow::Result<HashMap<String, serde_json::Value>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stats = HashMap::new();
        for table in ["users", "circles", "posts", "user_tags", "follows", "engagements"] {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            stats.insert(table.to_string(), serde_json::Value::Number(count.into()));
        }
        let live: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE deleted = 0 AND hidden = 0",
            [],
            |row| row.get(0),
        )?;
        stats.insert(
            "live_posts".to_string(),
            serde_json::Value::Number(live.into()),
        );
        Ok(stats)
    }

    async fn run<T, F>(&self, collaborator: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
    {
        with_connection(&self.db_path, collaborator, f).await
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn candidates_for_query(
        &self,
        query: &str,
        max_candidates: usize,
    ) -> Result<Vec<Document>> {
        let mut terms = tokenize_query(query);
        if terms.is_empty() {
            terms.push(query.trim().to_lowercase());
        }
        terms.truncate(MAX_QUERY_TERMS);

        let clauses: Vec<String> = (1..=terms.len())
            .map(|i| {
                format!(
                    "(unicode_lower(p.title) LIKE ?{i} ESCAPE '\\' \
                     OR unicode_lower(p.content) LIKE ?{i} ESCAPE '\\' \
                     OR EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id \
                     AND unicode_lower(t.tag) LIKE ?{i} ESCAPE '\\'))"
                )
            })
            .collect();
        let sql = format!(
            "{} AND ({}) ORDER BY p.created_at DESC, p.id ASC LIMIT {}",
            DOCUMENT_SELECT,
            clauses.join(" OR "),
            max_candidates
        );
        let patterns: Vec<String> = terms.iter().map(|t| like_pattern(t)).collect();

        self.run(collaborator::DOCUMENTS, move |conn| {
            read_documents(conn, &sql, params_from_iter(patterns))
        })
        .await
    }

    async fn recent_documents(&self, limit: usize) -> Result<Vec<Document>> {
        let sql = format!(
            "{} ORDER BY p.created_at DESC, p.id ASC LIMIT {}",
            DOCUMENT_SELECT, limit
        );
        self.run(collaborator::DOCUMENTS, move |conn| {
            read_documents(conn, &sql, [])
        })
        .await
    }

    async fn document_count_for_tag(&self, tag: &str) -> Result<u64> {
        let tag = tag.to_string();
        self.run(collaborator::DOCUMENTS, move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(DISTINCT p.id) FROM post_tags t
                 JOIN posts p ON p.id = t.post_id
                 WHERE t.tag = ?1 AND p.deleted = 0 AND p.hidden = 0",
                params![tag],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}

#[async_trait]
impl EngagementStore for SqliteStore {
    async fn engagements_by_user(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<TagEngagement>> {
        let since = since.timestamp_millis();
        self.run(collaborator::ENGAGEMENTS, move |conn| {
            read_tag_counts(
                conn,
                "SELECT t.tag, COUNT(*) FROM engagements e
                 JOIN posts p ON p.id = e.post_id
                 JOIN post_tags t ON t.post_id = e.post_id
                 WHERE e.user_id = ?1 AND e.at >= ?2 AND p.deleted = 0 AND p.hidden = 0
                 GROUP BY t.tag",
                params![user_id, since],
            )
        })
        .await
    }

    async fn engagements_global(&self, since: DateTime<Utc>) -> Result<Vec<TagEngagement>> {
        let since = since.timestamp_millis();
        self.run(collaborator::ENGAGEMENTS, move |conn| {
            read_tag_counts(
                conn,
                "SELECT t.tag, COUNT(*) FROM engagements e
                 JOIN posts p ON p.id = e.post_id
                 JOIN post_tags t ON t.post_id = e.post_id
                 WHERE e.at >= ?1 AND p.deleted = 0 AND p.hidden = 0
                 GROUP BY t.tag",
                params![since],
            )
        })
        .await
    }
}

#[async_trait]
impl TagAssignmentStore for SqliteStore {
    async fn all_user_tag_profiles(&self) -> Result<HashMap<UserId, Vec<String>>> {
        self.run(collaborator::TAG_ASSIGNMENTS, |conn| {
            let mut stmt = conn.prepare("SELECT user_id, tag FROM user_tags ORDER BY user_id, tag")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut profiles: HashMap<UserId, Vec<String>> = HashMap::new();
            for row in rows {
                let (user_id, tag) = row?;
                profiles.entry(user_id).or_default().push(tag);
            }
            Ok(profiles)
        })
        .await
    }
}

#[async_trait]
impl FollowGraph for SqliteStore {
    async fn followed_ids(&self, user_id: UserId) -> Result<HashSet<UserId>> {
        self.run(collaborator::FOLLOWS, move |conn| {
            let mut stmt = conn.prepare("SELECT followee_id FROM follows WHERE follower_id = ?1")?;
            let rows = stmt.query_map(params![user_id], |row| row.get::<_, i64>(0))?;
            Ok(rows.collect::<rusqlite::Result<HashSet<_>>>()?)
        })
        .await
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn usernames(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = ids.to_vec();
        self.run(collaborator::USERS, move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "SELECT id, username FROM users WHERE id IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
        })
        .await
    }
}

#[async_trait]
impl SuggestionSource for SqliteStore {
    async fn titles_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = like_pattern(&keyword.to_lowercase());
        self.run(collaborator::SUGGEST_TITLES, move |conn| {
            read_strings(
                conn,
                "SELECT title FROM posts
                 WHERE deleted = 0 AND hidden = 0 AND unicode_lower(title) LIKE ?1 ESCAPE '\\'
                 GROUP BY title ORDER BY MAX(created_at) DESC LIMIT ?2",
                params![pattern, limit as i64],
            )
        })
        .await
    }

    async fn content_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = like_pattern(&keyword.to_lowercase());
        let keyword = keyword.to_string();
        let radius = self.excerpt_radius;
        self.run(collaborator::SUGGEST_CONTENT, move |conn| {
            let bodies = read_strings(
                conn,
                "SELECT content FROM posts
                 WHERE deleted = 0 AND hidden = 0 AND unicode_lower(content) LIKE ?1 ESCAPE '\\'
                 ORDER BY created_at DESC, id ASC LIMIT ?2",
                params![pattern, limit.saturating_mul(CONTENT_OVERFETCH) as i64],
            )?;

            let mut seen = HashSet::new();
            Ok(bodies
                .iter()
                .filter_map(|body| excerpt_around(body, &keyword, radius))
                .filter(|excerpt| seen.insert(excerpt.clone()))
                .take(limit)
                .collect())
        })
        .await
    }

    async fn tags_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = like_pattern(&keyword.to_lowercase());
        self.run(collaborator::SUGGEST_TAGS, move |conn| {
            read_strings(
                conn,
                "SELECT t.tag FROM post_tags t
                 JOIN posts p ON p.id = t.post_id
                 WHERE p.deleted = 0 AND p.hidden = 0 AND unicode_lower(t.tag) LIKE ?1 ESCAPE '\\'
                 GROUP BY t.tag ORDER BY COUNT(*) DESC, t.tag ASC LIMIT ?2",
                params![pattern, limit as i64],
            )
        })
        .await
    }

    async fn usernames_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = like_pattern(&keyword.to_lowercase());
        self.run(collaborator::SUGGEST_USERS, move |conn| {
            read_strings(
                conn,
                "SELECT username FROM users WHERE unicode_lower(username) LIKE ?1 ESCAPE '\\'
                 ORDER BY username LIMIT ?2",
                params![pattern, limit as i64],
            )
        })
        .await
    }

    async fn circles_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = like_pattern(&keyword.to_lowercase());
        self.run(collaborator::SUGGEST_CIRCLES, move |conn| {
            read_strings(
                conn,
                "SELECT name FROM circles WHERE unicode_lower(name) LIKE ?1 ESCAPE '\\'
                 ORDER BY name LIMIT ?2",
                params![pattern, limit as i64],
            )
        })
        .await
    }
}
