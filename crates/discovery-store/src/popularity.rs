//! SQLite ranked counter with per-key expiry

use crate::collaborator;
use crate::sqlite::with_connection;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use discovery_core::{HotKeyword, PopularityCounter, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SqlitePopularityCounter {
    db_path: PathBuf,
}

impl SqlitePopularityCounter {
    pub fn new(db_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS popularity (
                key TEXT NOT NULL,
                member TEXT NOT NULL,
                score REAL NOT NULL,
                PRIMARY KEY (key, member)
            );
            CREATE TABLE IF NOT EXISTS popularity_expiry (
                key TEXT PRIMARY KEY,
                expires_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn purge_expired(conn: &Connection) -> rusqlite::Result<()> {
    let now = Utc::now().timestamp_millis();
    conn.execute(
        "DELETE FROM popularity WHERE key IN
         (SELECT key FROM popularity_expiry WHERE expires_at <= ?1)",
        params![now],
    )?;
    conn.execute(
        "DELETE FROM popularity_expiry WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(())
}

#[async_trait]
impl PopularityCounter for SqlitePopularityCounter {
    async fn increment(&self, key: &str, member: &str) -> Result<()> {
        let key = key.to_string();
        let member = member.to_string();
        with_connection(&self.db_path, collaborator::POPULARITY, move |conn| {
            purge_expired(conn)?;
            conn.execute(
                "INSERT INTO popularity (key, member, score) VALUES (?1, ?2, 1)
                 ON CONFLICT(key, member) DO UPDATE SET score = score + 1",
                params![key, member],
            )?;
            Ok(())
        })
        .await
    }

    async fn top_k(&self, key: &str, k: usize) -> Result<Vec<HotKeyword>> {
        let key = key.to_string();
        with_connection(&self.db_path, collaborator::POPULARITY, move |conn| {
            purge_expired(conn)?;
            let mut stmt = conn.prepare(
                "SELECT member, score FROM popularity WHERE key = ?1
                 ORDER BY score DESC, member ASC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![key, k as i64], |row| {
                Ok(HotKeyword {
                    member: row.get(0)?,
                    score: row.get(1)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn expire_after(&self, key: &str, ttl: Duration) -> Result<()> {
        let key = key.to_string();
        let expires_at = (Utc::now() + ttl).timestamp_millis();
        with_connection(&self.db_path, collaborator::POPULARITY, move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO popularity_expiry (key, expires_at) VALUES (?1, ?2)",
                params![key, expires_at],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn counter() -> (TempDir, SqlitePopularityCounter) {
        let dir = TempDir::new().unwrap();
        let counter = SqlitePopularityCounter::new(dir.path().join("discovery.db")).unwrap();
        (dir, counter)
    }

    #[tokio::test]
    async fn test_increment_and_rank() {
        let (_dir, counter) = counter();
        for member in ["vue", "react", "vue", "vue", "react", "svelte"] {
            counter.increment("hot", member).await.unwrap();
        }
        counter.increment("other", "vue").await.unwrap();

        let top = counter.top_k("hot", 2).await.unwrap();
        assert_eq!(
            top,
            vec![
                HotKeyword { member: "vue".into(), score: 3.0 },
                HotKeyword { member: "react".into(), score: 2.0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_expired_key_is_dropped() {
        let (_dir, counter) = counter();
        counter.increment("hot", "vue").await.unwrap();
        counter.increment("keep", "rust").await.unwrap();
        counter.expire_after("hot", Duration::milliseconds(-1)).await.unwrap();

        assert!(counter.top_k("hot", 10).await.unwrap().is_empty());
        assert_eq!(counter.top_k("keep", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_future_expiry_keeps_scores() {
        let (_dir, counter) = counter();
        counter.increment("hot", "vue").await.unwrap();
        counter.expire_after("hot", Duration::days(7)).await.unwrap();
        counter.increment("hot", "vue").await.unwrap();

        let top = counter.top_k("hot", 10).await.unwrap();
        assert_eq!(top[0].score, 2.0);
    }
}
