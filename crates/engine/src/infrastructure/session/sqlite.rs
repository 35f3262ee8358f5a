//! SQLite-backed agent session memory.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::infrastructure::ports::{
    ClockPort, MemoryItem, MessageRole, SessionMemoryPort, SessionStoreError,
};

/// SQLite implementation of agent session memory.
pub struct SqliteSessionMemory {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteSessionMemory {
    pub async fn new(db_path: &str, clock: Arc<dyn ClockPort>) -> Result<Self, SessionStoreError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| SessionStoreError::database("connect", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_session_items (
                session_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (session_id, position)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| SessionStoreError::database("create_table", e))?;

        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl SessionMemoryPort for SqliteSessionMemory {
    async fn load_items(&self, session_id: &str) -> Result<Vec<MemoryItem>, SessionStoreError> {
        let rows = sqlx::query(
            "SELECT role, content FROM agent_session_items WHERE session_id = ? ORDER BY position",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SessionStoreError::database("load_items", e))?;

        rows.into_iter()
            .map(|row| {
                let role: String = row
                    .try_get("role")
                    .map_err(|e| SessionStoreError::corrupt(e))?;
                let content: String = row
                    .try_get("content")
                    .map_err(|e| SessionStoreError::corrupt(e))?;
                let role = role.parse::<MessageRole>().unwrap_or(MessageRole::Unknown);
                Ok(MemoryItem { role, content })
            })
            .collect()
    }

    async fn append_items(
        &self,
        session_id: &str,
        items: Vec<MemoryItem>,
    ) -> Result<(), SessionStoreError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SessionStoreError::database("append_items", e))?;

        let next: i64 = sqlx::query(
            "SELECT COALESCE(MAX(position) + 1, 0) AS next FROM agent_session_items WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| SessionStoreError::database("append_items", e))?
        .try_get("next")
        .map_err(|e| SessionStoreError::database("append_items", e))?;

        let created_at = self.clock.now().to_rfc3339();
        for (offset, item) in items.into_iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO agent_session_items (session_id, position, role, content, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(session_id)
            .bind(next + offset as i64)
            .bind(item.role.as_str())
            .bind(&item.content)
            .bind(&created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| SessionStoreError::database("append_items", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| SessionStoreError::database("append_items", e))?;
        Ok(())
    }

    async fn clear_session(&self, session_id: &str) -> Result<(), SessionStoreError> {
        sqlx::query("DELETE FROM agent_session_items WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionStoreError::database("clear_session", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockClockPort;
    use chrono::{TimeZone, Utc};

    async fn memory_in(dir: &tempfile::TempDir) -> SqliteSessionMemory {
        let path = dir.path().join("sessions.db");
        let mut clock = MockClockPort::new();
        clock
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        SqliteSessionMemory::new(path.to_str().unwrap(), Arc::new(clock))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_items_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let memory = memory_in(&dir).await;

        memory
            .append_items(
                "scenario-a",
                vec![
                    MemoryItem::new(MessageRole::User, "Kan vi snakke?"),
                    MemoryItem::new(MessageRole::Assistant, "Jeg har ikke tid."),
                ],
            )
            .await
            .unwrap();
        memory
            .append_items("scenario-a", vec![MemoryItem::new(MessageRole::User, "Fem minutter.")])
            .await
            .unwrap();
        memory
            .append_items("feedback-b", vec![MemoryItem::new(MessageRole::User, "annet")])
            .await
            .unwrap();

        let items = memory.load_items("scenario-a").await.unwrap();

        assert_eq!(
            items,
            vec![
                MemoryItem::new(MessageRole::User, "Kan vi snakke?"),
                MemoryItem::new(MessageRole::Assistant, "Jeg har ikke tid."),
                MemoryItem::new(MessageRole::User, "Fem minutter."),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let memory = memory_in(&dir).await;

        for id in ["scenario-a", "reflection-b"] {
            memory
                .append_items(id, vec![MemoryItem::new(MessageRole::User, "hei")])
                .await
                .unwrap();
        }

        memory.clear_session("scenario-a").await.unwrap();

        assert!(memory.load_items("scenario-a").await.unwrap().is_empty());
        assert_eq!(memory.load_items("reflection-b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_items_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let memory = memory_in(&dir).await;
            memory
                .append_items("scenario-a", vec![MemoryItem::new(MessageRole::Assistant, "Nei.")])
                .await
                .unwrap();
        }

        let reopened = memory_in(&dir).await;
        assert_eq!(reopened.load_items("scenario-a").await.unwrap().len(), 1);
    }
}
