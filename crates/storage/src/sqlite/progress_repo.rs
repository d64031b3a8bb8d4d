use course_core::model::{CompletionRecord, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_completion_row, write_error};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn list_completions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, lesson_id, completed_at
            FROM lesson_completions
            WHERE user_id = ?1
            ORDER BY completed_at ASC, id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_completion_row).collect()
    }

    async fn insert_completion(&self, record: &CompletionRecord) -> Result<(), StorageError> {
        // UNIQUE(user_id, lesson_id) turns a repeat into StorageError::Conflict.
        sqlx::query(
            r"
            INSERT INTO lesson_completions (user_id, lesson_id, completed_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(record.user_id.as_str())
        .bind(record.lesson_id.as_str())
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }
}
