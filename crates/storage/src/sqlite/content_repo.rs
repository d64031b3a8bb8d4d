use course_core::model::{Lesson, LessonId, LessonResources, Module, ModuleId};

use super::SqliteRepository;
use super::mapping::{conn, map_lesson_row, map_module_row, write_error};
use crate::repository::{ContentRepository, LessonRecord, StorageError};

const LIST_LESSONS: &str = r"
    SELECT id, module_id, title, description, video_url, trainer_script,
           visual_suggestion, example_code, resources, order_index
    FROM lessons
    ORDER BY order_index ASC, id ASC
";

const GET_LESSON: &str = r"
    SELECT id, module_id, title, description, video_url, trainer_script,
           visual_suggestion, example_code, resources, order_index
    FROM lessons
    WHERE id = ?1
";

#[async_trait::async_trait]
impl ContentRepository for SqliteRepository {
    async fn list_modules(&self) -> Result<Vec<Module>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, order_index
            FROM modules
            ORDER BY order_index ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_module_row).collect()
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(LIST_LESSONS)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in &rows {
            lessons.push(map_lesson_row(row)?.into_lesson());
        }
        Ok(lessons)
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(GET_LESSON)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| map_lesson_row(&row).map(LessonRecord::into_lesson))
            .transpose()
    }

    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO modules (id, title, description, order_index)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                order_index = excluded.order_index
            ",
        )
        .bind(module.id().as_str())
        .bind(module.title())
        .bind(module.description())
        .bind(i64::from(module.order_index()))
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn delete_module(&self, id: &ModuleId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM modules WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let record = LessonRecord::from_lesson(lesson);
        sqlx::query(
            r"
            INSERT INTO lessons (
                id, module_id, title, description, video_url, trainer_script,
                visual_suggestion, example_code, resources, order_index
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                module_id = excluded.module_id,
                title = excluded.title,
                description = excluded.description,
                video_url = excluded.video_url,
                trainer_script = excluded.trainer_script,
                visual_suggestion = excluded.visual_suggestion,
                example_code = excluded.example_code,
                resources = excluded.resources,
                order_index = excluded.order_index
            ",
        )
        .bind(record.id.as_str())
        .bind(record.module_id.as_str())
        .bind(record.title)
        .bind(record.description)
        .bind(record.video_url)
        .bind(record.trainer_script)
        .bind(record.visual_suggestion)
        .bind(record.example_code)
        .bind(record.resources)
        .bind(i64::from(record.order_index))
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn delete_lesson(&self, id: &LessonId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn update_lesson_resources(
        &self,
        id: &LessonId,
        resources: &LessonResources,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE lessons SET resources = ?1 WHERE id = ?2")
            .bind(resources.to_blob())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
