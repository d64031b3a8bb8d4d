use course_core::model::{
    CompletionRecord, LessonId, Module, ModuleId, Profile, Role, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{LessonRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Classify a failed write: uniqueness violations become `Conflict`, dangling
/// references become `NotFound`.
pub(crate) fn write_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    conn(e)
}

fn order_index(row: &SqliteRow) -> Result<i32, StorageError> {
    let raw: i64 = row.try_get("order_index").map_err(ser)?;
    i32::try_from(raw).map_err(|_| StorageError::Serialization(format!("order_index overflow: {raw}")))
}

pub(crate) fn map_module_row(row: &SqliteRow) -> Result<Module, StorageError> {
    Module::new(
        ModuleId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        order_index(row)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<LessonRecord, StorageError> {
    Ok(LessonRecord {
        id: LessonId::new(row.try_get::<String, _>("id").map_err(ser)?),
        module_id: ModuleId::new(row.try_get::<String, _>("module_id").map_err(ser)?),
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        video_url: row.try_get("video_url").map_err(ser)?,
        trainer_script: row.try_get("trainer_script").map_err(ser)?,
        visual_suggestion: row.try_get("visual_suggestion").map_err(ser)?,
        example_code: row.try_get("example_code").map_err(ser)?,
        resources: row.try_get("resources").map_err(ser)?,
        order_index: order_index(row)?,
    })
}

pub(crate) fn map_completion_row(row: &SqliteRow) -> Result<CompletionRecord, StorageError> {
    Ok(CompletionRecord::new(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        LessonId::new(row.try_get::<String, _>("lesson_id").map_err(ser)?),
        row.try_get("completed_at").map_err(ser)?,
    ))
}

pub(crate) fn map_profile_row(row: &SqliteRow) -> Result<Profile, StorageError> {
    Ok(Profile {
        id: UserId::new(row.try_get::<String, _>("id").map_err(ser)?),
        email: row.try_get("email").map_err(ser)?,
        full_name: row.try_get("full_name").map_err(ser)?,
    })
}

pub(crate) fn parse_role(raw: &str) -> Result<Role, StorageError> {
    raw.parse::<Role>().map_err(ser)
}
