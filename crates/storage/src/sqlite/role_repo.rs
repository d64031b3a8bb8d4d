use async_trait::async_trait;
use course_core::model::{Profile, Role, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_profile_row, parse_role, ser, write_error};
use crate::repository::{RoleRepository, StorageError};

#[async_trait]
impl RoleRepository for SqliteRepository {
    async fn list_profiles(&self) -> Result<Vec<Profile>, StorageError> {
        let rows = sqlx::query("SELECT id, email, full_name FROM profiles ORDER BY email ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_profile_row).collect()
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO profiles (id, email, full_name)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                full_name = excluded.full_name
            ",
        )
        .bind(profile.id.as_str())
        .bind(&profile.email)
        .bind(profile.full_name.as_deref())
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn roles_for(&self, user_id: &UserId) -> Result<Vec<Role>, StorageError> {
        let rows = sqlx::query("SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY role ASC")
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("role").map_err(ser)?;
            roles.push(parse_role(&raw)?);
        }
        Ok(roles)
    }

    async fn grant_role(&self, user_id: &UserId, role: Role) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?1, ?2)")
            .bind(user_id.as_str())
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(())
    }

    async fn revoke_role(&self, user_id: &UserId, role: Role) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM user_roles WHERE user_id = ?1 AND role = ?2")
            .bind(user_id.as_str())
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
