use crate::db::models::{Role, User, UserCredentials, UserSummary};
use crate::db::sqlite::Storage;
use crate::error::DeskError;

impl Storage {
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, DeskError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, role, created_at FROM users WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Lookup used by login; the only read that returns the password hash.
    pub async fn get_user_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DeskError> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            r#"SELECT id, username, role, password_hash
               FROM users WHERE username = ? AND deleted_at IS NULL"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    pub async fn get_password_hash(&self, id: i64) -> Result<Option<String>, DeskError> {
        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(hash.map(|h| h.0))
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, DeskError> {
        let result = sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(role)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if DeskError::is_unique_violation(&e) {
                    DeskError::Conflict("Username already exists".to_string())
                } else {
                    e.into()
                }
            })?;
        self.get_user(result.last_insert_rowid())
            .await?
            .ok_or(DeskError::NotFound("User"))
    }

    /// Live users with the number of live visitors each has registered.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, DeskError> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"SELECT u.id, u.username, u.role, u.created_at,
                   (SELECT COUNT(*) FROM visitors v
                    WHERE v.created_by = u.id AND v.deleted_at IS NULL) AS visitor_count
               FROM users u
               WHERE u.deleted_at IS NULL
               ORDER BY u.id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn set_role(&self, id: i64, role: Role) -> Result<Option<User>, DeskError> {
        let res = sqlx::query("UPDATE users SET role = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }

    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<bool, DeskError> {
        let res =
            sqlx::query("UPDATE users SET password_hash = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn soft_delete_user(&self, id: i64) -> Result<bool, DeskError> {
        let res = sqlx::query(
            "UPDATE users SET deleted_at = CURRENT_TIMESTAMP WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// True when a user row with this name exists, deleted or not.
    pub async fn username_taken(&self, username: &str) -> Result<bool, DeskError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
