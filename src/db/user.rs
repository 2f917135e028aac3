use super::DBClient;
use crate::models::{User, UserRole};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, username, email, role, bio, confirmation_code, active, created_at, updated_at";

/// User database operations trait
pub trait UserExt {
    /// Get a single user by id, username, or email.
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Get the user matching an (email, confirmation_code) pair.
    async fn get_user_by_email_and_code(
        &self,
        email: &str,
        confirmation_code: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Get paginated list of all users.
    async fn get_users(&self, page: i32, limit: i32) -> Result<Vec<User>, sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;

    /// Create a user through the admin collection endpoint.
    async fn save_user(
        &self,
        username: &str,
        email: &str,
        role: UserRole,
        bio: &str,
    ) -> Result<User, sqlx::Error>;

    /// Create an inactive user pending code exchange; username defaults to
    /// the email address.
    async fn save_pending_user(
        &self,
        email: &str,
        confirmation_code: &str,
    ) -> Result<User, sqlx::Error>;

    /// Store a fresh confirmation code, replacing any outstanding one.
    async fn set_confirmation_code(
        &self,
        user_id: Uuid,
        confirmation_code: &str,
    ) -> Result<(), sqlx::Error>;

    /// Activate the account and clear the stored code (single use).
    async fn activate_user(&self, user_id: Uuid) -> Result<User, sqlx::Error>;

    /// Partial update of the user addressed by `username`; None leaves the
    /// column unchanged.
    async fn update_user(
        &self,
        username: &str,
        new_username: Option<&str>,
        new_email: Option<&str>,
        new_role: Option<UserRole>,
        new_bio: Option<&str>,
    ) -> Result<User, sqlx::Error>;

    /// Partial self-update; role is deliberately not updatable here.
    async fn update_me(
        &self,
        user_id: Uuid,
        new_username: Option<&str>,
        new_email: Option<&str>,
        new_bio: Option<&str>,
    ) -> Result<User, sqlx::Error>;

    /// Delete user by username.
    async fn delete_user(&self, username: &str) -> Result<(), sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_user_by_email_and_code(
        &self,
        email: &str,
        confirmation_code: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND confirmation_code = $2"
        ))
        .bind(email)
        .bind(confirmation_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_users(&self, page: i32, limit: i32) -> Result<Vec<User>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username LIMIT $1 OFFSET $2"
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn save_user(
        &self,
        username: &str,
        email: &str,
        role: UserRole,
        bio: &str,
    ) -> Result<User, sqlx::Error> {
        // Admin-created accounts are active immediately.
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, role, bio, active)
             VALUES ($1, $2, $3, $4, TRUE)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(role)
        .bind(bio)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_pending_user(
        &self,
        email: &str,
        confirmation_code: &str,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, confirmation_code, active)
             VALUES ($1, $2, $3, FALSE)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(email)
        .bind(confirmation_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_confirmation_code(
        &self,
        user_id: Uuid,
        confirmation_code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET confirmation_code = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(confirmation_code)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn activate_user(&self, user_id: Uuid) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET active = TRUE, confirmation_code = NULL, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(
        &self,
        username: &str,
        new_username: Option<&str>,
        new_email: Option<&str>,
        new_role: Option<UserRole>,
        new_bio: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET username = COALESCE($2, username),
                 email = COALESCE($3, email),
                 role = COALESCE($4, role),
                 bio = COALESCE($5, bio),
                 updated_at = NOW()
             WHERE username = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(new_username)
        .bind(new_email)
        .bind(new_role)
        .bind(new_bio)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(sqlx::Error::RowNotFound)
    }

    async fn update_me(
        &self,
        user_id: Uuid,
        new_username: Option<&str>,
        new_email: Option<&str>,
        new_bio: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET username = COALESCE($2, username),
                 email = COALESCE($3, email),
                 bio = COALESCE($4, bio),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(new_username)
        .bind(new_email)
        .bind(new_bio)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, username: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
