use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role stored in the PostgreSQL ENUM `user_role`.
///
/// Moderators may edit or delete any review/comment; admins additionally
/// manage users and the catalog.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Row of the `users` table.
///
/// `confirmation_code` is set while a registration code is outstanding and
/// cleared once it has been exchanged for a token pair. `active` flips to
/// true on the first successful exchange.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub bio: String,
    pub confirmation_code: Option<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row of the `categories` table. `slug` is the external identifier.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Row of the `genres` table; linked to titles through `title_genres`.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Row of the `titles` table. The category reference is nullable and set to
/// NULL when the category is deleted.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Row of the `reviews` table. One review per (author, title) pair,
/// enforced by a unique constraint.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: i64,
    pub title_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub score: i32,
    pub pub_date: DateTime<Utc>,
}

/// Row of the `comments` table.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Comment {
    pub id: i64,
    pub review_id: i64,
    pub author_id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_to_str_matches_database_labels() {
        assert_eq!(UserRole::User.to_str(), "user");
        assert_eq!(UserRole::Moderator.to_str(), "moderator");
        assert_eq!(UserRole::Admin.to_str(), "admin");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserRole::Moderator).unwrap(),
            r#""moderator""#
        );
        let parsed: UserRole = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(parsed, UserRole::Admin);
    }

    #[test]
    fn only_admin_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Moderator.is_admin());
        assert!(!UserRole::User.is_admin());
    }
}
