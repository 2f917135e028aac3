use super::DBClient;
use crate::models::{Category, Genre};

/// Category and genre database operations trait.
///
/// The two tables have the same shape but are addressed separately; slugs
/// are unique per table, not globally.
pub trait CatalogExt {
    /// List categories, optionally filtered by exact name.
    async fn get_categories(
        &self,
        name: Option<&str>,
        page: i32,
        limit: i32,
    ) -> Result<Vec<Category>, sqlx::Error>;

    async fn get_category_count(&self, name: Option<&str>) -> Result<i64, sqlx::Error>;

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, sqlx::Error>;

    async fn save_category(&self, name: &str, slug: &str) -> Result<Category, sqlx::Error>;

    /// Delete category by slug. Titles referencing it keep existing with a
    /// NULL category (ON DELETE SET NULL).
    async fn delete_category(&self, slug: &str) -> Result<(), sqlx::Error>;

    /// List genres, optionally filtered by exact name.
    async fn get_genres(
        &self,
        name: Option<&str>,
        page: i32,
        limit: i32,
    ) -> Result<Vec<Genre>, sqlx::Error>;

    async fn get_genre_count(&self, name: Option<&str>) -> Result<i64, sqlx::Error>;

    async fn get_genre_by_slug(&self, slug: &str) -> Result<Option<Genre>, sqlx::Error>;

    async fn save_genre(&self, name: &str, slug: &str) -> Result<Genre, sqlx::Error>;

    async fn delete_genre(&self, slug: &str) -> Result<(), sqlx::Error>;
}

impl CatalogExt for DBClient {
    async fn get_categories(
        &self,
        name: Option<&str>,
        page: i32,
        limit: i32,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug FROM categories
             WHERE ($1::text IS NULL OR name = $1)
             ORDER BY name
             LIMIT $2 OFFSET $3",
        )
        .bind(name)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn get_category_count(&self, name: Option<&str>) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE ($1::text IS NULL OR name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, sqlx::Error> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    async fn save_category(&self, name: &str, slug: &str) -> Result<Category, sqlx::Error> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn delete_category(&self, slug: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_genres(
        &self,
        name: Option<&str>,
        page: i32,
        limit: i32,
    ) -> Result<Vec<Genre>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let genres = sqlx::query_as::<_, Genre>(
            "SELECT id, name, slug FROM genres
             WHERE ($1::text IS NULL OR name = $1)
             ORDER BY name
             LIMIT $2 OFFSET $3",
        )
        .bind(name)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    async fn get_genre_count(&self, name: Option<&str>) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM genres WHERE ($1::text IS NULL OR name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn get_genre_by_slug(&self, slug: &str) -> Result<Option<Genre>, sqlx::Error> {
        let genre =
            sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(genre)
    }

    async fn save_genre(&self, name: &str, slug: &str) -> Result<Genre, sqlx::Error> {
        let genre = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(genre)
    }

    async fn delete_genre(&self, slug: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
