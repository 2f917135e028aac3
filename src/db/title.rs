use super::DBClient;
use crate::models::{Genre, Title};

/// Title row joined with its category and the aggregated review score.
/// `rating` is NULL when the title has no reviews.
#[derive(Debug, sqlx::FromRow)]
pub struct TitleRecord {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Optional listing filters; every field combines with AND.
#[derive(Debug, Default)]
pub struct TitleFilter {
    pub category_slug: Option<String>,
    pub genre_slug: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

// $1..$4 are the listing filters, $5 an optional id; unused filters are
// bound as NULL.
const TITLE_SELECT: &str = "
    SELECT t.id, t.name, t.year, t.description,
           AVG(r.score)::float8 AS rating,
           c.name AS category_name, c.slug AS category_slug
    FROM titles t
    LEFT JOIN categories c ON t.category_id = c.id
    LEFT JOIN reviews r ON r.title_id = t.id
    WHERE ($1::text IS NULL OR c.slug = $1)
      AND ($2::text IS NULL OR EXISTS (
            SELECT 1 FROM title_genres tg
            JOIN genres g ON tg.genre_id = g.id
            WHERE tg.title_id = t.id AND g.slug = $2))
      AND ($3::text IS NULL OR t.name ILIKE '%' || $3 || '%')
      AND ($4::int IS NULL OR t.year = $4)
      AND ($5::bigint IS NULL OR t.id = $5)
    GROUP BY t.id, c.name, c.slug";

/// Title database operations trait
pub trait TitleExt {
    async fn get_titles(
        &self,
        filter: &TitleFilter,
        page: i32,
        limit: i32,
    ) -> Result<Vec<TitleRecord>, sqlx::Error>;

    async fn get_title_count(&self, filter: &TitleFilter) -> Result<i64, sqlx::Error>;

    async fn get_title(&self, title_id: i64) -> Result<Option<TitleRecord>, sqlx::Error>;

    /// Genres linked to a title, for nesting into the read payload.
    async fn get_title_genres(&self, title_id: i64) -> Result<Vec<Genre>, sqlx::Error>;

    /// Insert a title together with its genre links.
    async fn save_title(
        &self,
        name: &str,
        year: i32,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: &[i64],
    ) -> Result<Title, sqlx::Error>;

    /// Replace a title's fields and genre links.
    async fn edit_title(
        &self,
        title_id: i64,
        name: &str,
        year: i32,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: &[i64],
    ) -> Result<Title, sqlx::Error>;

    /// Delete a title; its reviews (and their comments) cascade.
    async fn delete_title(&self, title_id: i64) -> Result<(), sqlx::Error>;
}

impl TitleExt for DBClient {
    async fn get_titles(
        &self,
        filter: &TitleFilter,
        page: i32,
        limit: i32,
    ) -> Result<Vec<TitleRecord>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let query = format!("{TITLE_SELECT} ORDER BY t.id LIMIT $6 OFFSET $7");

        let titles = sqlx::query_as::<_, TitleRecord>(&query)
            .bind(filter.category_slug.as_deref())
            .bind(filter.genre_slug.as_deref())
            .bind(filter.name.as_deref())
            .bind(filter.year)
            .bind(None::<i64>)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(titles)
    }

    async fn get_title_count(&self, filter: &TitleFilter) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM titles t
             LEFT JOIN categories c ON t.category_id = c.id
             WHERE ($1::text IS NULL OR c.slug = $1)
               AND ($2::text IS NULL OR EXISTS (
                     SELECT 1 FROM title_genres tg
                     JOIN genres g ON tg.genre_id = g.id
                     WHERE tg.title_id = t.id AND g.slug = $2))
               AND ($3::text IS NULL OR t.name ILIKE '%' || $3 || '%')
               AND ($4::int IS NULL OR t.year = $4)",
        )
        .bind(filter.category_slug.as_deref())
        .bind(filter.genre_slug.as_deref())
        .bind(filter.name.as_deref())
        .bind(filter.year)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn get_title(&self, title_id: i64) -> Result<Option<TitleRecord>, sqlx::Error> {
        let title = sqlx::query_as::<_, TitleRecord>(TITLE_SELECT)
            .bind(None::<String>)
            .bind(None::<String>)
            .bind(None::<String>)
            .bind(None::<i32>)
            .bind(title_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(title)
    }

    async fn get_title_genres(&self, title_id: i64) -> Result<Vec<Genre>, sqlx::Error> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT g.id, g.name, g.slug
             FROM title_genres tg
             JOIN genres g ON tg.genre_id = g.id
             WHERE tg.title_id = $1
             ORDER BY g.name",
        )
        .bind(title_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    async fn save_title(
        &self,
        name: &str,
        year: i32,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: &[i64],
    ) -> Result<Title, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let title = sqlx::query_as::<_, Title>(
            "INSERT INTO titles (name, year, description, category_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, year, description, category_id",
        )
        .bind(name)
        .bind(year)
        .bind(description)
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        for genre_id in genre_ids {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(title.id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(title)
    }

    async fn edit_title(
        &self,
        title_id: i64,
        name: &str,
        year: i32,
        description: Option<&str>,
        category_id: Option<i64>,
        genre_ids: &[i64],
    ) -> Result<Title, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let title = sqlx::query_as::<_, Title>(
            "UPDATE titles
             SET name = $2, year = $3, description = $4, category_id = $5
             WHERE id = $1
             RETURNING id, name, year, description, category_id",
        )
        .bind(title_id)
        .bind(name)
        .bind(year)
        .bind(description)
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title_id)
            .execute(&mut *tx)
            .await?;

        for genre_id in genre_ids {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(title_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(title)
    }

    async fn delete_title(&self, title_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(title_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
