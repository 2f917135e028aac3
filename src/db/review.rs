use super::DBClient;
use crate::dtos::ReviewDto;
use crate::models::Review;
use uuid::Uuid;

/// Review database operations trait
pub trait ReviewExt {
    /// Paginated reviews of a title, ordered by publication date.
    async fn get_reviews(
        &self,
        title_id: i64,
        page: i32,
        limit: i32,
    ) -> Result<Vec<ReviewDto>, sqlx::Error>;

    async fn get_review_count(&self, title_id: i64) -> Result<i64, sqlx::Error>;

    /// Raw review row, used for ownership checks.
    async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Review>, sqlx::Error>;

    /// Review with the author's username joined in.
    async fn get_review_dto(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<ReviewDto>, sqlx::Error>;

    /// Insert a review. The (author, title) unique constraint surfaces as a
    /// database unique violation when the author already reviewed the title.
    async fn save_review(
        &self,
        title_id: i64,
        author_id: Uuid,
        text: &str,
        score: i32,
    ) -> Result<ReviewDto, sqlx::Error>;

    async fn edit_review(
        &self,
        review_id: i64,
        text: &str,
        score: i32,
    ) -> Result<ReviewDto, sqlx::Error>;

    /// Delete a review; its comments cascade.
    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error>;
}

impl ReviewExt for DBClient {
    async fn get_reviews(
        &self,
        title_id: i64,
        page: i32,
        limit: i32,
    ) -> Result<Vec<ReviewDto>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let reviews = sqlx::query_as::<_, ReviewDto>(
            "SELECT r.id, u.username AS author, r.text, r.score, r.pub_date
             FROM reviews r
             INNER JOIN users u ON r.author_id = u.id
             WHERE r.title_id = $1
             ORDER BY r.pub_date
             LIMIT $2 OFFSET $3",
        )
        .bind(title_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    async fn get_review_count(&self, title_id: i64) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Review>, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, title_id, author_id, text, score, pub_date
             FROM reviews
             WHERE id = $1 AND title_id = $2",
        )
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn get_review_dto(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<ReviewDto>, sqlx::Error> {
        let review = sqlx::query_as::<_, ReviewDto>(
            "SELECT r.id, u.username AS author, r.text, r.score, r.pub_date
             FROM reviews r
             INNER JOIN users u ON r.author_id = u.id
             WHERE r.id = $1 AND r.title_id = $2",
        )
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    async fn save_review(
        &self,
        title_id: i64,
        author_id: Uuid,
        text: &str,
        score: i32,
    ) -> Result<ReviewDto, sqlx::Error> {
        let review = sqlx::query_as::<_, ReviewDto>(
            "WITH new_review AS (
                INSERT INTO reviews (title_id, author_id, text, score)
                VALUES ($1, $2, $3, $4)
                RETURNING id, author_id, text, score, pub_date
            )
            SELECT nr.id, u.username AS author, nr.text, nr.score, nr.pub_date
            FROM new_review nr
            JOIN users u ON nr.author_id = u.id",
        )
        .bind(title_id)
        .bind(author_id)
        .bind(text)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        Ok(review)
    }

    async fn edit_review(
        &self,
        review_id: i64,
        text: &str,
        score: i32,
    ) -> Result<ReviewDto, sqlx::Error> {
        let review = sqlx::query_as::<_, ReviewDto>(
            "WITH updated_review AS (
                UPDATE reviews
                SET text = $2, score = $3
                WHERE id = $1
                RETURNING id, author_id, text, score, pub_date
            )
            SELECT ur.id, u.username AS author, ur.text, ur.score, ur.pub_date
            FROM updated_review ur
            JOIN users u ON ur.author_id = u.id",
        )
        .bind(review_id)
        .bind(text)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        Ok(review)
    }

    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
