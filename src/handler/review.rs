use crate::{
    AppState,
    db::{ReviewExt, TitleExt},
    dtos::{
        InputReviewDto, PaginationDto, RequestQueryDto, ReviewListResponseDto,
        SingleReviewResponseDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{JWTAuthMiddleware, auth, can_modify},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tracing::instrument;
use validator::Validate;

/// Router for review endpoints nested under /titles/{title_id}/reviews.
///
/// Reads are public; creating requires authentication; editing and deleting
/// require ownership or the moderator/admin role.
pub fn review_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_reviews))
        .route(
            "/",
            post(create_review)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{review_id}", get(get_review))
        .route(
            "/{review_id}",
            put(edit_review)
                .delete(delete_review)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

async fn ensure_title_exists(app_state: &AppState, title_id: i64) -> Result<(), HttpError> {
    app_state
        .db_client
        .get_title(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TitleNotFound.to_string()))?;

    Ok(())
}

/// Paginated reviews of a title, ordered by publication date. Public.
#[instrument(skip(app_state))]
pub async fn get_reviews(
    Path(title_id): Path<i64>,
    Query(params): Query<RequestQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_reviews input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    ensure_title_exists(&app_state, title_id).await?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let reviews = app_state
        .db_client
        .get_reviews(title_id, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting reviews: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_review_count(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(ReviewListResponseDto {
        status: "success".to_string(),
        data: reviews,
        pagination: PaginationDto::new(page, limit, total),
    });
    tracing::info!("get_reviews successful");
    Ok(response)
}

/// Get a single review of a title. Public.
#[instrument(skip(app_state))]
pub async fn get_review(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state
        .db_client
        .get_review_dto(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReviewNotFound.to_string()))?;

    let response = Json(SingleReviewResponseDto {
        status: "success".to_string(),
        data: review,
    });
    tracing::info!("get_review successful");
    Ok(response)
}

/// Post a review on a title.
///
/// One review per (author, title): a second attempt is a validation error.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_review(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_review input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    ensure_title_exists(&app_state, title_id).await?;

    let review = app_state
        .db_client
        .save_review(title_id, jwt.user.id, &body.text, body.score)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::error!("create_review unique violation: {}", db_err);
                HttpError::bad_request(ErrorMessage::DuplicateReview.to_string())
            }
            _ => {
                tracing::error!("DB error, saving review: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let response = Json(SingleReviewResponseDto {
        status: "success".to_string(),
        data: review,
    });
    tracing::info!("create_review successful");
    Ok((StatusCode::CREATED, response))
}

/// Edit a review: its author, a moderator, or an admin.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn edit_review(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_review input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let review = app_state
        .db_client
        .get_review(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReviewNotFound.to_string()))?;

    if !can_modify(jwt.user.role, jwt.user.id, review.author_id) {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let review = app_state
        .db_client
        .edit_review(review_id, &body.text, body.score)
        .await
        .map_err(|e| {
            tracing::error!("DB error, editing review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(SingleReviewResponseDto {
        status: "success".to_string(),
        data: review,
    });
    tracing::info!("edit_review successful");
    Ok(response)
}

/// Delete a review: its author, a moderator, or an admin. Comments cascade.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_review(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state
        .db_client
        .get_review(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReviewNotFound.to_string()))?;

    if !can_modify(jwt.user.role, jwt.user.id, review.author_id) {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    app_state
        .db_client
        .delete_review(review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("delete_review successful");
    Ok(StatusCode::NO_CONTENT)
}
