use crate::{
    AppState,
    db::{CommentExt, ReviewExt},
    dtos::{
        CommentListResponseDto, InputCommentDto, PaginationDto, RequestQueryDto,
        SingleCommentResponseDto,
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

/// Router for comment endpoints nested under
/// /titles/{title_id}/reviews/{review_id}/comments.
///
/// Same policy as reviews: public reads, authenticated create, writes by
/// the author or moderator/admin.
pub fn comment_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_comments))
        .route(
            "/",
            post(create_comment)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{comment_id}", get(get_comment))
        .route(
            "/{comment_id}",
            put(edit_comment)
                .delete(delete_comment)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Resolve the title/review path pair; 404 when the chain is broken.
async fn ensure_review_exists(
    app_state: &AppState,
    title_id: i64,
    review_id: i64,
) -> Result<(), HttpError> {
    app_state
        .db_client
        .get_review(title_id, review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::ReviewNotFound.to_string()))?;

    Ok(())
}

/// Paginated comments of a review, ordered by publication date. Public.
#[instrument(skip(app_state))]
pub async fn get_comments(
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(params): Query<RequestQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_comments input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    ensure_review_exists(&app_state, title_id, review_id).await?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let comments = app_state
        .db_client
        .get_comments(review_id, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comments: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_comment_count(review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(CommentListResponseDto {
        status: "success".to_string(),
        data: comments,
        pagination: PaginationDto::new(page, limit, total),
    });
    tracing::info!("get_comments successful");
    Ok(response)
}

/// Get a single comment. Public.
#[instrument(skip(app_state))]
pub async fn get_comment(
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_review_exists(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .get_comment_dto(review_id, comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::CommentNotFound.to_string()))?;

    let response = Json(SingleCommentResponseDto {
        status: "success".to_string(),
        data: comment,
    });
    tracing::info!("get_comment successful");
    Ok(response)
}

/// Comment on a review.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn create_comment(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_comment input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    ensure_review_exists(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .save_comment(review_id, jwt.user.id, &body.text)
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(SingleCommentResponseDto {
        status: "success".to_string(),
        data: comment,
    });
    tracing::info!("create_comment successful");
    Ok((StatusCode::CREATED, response))
}

/// Edit a comment: its author, a moderator, or an admin.
#[instrument(skip(app_state, body, jwt), fields(username = %jwt.user.username))]
pub async fn edit_comment(
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_comment input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    ensure_review_exists(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .get_comment(review_id, comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::CommentNotFound.to_string()))?;

    if !can_modify(jwt.user.role, jwt.user.id, comment.author_id) {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let comment = app_state
        .db_client
        .edit_comment(comment_id, &body.text)
        .await
        .map_err(|e| {
            tracing::error!("DB error, editing comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(SingleCommentResponseDto {
        status: "success".to_string(),
        data: comment,
    });
    tracing::info!("edit_comment successful");
    Ok(response)
}

/// Delete a comment: its author, a moderator, or an admin.
#[instrument(skip(app_state, jwt), fields(username = %jwt.user.username))]
pub async fn delete_comment(
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_review_exists(&app_state, title_id, review_id).await?;

    let comment = app_state
        .db_client
        .get_comment(review_id, comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::CommentNotFound.to_string()))?;

    if !can_modify(jwt.user.role, jwt.user.id, comment.author_id) {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    app_state
        .db_client
        .delete_comment(comment_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting comment: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("delete_comment successful");
    Ok(StatusCode::NO_CONTENT)
}
