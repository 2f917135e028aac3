use crate::{
    AppState,
    db::CatalogExt,
    dtos::{
        CatalogQueryDto, CategoryDto, CategoryListResponseDto, CategoryResponseDto, GenreDto,
        GenreListResponseDto, GenreResponseDto, InputCatalogItemDto, PaginationDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, role_check},
    models::UserRole,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tracing::instrument;
use validator::Validate;

// Categories and genres share the catalog shape: slug-addressed,
// list/create/delete only, public reads, admin writes.

/// Router for category endpoints
pub fn category_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_categories))
        .route(
            "/",
            post(create_category)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{slug}",
            delete(delete_category)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Router for genre endpoints
pub fn genre_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_genres))
        .route(
            "/",
            post(create_genre)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{slug}",
            delete(delete_genre)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// List categories; `?name=` filters by exact name. Public.
#[instrument(skip(app_state))]
pub async fn get_categories(
    Query(params): Query<CatalogQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_categories input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let categories = app_state
        .db_client
        .get_categories(params.name.as_deref(), page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting categories: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_category_count(params.name.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting category count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(CategoryListResponseDto {
        status: "success".to_string(),
        data: categories
            .into_iter()
            .map(|c| CategoryDto {
                name: c.name,
                slug: c.slug,
            })
            .collect(),
        pagination: PaginationDto::new(page, limit, total),
    });
    tracing::info!("get_categories successful");
    Ok(response)
}

/// Create a category (admin only). Duplicate slug is a validation error.
#[instrument(skip(app_state, body), fields(slug = %body.slug))]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(body): Json<InputCatalogItemDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_category input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let category = app_state
        .db_client
        .save_category(&body.name, &body.slug)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::error!("create_category unique violation: {}", db_err);
                HttpError::bad_request(ErrorMessage::DuplicateSlug.to_string())
            }
            _ => {
                tracing::error!("DB error, saving category: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let response = Json(CategoryResponseDto {
        status: "success".to_string(),
        data: CategoryDto {
            name: category.name,
            slug: category.slug,
        },
    });
    tracing::info!("create_category successful");
    Ok((StatusCode::CREATED, response))
}

/// Delete a category by slug (admin only). Titles that referenced it keep
/// existing without a category.
#[instrument(skip(app_state))]
pub async fn delete_category(
    Path(slug): Path<String>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_category(&slug)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found(ErrorMessage::CategoryNotFound.to_string())
            }
            _ => {
                tracing::error!("DB error, deleting category: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_category successful");
    Ok(StatusCode::NO_CONTENT)
}

/// List genres; `?name=` filters by exact name. Public.
#[instrument(skip(app_state))]
pub async fn get_genres(
    Query(params): Query<CatalogQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_genres input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let genres = app_state
        .db_client
        .get_genres(params.name.as_deref(), page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting genres: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_genre_count(params.name.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting genre count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(GenreListResponseDto {
        status: "success".to_string(),
        data: genres
            .into_iter()
            .map(|g| GenreDto {
                name: g.name,
                slug: g.slug,
            })
            .collect(),
        pagination: PaginationDto::new(page, limit, total),
    });
    tracing::info!("get_genres successful");
    Ok(response)
}

/// Create a genre (admin only). Duplicate slug is a validation error.
#[instrument(skip(app_state, body), fields(slug = %body.slug))]
pub async fn create_genre(
    State(app_state): State<AppState>,
    Json(body): Json<InputCatalogItemDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_genre input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let genre = app_state
        .db_client
        .save_genre(&body.name, &body.slug)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::error!("create_genre unique violation: {}", db_err);
                HttpError::bad_request(ErrorMessage::DuplicateSlug.to_string())
            }
            _ => {
                tracing::error!("DB error, saving genre: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let response = Json(GenreResponseDto {
        status: "success".to_string(),
        data: GenreDto {
            name: genre.name,
            slug: genre.slug,
        },
    });
    tracing::info!("create_genre successful");
    Ok((StatusCode::CREATED, response))
}

/// Delete a genre by slug (admin only).
#[instrument(skip(app_state))]
pub async fn delete_genre(
    Path(slug): Path<String>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_genre(&slug)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found(ErrorMessage::GenreNotFound.to_string())
            }
            _ => {
                tracing::error!("DB error, deleting genre: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_genre successful");
    Ok(StatusCode::NO_CONTENT)
}
