use crate::{
    AppState,
    db::{CatalogExt, TitleExt, TitleFilter, TitleRecord},
    dtos::{
        CategoryDto, GenreDto, InputTitleDto, MIN_TITLE_YEAR, PaginationDto, TitleDto,
        TitleListResponseDto, TitleResponseDto, TitlesQueryDto, year_in_range,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, role_check},
    models::{Genre, UserRole},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{Datelike, Utc};
use tracing::instrument;
use validator::Validate;

/// Router for title endpoints: reads are public, writes admin-only.
pub fn title_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_titles))
        .route(
            "/",
            post(create_title)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{title_id}", get(get_title))
        .route(
            "/{title_id}",
            put(edit_title)
                .delete(delete_title)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

fn to_title_dto(record: TitleRecord, genres: Vec<Genre>) -> TitleDto {
    TitleDto {
        id: record.id,
        name: record.name,
        year: record.year,
        rating: record.rating,
        description: record.description,
        genre: genres
            .into_iter()
            .map(|g| GenreDto {
                name: g.name,
                slug: g.slug,
            })
            .collect(),
        category: match (record.category_name, record.category_slug) {
            (Some(name), Some(slug)) => Some(CategoryDto { name, slug }),
            _ => None,
        },
    }
}

/// Resolve the write payload's category and genre slugs to row ids.
/// An unknown slug is a validation error, not a missing resource.
async fn resolve_slug_refs(
    app_state: &AppState,
    category: Option<&str>,
    genres: &[String],
) -> Result<(Option<i64>, Vec<i64>), HttpError> {
    let category_id = match category {
        Some(slug) => {
            let category = app_state
                .db_client
                .get_category_by_slug(slug)
                .await
                .map_err(|e| {
                    tracing::error!("DB error, resolving category slug: {}", e);
                    HttpError::server_error(ErrorMessage::ServerError.to_string())
                })?
                .ok_or_else(|| {
                    HttpError::bad_request(format!("Unknown category slug: {}", slug))
                })?;
            Some(category.id)
        }
        None => None,
    };

    let mut genre_ids = Vec::with_capacity(genres.len());
    for slug in genres {
        let genre = app_state
            .db_client
            .get_genre_by_slug(slug)
            .await
            .map_err(|e| {
                tracing::error!("DB error, resolving genre slug: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?
            .ok_or_else(|| HttpError::bad_request(format!("Unknown genre slug: {}", slug)))?;
        genre_ids.push(genre.id);
    }

    Ok((category_id, genre_ids))
}

async fn load_title_dto(app_state: &AppState, title_id: i64) -> Result<TitleDto, HttpError> {
    let record = app_state
        .db_client
        .get_title(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::TitleNotFound.to_string()))?;

    let genres = app_state
        .db_client
        .get_title_genres(title_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title genres: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(to_title_dto(record, genres))
}

/// List titles with combinable filters: category slug, genre slug, name
/// substring, exact year. Public; each item carries the computed rating.
#[instrument(skip(app_state))]
pub async fn get_titles(
    Query(params): Query<TitlesQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_titles input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);

    let filter = TitleFilter {
        category_slug: params.category.clone(),
        genre_slug: params.genre.clone(),
        name: params.name.clone(),
        year: params.year,
    };

    let records = app_state
        .db_client
        .get_titles(&filter, page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting titles: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_title_count(&filter)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting title count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let mut data = Vec::with_capacity(records.len());
    for record in records {
        let genres = app_state
            .db_client
            .get_title_genres(record.id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting title genres: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;
        data.push(to_title_dto(record, genres));
    }

    let response = Json(TitleListResponseDto {
        status: "success".to_string(),
        data,
        pagination: PaginationDto::new(page, limit, total),
    });
    tracing::info!("get_titles successful");
    Ok(response)
}

/// Get a single title with nested category/genres and rating. Public.
#[instrument(skip(app_state))]
pub async fn get_title(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let data = load_title_dto(&app_state, title_id).await?;

    let response = Json(TitleResponseDto {
        status: "success".to_string(),
        data,
    });
    tracing::info!("get_title successful");
    Ok(response)
}

/// Create a title (admin only). Category and genres referenced by slug.
#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn create_title(
    State(app_state): State<AppState>,
    Json(body): Json<InputTitleDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_title input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    if !year_in_range(body.year) {
        return Err(HttpError::bad_request(format!(
            "Year must be between {} and {}",
            MIN_TITLE_YEAR,
            Utc::now().year()
        )));
    }

    let (category_id, genre_ids) =
        resolve_slug_refs(&app_state, body.category.as_deref(), &body.genre).await?;

    let title = app_state
        .db_client
        .save_title(
            &body.name,
            body.year,
            body.description.as_deref(),
            category_id,
            &genre_ids,
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving title: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let data = load_title_dto(&app_state, title.id).await?;

    let response = Json(TitleResponseDto {
        status: "success".to_string(),
        data,
    });
    tracing::info!("create_title successful");
    Ok((StatusCode::CREATED, response))
}

/// Replace a title's fields and genre links (admin only).
#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn edit_title(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<InputTitleDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_title input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    if !year_in_range(body.year) {
        return Err(HttpError::bad_request(format!(
            "Year must be between {} and {}",
            MIN_TITLE_YEAR,
            Utc::now().year()
        )));
    }

    let (category_id, genre_ids) =
        resolve_slug_refs(&app_state, body.category.as_deref(), &body.genre).await?;

    app_state
        .db_client
        .edit_title(
            title_id,
            &body.name,
            body.year,
            body.description.as_deref(),
            category_id,
            &genre_ids,
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found(ErrorMessage::TitleNotFound.to_string())
            }
            _ => {
                tracing::error!("DB error, editing title: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let data = load_title_dto(&app_state, title_id).await?;

    let response = Json(TitleResponseDto {
        status: "success".to_string(),
        data,
    });
    tracing::info!("edit_title successful");
    Ok(response)
}

/// Delete a title (admin only); reviews and their comments cascade.
#[instrument(skip(app_state))]
pub async fn delete_title(
    Path(title_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_title(title_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found(ErrorMessage::TitleNotFound.to_string())
            }
            _ => {
                tracing::error!("DB error, deleting title: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_title successful");
    Ok(StatusCode::NO_CONTENT)
}
