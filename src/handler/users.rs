use crate::{
    AppState,
    db::UserExt,
    dtos::{
        CreateUserDto, FilterUserDto, RequestQueryDto, UpdateMeDto, UpdateUserDto, UserData,
        UserListResponseDto, UserResponseDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{JWTAuthMiddleware, role_check},
    models::UserRole,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;
use validator::Validate;

/// Router for user management endpoints.
///
/// The auth middleware is applied to the whole nest in routes.rs; the
/// collection endpoints additionally require the admin role. Accounts are
/// addressed by username, not id.
pub fn users_handler() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(get_me).patch(update_me).layer(middleware::from_fn(|req, next| {
                role_check(
                    req,
                    next,
                    vec![UserRole::Admin, UserRole::Moderator, UserRole::User],
                )
            })),
        )
        .route(
            "/",
            get(get_users)
                .post(create_user)
                .layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                })),
        )
        .route(
            "/{username}",
            get(get_user)
                .patch(update_user)
                .delete(delete_user)
                .layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                })),
        )
}

/// Get the authenticated user's own profile.
#[instrument(skip(user), fields(username = %user.user.username))]
pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let filtered_user = FilterUserDto::filter_user(&user.user);

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    };
    tracing::info!("get_me successful");
    Ok(Json(response))
}

/// Partial self-update. The role field is not accepted on this path.
#[instrument(skip(app_state, user, body), fields(username = %user.user.username))]
pub async fn update_me(
    State(app_state): State<AppState>,
    Extension(user): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateMeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_me input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let result = app_state
        .db_client
        .update_me(
            user.user.id,
            body.username.as_deref(),
            body.email.as_deref(),
            body.bio.as_deref(),
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::error!("update_me unique violation: {}", db_err);
                HttpError::bad_request("Username or email already exists".to_string())
            }
            _ => {
                tracing::error!("DB error, updating own profile: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&result),
        },
    };
    tracing::info!("update_me successful");
    Ok(Json(response))
}

/// Get paginated list of all users (admin only).
#[instrument(skip(app_state))]
pub async fn get_users(
    Query(query_params): Query<RequestQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate().map_err(|e| {
        tracing::error!("Invalid get_users input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);

    let users = app_state
        .db_client
        .get_users(page, limit)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting users: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user_count = app_state.db_client.get_user_count().await.map_err(|e| {
        tracing::error!("DB error, getting user count: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let response = UserListResponseDto {
        status: "success".to_string(),
        users: FilterUserDto::filter_users(&users),
        results: user_count,
    };
    tracing::info!("get_users successful");
    Ok(Json(response))
}

/// Create a user through the admin collection endpoint.
#[instrument(skip(app_state, body), fields(username = %body.username))]
pub async fn create_user(
    State(app_state): State<AppState>,
    Json(body): Json<CreateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_user input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let result = app_state
        .db_client
        .save_user(
            &body.username,
            &body.email,
            body.role.unwrap_or(UserRole::User),
            body.bio.as_deref().unwrap_or(""),
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::error!("create_user unique violation: {}", db_err);
                HttpError::bad_request("Username or email already exists".to_string())
            }
            _ => {
                tracing::error!("DB error, saving user: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&result),
        },
    };
    tracing::info!("create_user successful");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a single user by username (admin only).
#[instrument(skip(app_state))]
pub async fn get_user(
    Path(username): Path<String>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .db_client
        .get_user(None, Some(&username), None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user = result
        .ok_or_else(|| HttpError::not_found(ErrorMessage::UserNotFound.to_string()))?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };
    tracing::info!("get_user successful");
    Ok(Json(response))
}

/// Partial update of a user by username (admin only); may change the role.
#[instrument(skip(app_state, body))]
pub async fn update_user(
    Path(username): Path<String>,
    State(app_state): State<AppState>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_user input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let result = app_state
        .db_client
        .update_user(
            &username,
            body.username.as_deref(),
            body.email.as_deref(),
            body.role,
            body.bio.as_deref(),
        )
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found(ErrorMessage::UserNotFound.to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::error!("update_user unique violation: {}", db_err);
                HttpError::bad_request("Username or email already exists".to_string())
            }
            _ => {
                tracing::error!("DB error, updating user: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&result),
        },
    };
    tracing::info!("update_user successful");
    Ok(Json(response))
}

/// Delete a user by username (admin only).
#[instrument(skip(app_state))]
pub async fn delete_user(
    Path(username): Path<String>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_user(&username)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found(ErrorMessage::UserNotFound.to_string())
            }
            _ => {
                tracing::error!("DB error, deleting user: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!("delete_user successful");
    Ok(StatusCode::NO_CONTENT)
}
