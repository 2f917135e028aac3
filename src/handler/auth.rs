use crate::{
    AppState,
    db::UserExt,
    dtos::{
        ExchangeCodeDto, RefreshResponseDto, RequestCodeDto, Response, TokenPairResponseDto,
    },
    error::{ErrorMessage, HttpError},
    mail::mails::send_confirmation_code_email,
    utils::token,
};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use validator::Validate;

use tracing::instrument;

/// Router for registration and token endpoints
pub fn auth_handler() -> Router<AppState> {
    Router::new()
        .route("/email", post(request_code))
        .route("/token", post(exchange_code))
        .route("/token/refresh", post(refresh))
}

/// Request a confirmation code by email.
///
/// Creates an inactive account when the email is unknown, otherwise
/// replaces the outstanding code. The response is the same either way, so
/// the endpoint never reveals whether an account exists.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn request_code(
    State(app_state): State<AppState>,
    Json(body): Json<RequestCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid request_code input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let confirmation_code = uuid::Uuid::new_v4().to_string();

    let existing = app_state
        .db_client
        .get_user(None, None, Some(&body.email))
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user = match existing {
        Some(user) => {
            app_state
                .db_client
                .set_confirmation_code(user.id, &confirmation_code)
                .await
                .map_err(|e| {
                    tracing::error!("DB error, storing confirmation code: {}", e);
                    HttpError::server_error(ErrorMessage::ServerError.to_string())
                })?;
            user
        }
        None => app_state
            .db_client
            .save_pending_user(&body.email, &confirmation_code)
            .await
            .map_err(|e| {
                tracing::error!("DB error, saving pending user: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?,
    };

    send_confirmation_code_email(
        &body.email,
        &user.username,
        &confirmation_code,
        &app_state.env.frontend_url,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to send confirmation code email: {}", e);
        HttpError::server_error("Failed to send email".to_string())
    })?;

    tracing::info!(email = %body.email, "Confirmation code sent");
    Ok(Json(Response {
        status: "success",
        message: "Confirmation code has been sent to your email.".to_string(),
    }))
}

/// Exchange an (email, confirmation_code) pair for a token pair.
///
/// 404 when the pair does not match a stored user+code. On success the
/// account is activated and the code is cleared; tokens are returned in the
/// body and set as cookies.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn exchange_code(
    State(app_state): State<AppState>,
    Json(body): Json<ExchangeCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid exchange_code input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let result = app_state
        .db_client
        .get_user_by_email_and_code(&body.email, &body.confirmation_code)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user by email and code: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user = result.ok_or_else(|| {
        tracing::error!("No user matches the email and confirmation code");
        HttpError::not_found(ErrorMessage::UserNotFound.to_string())
    })?;

    let user = app_state
        .db_client
        .activate_user(user.id)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user.id, "DB error, activating user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let access_token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let refresh_token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.refresh_token_maxage,
    )
    .map_err(|e| {
        tracing::error!("Refresh token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let access_cookie = Cookie::build(("access_token", access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .build();

    let refresh_cookie = Cookie::build(("refresh_token", refresh_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );
    headers.append(
        header::SET_COOKIE,
        refresh_cookie.to_string().parse().unwrap(),
    );

    let response = Json(TokenPairResponseDto {
        status: "success".to_string(),
        access_token,
        refresh_token,
    });

    let mut response = response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!(user_id = %user.id, "Code exchange successful");
    Ok(response)
}

/// Issue a new access token from the refresh token cookie.
#[instrument(skip(app_state, cookie_jar))]
pub async fn refresh(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let cookies = cookie_jar
        .get("refresh_token")
        .map(|cookie| cookie.value().to_string());

    let token_value = cookies.ok_or_else(|| {
        tracing::error!("Refresh token not provided");
        HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string())
    })?;

    let token_details =
        match token::decode_token(&token_value, app_state.env.jwt_secret.as_bytes()) {
            Ok(token_details) => token_details,
            Err(e) => {
                tracing::error!("Invalid refresh token: {}", e);
                return Err(HttpError::unauthorized(
                    ErrorMessage::InvalidToken.to_string(),
                ));
            }
        };

    let access_token = token::create_token(
        &token_details,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let access_cookie = Cookie::build(("access_token", access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .build();

    let response = Json(RefreshResponseDto {
        status: "success".to_string(),
        access_token,
    });

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!("Access token refreshed successfully");
    Ok((StatusCode::OK, response))
}
