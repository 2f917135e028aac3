use crate::models::{User, UserRole};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// DTOs define the wire shape of requests and responses, separate from the
// database models so handlers control exactly what is exposed.

pub const MIN_TITLE_YEAR: i32 = 1700;

/// Slugs are the stable external identifiers of categories and genres:
/// ASCII letters, digits, hyphen, underscore.
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug"))
    }
}

/// Title years must fall in [1700, current year]. The upper bound is
/// dynamic, so this is checked by handlers rather than a derive attribute.
pub fn year_in_range(year: i32) -> bool {
    (MIN_TITLE_YEAR..=Utc::now().year()).contains(&year)
}

// ============================================================================
// Authentication DTOs
// ============================================================================

/// Request a confirmation code by email.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RequestCodeDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
}

/// Exchange an emailed confirmation code for a token pair.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ExchangeCodeDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Confirmation code is required"))]
    pub confirmation_code: String,
}

/// Token pair issued on successful code exchange.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponseDto {
    pub status: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponseDto {
    pub status: String,
    pub access_token: String,
}

// ============================================================================
// Pagination & query DTOs
// ============================================================================

#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: i32,
    pub limit: i32,
    pub total: i32,
    #[serde(rename = "totalPages")]
    pub total_pages: i32,
}

impl PaginationDto {
    pub fn new(page: i32, limit: i32, total: i64) -> Self {
        let total_pages = (total as f64 / limit as f64).ceil() as i32;
        PaginationDto {
            page,
            limit,
            total: total as i32,
            total_pages,
        }
    }
}

// ============================================================================
// User DTOs
// ============================================================================

/// User data sent to clients; excludes the confirmation code.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub username: String,
    pub email: String,
    pub role: String,
    pub bio: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            bio: user.bio.to_owned(),
            created_at: user.created_at.unwrap_or_default(),
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: i64,
}

/// Admin-side user creation.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    pub role: Option<UserRole>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

/// Admin-side partial update, addressed by username. May change the role.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 150, message = "Username must not be empty"))]
    pub username: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    pub role: Option<UserRole>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

/// Self-service partial update. Carries no role field: a user cannot change
/// their own role.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateMeDto {
    #[validate(length(min = 1, max = 150, message = "Username must not be empty"))]
    pub username: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

// ============================================================================
// Catalog DTOs (categories & genres)
// ============================================================================

/// Create payload shared by categories and genres.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct InputCatalogItemDto {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, max = 50, message = "Slug is required"),
        custom(function = "validate_slug")
    )]
    pub slug: String,
}

/// List query for categories and genres; `name` is an exact-match search.
#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct CatalogQueryDto {
    pub name: Option<String>,

    #[validate(range(min = 1))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CategoryDto {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenreDto {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryListResponseDto {
    pub status: String,
    pub data: Vec<CategoryDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryResponseDto {
    pub status: String,
    pub data: CategoryDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenreListResponseDto {
    pub status: String,
    pub data: Vec<GenreDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenreResponseDto {
    pub status: String,
    pub data: GenreDto,
}

// ============================================================================
// Title DTOs
// ============================================================================

/// Title write payload. Category and genres are referenced by slug; the
/// read side expands them to nested objects.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct InputTitleDto {
    #[validate(length(min = 1, max = 300, message = "Name is required"))]
    pub name: String,

    pub year: i32,

    pub description: Option<String>,

    #[validate(custom(function = "validate_slug"))]
    pub category: Option<String>,

    #[serde(default)]
    pub genre: Vec<String>,
}

/// Title listing filters, combinable; all optional.
#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct TitlesQueryDto {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,

    #[validate(range(min = 1))]
    pub page: Option<i32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i32>,
}

/// Read representation: nested category/genres plus the computed rating
/// (mean review score, null when the title has no reviews).
#[derive(Debug, Serialize, Deserialize)]
pub struct TitleDto {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<GenreDto>,
    pub category: Option<CategoryDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TitleListResponseDto {
    pub status: String,
    pub data: Vec<TitleDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TitleResponseDto {
    pub status: String,
    pub data: TitleDto,
}

// ============================================================================
// Review DTOs
// ============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct InputReviewDto {
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,

    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10"))]
    pub score: i32,
}

/// Review as serialized to clients; `author` is the author's username.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewDto {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub score: i32,
    #[serde(rename = "pubDate")]
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponseDto {
    pub status: String,
    pub data: Vec<ReviewDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct SingleReviewResponseDto {
    pub status: String,
    pub data: ReviewDto,
}

// ============================================================================
// Comment DTOs
// ============================================================================

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct InputCommentDto {
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentDto {
    pub id: i64,
    pub author: String,
    pub text: String,
    #[serde(rename = "pubDate")]
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponseDto {
    pub status: String,
    pub data: Vec<CommentDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct SingleCommentResponseDto {
    pub status: String,
    pub data: CommentDto,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_boundaries() {
        let ok_low = InputReviewDto {
            text: "fine".to_string(),
            score: 1,
        };
        let ok_high = InputReviewDto {
            text: "fine".to_string(),
            score: 10,
        };
        let too_low = InputReviewDto {
            text: "fine".to_string(),
            score: 0,
        };
        let too_high = InputReviewDto {
            text: "fine".to_string(),
            score: 11,
        };
        assert!(ok_low.validate().is_ok());
        assert!(ok_high.validate().is_ok());
        assert!(too_low.validate().is_err());
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn year_boundaries() {
        let current = Utc::now().year();
        assert!(year_in_range(MIN_TITLE_YEAR));
        assert!(year_in_range(current));
        assert!(!year_in_range(MIN_TITLE_YEAR - 1));
        assert!(!year_in_range(current + 1));
    }

    #[test]
    fn slug_rejects_non_url_characters() {
        let ok = InputCatalogItemDto {
            name: "Drama".to_string(),
            slug: "drama-2_0".to_string(),
        };
        let bad = InputCatalogItemDto {
            name: "Drama".to_string(),
            slug: "drama slug!".to_string(),
        };
        assert!(ok.validate().is_ok());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn request_code_requires_valid_email() {
        let ok = RequestCodeDto {
            email: "reader@example.com".to_string(),
        };
        let bad = RequestCodeDto {
            email: "not-an-email".to_string(),
        };
        assert!(ok.validate().is_ok());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn pagination_rounds_pages_up() {
        let p = PaginationDto::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        let empty = PaginationDto::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn update_me_ignores_role_field() {
        // Unknown JSON fields are dropped, so a self-update cannot smuggle
        // in a role change.
        let body: UpdateMeDto =
            serde_json::from_str(r#"{"bio": "hi", "role": "admin"}"#).unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.bio.as_deref(), Some("hi"));
    }
}
