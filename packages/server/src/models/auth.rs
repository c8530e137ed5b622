use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique email address, used to log in.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Unique username (1-150 chars: letters, digits and `.@+-`).
    #[schema(example = "alice.cooks")]
    pub username: String,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Liddell")]
    pub last_name: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.eq_ignore_ascii_case("me") {
        return Err(AppError::InvalidField {
            field: "username",
            message: "Username 'me' is reserved".into(),
        });
    }
    if username.is_empty() || username.chars().count() > 150 {
        return Err(AppError::InvalidField {
            field: "username",
            message: "Username must be 1-150 characters".into(),
        });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '@' | '+' | '-'))
    {
        return Err(AppError::InvalidField {
            field: "username",
            message: "Username may only contain letters, digits and . @ + -".into(),
        });
    }
    Ok(())
}

pub fn validate_password(password: &str, field: &'static str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::InvalidField {
            field,
            message: "Password must be 8-128 characters".into(),
        });
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let email = payload.email.trim();
    if email.is_empty() || email.len() > 254 || !email.contains('@') {
        return Err(AppError::InvalidField {
            field: "email",
            message: "Email must be a valid address of at most 254 characters".into(),
        });
    }
    validate_username(&payload.username)?;
    for (field, value) in [
        ("first_name", &payload.first_name),
        ("last_name", &payload.last_name),
    ] {
        let value = value.trim();
        if value.is_empty() || value.chars().count() > 150 {
            return Err(AppError::InvalidField {
                field,
                message: format!("{field} must be 1-150 characters"),
            });
        }
    }
    validate_password(&payload.password, "password")
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}

/// Request body for changing the caller's password.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
