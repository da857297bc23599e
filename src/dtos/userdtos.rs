use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    providermodel::{Availability, NewProviderProfile, ServiceProvider},
    usermodel::{User, UserRole},
};

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").expect("phone regex is valid")
});

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !PHONE_REGEX.is_match(phone) {
        let mut error = ValidationError::new("invalid_phone");
        error.message = Some(Cow::from(
            "Phone number must contain 8-20 digits, optionally starting with +",
        ));
        return Err(error);
    }
    Ok(())
}

pub fn validate_skills(skills: &Vec<String>) -> Result<(), ValidationError> {
    if skills.iter().any(|skill| skill.trim().is_empty() || skill.len() > 50) {
        let mut error = ValidationError::new("invalid_skill");
        error.message = Some(Cow::from("Each skill must be between 1-50 characters"));
        return Err(error);
    }
    Ok(())
}

fn default_role() -> UserRole {
    UserRole::Customer
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProviderProfileDto {
    #[serde(default)]
    #[validate(
        length(max = 20, message = "At most 20 skills are allowed"),
        custom = "validate_skills"
    )]
    pub skills: Vec<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Hourly rate cannot be negative"))]
    pub hourly_rate: f64,

    #[validate(range(min = 0, max = 80, message = "Experience must be between 0-80 years"))]
    pub experience_years: Option<i32>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub availability: Availability,
}

impl From<ProviderProfileDto> for NewProviderProfile {
    fn from(dto: ProviderProfileDto) -> Self {
        NewProviderProfile {
            skills: dto.skills,
            hourly_rate: dto.hourly_rate,
            experience_years: dto.experience_years,
            description: dto.description,
            availability: dto.availability,
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 3, max = 80, message = "Username must be between 3-80 characters"))]
    pub username: String,

    #[validate(
        length(min = 1, max = 120, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Password must be between 6-64 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Full name must be between 1-100 characters"))]
    pub full_name: String,

    #[serde(default = "default_role", alias = "user_type")]
    pub role: UserRole,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,

    #[validate]
    pub provider_profile: Option<ProviderProfileDto>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, max = 64, message = "New password must be between 6-64 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterUserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            location: user.location.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub message: String,
    pub user: FilterUserDto,
}

/// Body of `GET /auth/me`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserDto {
    pub user: CurrentUserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserData {
    #[serde(flatten)]
    pub user: FilterUserDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_profile: Option<ServiceProvider>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
