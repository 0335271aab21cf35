use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub role: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub allowed_countries: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserPayload {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub role: Option<String>,
    pub allowed_countries: Option<Vec<String>>,
    pub is_active: Option<bool>,
    #[validate(length(min = 8))]
    pub password: Option<String>,
}

/// The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub name: String,
    pub allowed_countries: Vec<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            name: user.name,
            allowed_countries: user.allowed_countries,
            is_active: user.is_active,
            created_by: user.created_by,
            created_at: user.created_at,
        }
    }
}
