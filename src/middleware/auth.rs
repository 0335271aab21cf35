use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::country::Country;
use crate::error::{Error, Result};
use crate::models::user::{Role, SessionUser};

pub const SESSION_COOKIE: &str = "lokok_session";

/// The signed session: the user snapshot the permission resolver needs, plus
/// expiry. Carried as a bearer token or the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub countries: Vec<Country>,
}

impl Claims {
    pub fn from_session(user: &SessionUser, ttl_hours: i64) -> Self {
        let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
        Self {
            sub: user.id.to_string(),
            exp,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            countries: user.allowed_countries.clone(),
        }
    }

    pub fn to_session(&self) -> Result<SessionUser> {
        let id = Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Malformed session subject".to_string()))?;
        Ok(SessionUser {
            id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            allowed_countries: self.countries.clone(),
        })
    }
}

pub fn issue_session_token(user: &SessionUser) -> Result<String> {
    let config = crate::config::get_config();
    let claims = Claims::from_session(user, config.session_ttl_hours);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Could not sign session token: {}", e)))
}

pub fn decode_session_token(token: &str) -> Result<SessionUser> {
    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| Error::Unauthorized("Invalid session token".to_string()))?;
    data.claims.to_session()
}

fn token_from_request(req: &Request) -> Option<String> {
    if let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    let cookie_header = req.headers().get(axum::http::header::COOKIE)?;
    let cookies = cookie_header.to_str().ok()?;
    let prefix = format!("{}=", SESSION_COOKIE);
    for pair in cookies.split(';') {
        if let Some(value) = pair.trim().strip_prefix(&prefix) {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn unauthorized(reason: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": reason}))).into_response()
}

pub async fn require_auth(mut req: Request, next: Next) -> Response {
    let Some(token) = token_from_request(&req) else {
        return unauthorized("missing_session");
    };
    match decode_session_token(&token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(_) => unauthorized("invalid_session"),
    }
}

pub async fn require_admin(mut req: Request, next: Next) -> Response {
    let Some(token) = token_from_request(&req) else {
        return unauthorized("missing_session");
    };
    match decode_session_token(&token) {
        Ok(user) => {
            if user.role != Role::Admin {
                return (StatusCode::FORBIDDEN, Json(json!({"error": "forbidden"})))
                    .into_response();
            }
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(_) => unauthorized("invalid_session"),
    }
}

pub async fn require_manager_or_admin(mut req: Request, next: Next) -> Response {
    let Some(token) = token_from_request(&req) else {
        return unauthorized("missing_session");
    };
    match decode_session_token(&token) {
        Ok(user) => {
            if !matches!(user.role, Role::Admin | Role::Manager) {
                return (StatusCode::FORBIDDEN, Json(json!({"error": "forbidden"})))
                    .into_response();
            }
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(_) => unauthorized("invalid_session"),
    }
}

/// Set-Cookie value for a fresh session.
pub fn session_cookie(token: &str) -> String {
    let config = crate::config::get_config();
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE,
        token,
        config.session_ttl_hours * 3600
    )
}

/// Set-Cookie value that clears the session.
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax", SESSION_COOKIE)
}
