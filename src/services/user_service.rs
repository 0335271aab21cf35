use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domain::country::normalize_country;
use crate::error::{Error, Result};
use crate::models::user::{Role, User};
use crate::utils::crypto;

pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub allowed_countries: Vec<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<String>,
    pub allowed_countries: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

/// Injected user store. The Postgres implementation is the only one shipped;
/// the seam exists so tests and future backends can swap it.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn insert(&self, user: NewUser) -> Result<User>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn count(&self) -> Result<i64>;
    async fn count_active_admins(&self) -> Result<i64>;
}

const USER_COLUMNS: &str = "id, email, password_hash, role, name, allowed_countries, is_active, created_by, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, role, name, allowed_countries, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(&user.name)
        .bind(&user.allowed_countries)
        .bind(user.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User> {
        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                allowed_countries = COALESCE($4, allowed_countries),
                is_active = COALESCE($5, is_active),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.role)
        .bind(changes.allowed_countries)
        .bind(changes.is_active)
        .bind(changes.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_active_admins(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid email or password".to_string()))?;
        if !user.is_active {
            return Err(Error::Unauthorized("Account is deactivated".to_string()));
        }
        let ok = crypto::verify_password(password, &user.password_hash)?;
        if !ok {
            return Err(Error::Unauthorized("Invalid email or password".to_string()));
        }
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    pub async fn create(
        &self,
        email: String,
        password: String,
        role: String,
        name: String,
        allowed_countries: Vec<String>,
        created_by: Option<Uuid>,
    ) -> Result<User> {
        let role = Role::parse(&role)
            .ok_or_else(|| Error::BadRequest(format!("Unknown role: {}", role)))?;
        let countries = validate_countries(&allowed_countries)?;
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(Error::BadRequest(
                "A user with this email already exists".to_string(),
            ));
        }
        let password_hash = crypto::hash_password(&password)?;
        self.repo
            .insert(NewUser {
                email,
                password_hash,
                role: role.as_str().to_string(),
                name,
                allowed_countries: countries,
                created_by,
            })
            .await
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        role: Option<String>,
        allowed_countries: Option<Vec<String>>,
        is_active: Option<bool>,
        password: Option<String>,
    ) -> Result<User> {
        let target = self.get(id).await?;

        let role = match role {
            Some(raw) => Some(
                Role::parse(&raw)
                    .ok_or_else(|| Error::BadRequest(format!("Unknown role: {}", raw)))?
                    .as_str()
                    .to_string(),
            ),
            None => None,
        };
        let allowed_countries = match allowed_countries {
            Some(raw) => Some(validate_countries(&raw)?),
            None => None,
        };

        // Demoting or deactivating the last active admin would lock the system.
        let losing_admin = target.role() == Role::Admin
            && (role.as_deref().map(|r| r != "admin").unwrap_or(false)
                || is_active == Some(false));
        if losing_admin && self.repo.count_active_admins().await? <= 1 {
            return Err(Error::BadRequest(
                "Cannot demote or deactivate the last active admin".to_string(),
            ));
        }

        let password_hash = match password {
            Some(plain) => Some(crypto::hash_password(&plain)?),
            None => None,
        };

        self.repo
            .update(
                id,
                UserChanges {
                    name,
                    role,
                    allowed_countries,
                    is_active,
                    password_hash,
                },
            )
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let target = self.get(id).await?;
        if target.role() == Role::Admin
            && target.is_active
            && self.repo.count_active_admins().await? <= 1
        {
            return Err(Error::BadRequest(
                "Cannot delete the last active admin".to_string(),
            ));
        }
        self.repo.delete(id).await
    }

    /// Seed an admin account on an empty user table, driven by config.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<()> {
        if self.repo.count().await? > 0 {
            return Ok(());
        }
        let password_hash = crypto::hash_password(password)?;
        self.repo
            .insert(NewUser {
                email: email.to_string(),
                password_hash,
                role: Role::Admin.as_str().to_string(),
                name: "Administrator".to_string(),
                allowed_countries: vec!["US".into(), "CA".into(), "MX".into()],
                created_by: None,
            })
            .await?;
        info!(email, "bootstrapped initial admin user");
        Ok(())
    }
}

/// Country grants must resolve and be grantable. CN is rejected here even
/// though the normalizer knows it.
fn validate_countries(raw: &[String]) -> Result<Vec<String>> {
    let mut codes = Vec::new();
    for value in raw {
        let country = normalize_country(value)
            .ok_or_else(|| Error::BadRequest(format!("Unknown country: {}", value)))?;
        if !country.is_grantable() {
            return Err(Error::BadRequest(format!(
                "Country {} cannot be granted",
                country.code()
            )));
        }
        let code = country.code().to_string();
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_normalize_and_reject_cn() {
        let codes = validate_countries(&["usa".into(), "Canada".into(), "US".into()]).unwrap();
        assert_eq!(codes, vec!["US".to_string(), "CA".to_string()]);

        assert!(validate_countries(&["china".into()]).is_err());
        assert!(validate_countries(&["atlantis".into()]).is_err());
    }
}
