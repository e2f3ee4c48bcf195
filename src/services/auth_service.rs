use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;

use crate::{
    config::AppConfig,
    db::DbPool,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    models::User,
};

/// Looks a user up by name; `Ok(None)` means no such user, not a failure.
pub async fn find_user_by_username(pool: &DbPool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn register_user(pool: &DbPool, payload: RegisterRequest) -> AppResult<User> {
    let RegisterRequest { username, password } = payload;
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    if find_user_by_username(pool, username).await?.is_some() {
        return Err(AppError::BadRequest("Username is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    // A concurrent registration can still win between the lookup and the insert.
    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (username) DO NOTHING
        RETURNING id, username, password_hash, created_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::BadRequest("Username is already taken".to_string()))?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(user)
}

pub async fn login_user(
    pool: &DbPool,
    config: &AppConfig,
    payload: LoginRequest,
) -> AppResult<LoginResponse> {
    let LoginRequest { username, password } = payload;
    let user = match find_user_by_username(pool, username.trim()).await? {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = issue_token(
        user.id,
        &user.username,
        &config.jwt_secret,
        config.token_ttl_hours,
    )?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: config.token_ttl_hours * 3600,
    })
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Signs an HS256 token whose subject is the user id.
pub fn issue_token(
    user_id: i64,
    username: &str,
    secret: &str,
    ttl_hours: i64,
) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    #[test]
    fn issued_token_resolves_to_the_same_identity() {
        let token = issue_token(42, "ferris", "test-secret", 1).unwrap();
        let user = decode_token(&token, "test-secret").unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.username, "ferris");
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue_token(42, "ferris", "test-secret", 1).unwrap();
        assert!(matches!(
            decode_token(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }
}
