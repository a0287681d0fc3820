//! Auth Service - Registration, login and bearer token verification
//!
//! Passwords are stored as argon2 hashes; sessions are stateless HS256 JWTs.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::application::ports::outbound::UserRepositoryPort;
use crate::domain::entities::User;
use crate::domain::value_objects::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: UserId,
    pub username: String,
    /// Expiry, seconds since the epoch
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<User, AuthError>;

    /// Check credentials and issue a token
    async fn login(&self, request: LoginRequest) -> Result<(String, User), AuthError>;

    fn verify_token(&self, token: &str) -> Result<Claims, AuthError>;
}

pub struct AuthServiceImpl {
    users: Arc<dyn UserRepositoryPort>,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthServiceImpl {
    pub fn new(users: Arc<dyn UserRepositoryPort>, jwt_secret: String, token_ttl: Duration) -> Self {
        Self {
            users,
            jwt_secret,
            token_ttl,
        }
    }

    fn validate_register_request(request: &RegisterRequest) -> Result<(), AuthError> {
        let username = request.username.trim();
        if username.len() < 3 || username.len() > 32 {
            return Err(AuthError::Validation(
                "Username must be between 3 and 32 characters".to_string(),
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AuthError::Validation(
                "Username may only contain letters, digits, '_' and '-'".to_string(),
            ));
        }
        if !request.email.contains('@') {
            return Err(AuthError::Validation("Email address is invalid".to_string()));
        }
        if request.password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let expires = Utc::now() + self.token_ttl;
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            exp: expires.timestamp().max(0) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        Self::validate_register_request(&request)?;
        let username = request.username.trim().to_string();

        if self.users.get_by_username(&username).await?.is_some() {
            return Err(AuthError::UsernameTaken(username));
        }

        let user = User::new(
            username,
            request.email.trim(),
            hash_password(&request.password)?,
        );
        self.users.create(&user).await?;

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn login(&self, request: LoginRequest) -> Result<(String, User), AuthError> {
        let Some(user) = self.users.get_by_username(request.username.trim()).await? else {
            warn!("Login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "User logged in");
        Ok((token, user))
    }

    fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}
