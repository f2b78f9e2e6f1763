//! Register, login and profile lookup

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::password::{hash_password, verify_password};
use super::token::{Claims, TokenIssuer};
use super::{AuthError, AuthResult};
use crate::storage::{User, UserRepository};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

/// POST /auth/register body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// POST /auth/login body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// Profile plus a fresh session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

/// Account operations over a user repository
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    /// Create an account and sign the new user in
    pub async fn register(&self, req: RegisterRequest) -> AuthResult<AuthResponse> {
        let email = normalize_email(&req.email)?;
        let name = req.name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AuthError::InvalidInput(format!(
                "name must be 1 to {} characters",
                MAX_NAME_LEN
            )));
        }
        check_password(&req.password)?;

        let users = Arc::clone(&self.users);
        let user = run_blocking(move || {
            let user = User {
                id: uuid::Uuid::new_v4().to_string(),
                email,
                name,
                password_hash: hash_password(&req.password)?,
                created_at: Utc::now(),
            };
            if !users.create_user(&user)? {
                return Err(AuthError::EmailTaken);
            }
            Ok(user)
        })
        .await?;

        tracing::info!(user_id = %user.id, "Registered user");
        self.respond(user)
    }

    /// Check credentials and issue a token
    pub async fn login(&self, req: LoginRequest) -> AuthResult<AuthResponse> {
        let email = req.email.trim().to_lowercase();
        let users = Arc::clone(&self.users);

        let user = run_blocking(move || {
            let user = users
                .find_user_by_email(&email)?
                .ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(&user.password_hash, &req.password) {
                return Err(AuthError::InvalidCredentials);
            }
            Ok(user)
        })
        .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        self.respond(user)
    }

    /// Profile of the token's owner
    pub async fn me(&self, claims: &Claims) -> AuthResult<UserProfile> {
        let users = Arc::clone(&self.users);
        let id = claims.sub.clone();

        let user = run_blocking(move || Ok(users.find_user_by_id(&id)?)).await?;
        user.map(UserProfile::from).ok_or(AuthError::InvalidToken)
    }

    /// Validate a bearer token
    pub fn verify_token(&self, token: &str) -> AuthResult<Claims> {
        self.tokens.verify(token)
    }

    fn respond(&self, user: User) -> AuthResult<AuthResponse> {
        let token = self.tokens.issue(&user.id, &user.email)?;
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }
}

/// Hashing and SQLite both block; keep them off the runtime threads
async fn run_blocking<T, F>(f: F) -> AuthResult<T>
where
    F: FnOnce() -> AuthResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Task(e.to_string()))?
}

fn normalize_email(raw: &str) -> AuthResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = email.len() <= MAX_EMAIL_LEN
        && !email.contains(char::is_whitespace)
        && matches!(
            email.split_once('@'),
            Some((local, domain)) if !local.is_empty() && domain.contains('.')
                && !domain.starts_with('.') && !domain.ends_with('.') && !domain.contains('@')
        );

    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidInput("email must be a valid address".to_string()))
    }
}

fn check_password(password: &str) -> AuthResult<()> {
    let len = password.chars().count();
    if (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(format!(
            "password must be {} to {} characters",
            MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
        )))
    }
}
