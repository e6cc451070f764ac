//! Authentication service.
//!
//! Handles password hashing, username/password login and token resolution.

use std::sync::{Arc, OnceLock};

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::Rng;

use crate::error::{AppError, Result, ValidationErrors, NON_FIELD_ERRORS};
use crate::models::user::{AuthToken, User};
use crate::storage::AccountStore;

/// Length in bytes of a freshly generated token key (hex-encoded to 40 chars).
const TOKEN_BYTES: usize = 20;

const MISSING_CREDENTIALS: &str = "Must include both username and password.";

/// Authentication service
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Check a username and password against the stored account.
    ///
    /// Unknown users, inactive users and wrong passwords all produce the same
    /// `InvalidCredentials` error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::field(NON_FIELD_ERRORS, MISSING_CREDENTIALS));
        }

        let Some(user) = self
            .accounts
            .find_user_by_username(username)
            .await?
            .filter(|u| u.is_active)
        else {
            // Same bcrypt cost as a real check, so timing does not reveal usernames.
            Self::verify_password(password, dummy_hash()?)?;
            return Err(AppError::InvalidCredentials);
        };

        if !Self::verify_password(password, &user.password_hash)? {
            tracing::debug!(username = %username, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Authenticate and hand back the user's token, creating it on first login.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, AuthToken)> {
        let user = self.authenticate(username, password).await?;
        let token = self
            .accounts
            .get_or_create_token(user.id, &generate_token_key())
            .await?;
        tracing::info!(username = %user.username, "User logged in");
        Ok((user, token))
    }

    /// Resolve a token key to its owner.
    pub async fn authenticate_token(&self, key: &str) -> Result<User> {
        self.accounts
            .find_user_by_token(key)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid token.".to_string()))
    }

    /// Create a new account.
    pub async fn create_user(&self, username: &str, password: &str, is_admin: bool) -> Result<User> {
        let username = username.trim();
        let mut errors = ValidationErrors::new();
        if username.is_empty() {
            errors.add("username", "This field may not be blank.");
        }
        if password.is_empty() {
            errors.add("password", "This field may not be blank.");
        }
        errors.into_result()?;

        let password_hash = Self::hash_password(password)?;
        let user = self
            .accounts
            .create_user(username, &password_hash, is_admin)
            .await?;
        tracing::info!(username = %user.username, is_admin, "User created");
        Ok(user)
    }

    /// Create the account unless a user with that name already exists.
    ///
    /// Returns `true` when a user was created.
    pub async fn ensure_user(&self, username: &str, password: &str, is_admin: bool) -> Result<bool> {
        if self.accounts.find_user_by_username(username.trim()).await?.is_some() {
            return Ok(false);
        }
        match self.create_user(username, password, is_admin).await {
            Ok(_) => Ok(true),
            // Lost a race with another instance provisioning the same user.
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Hash a password
    pub fn hash_password(password: &str) -> Result<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

/// Hash checked against when the account is missing or inactive.
fn dummy_hash() -> Result<&'static str> {
    static HASH: OnceLock<String> = OnceLock::new();
    if let Some(hash) = HASH.get() {
        return Ok(hash);
    }
    let hash = AuthService::hash_password(&generate_token_key())?;
    Ok(HASH.get_or_init(|| hash))
}

/// Random token key as lowercase hex.
pub fn generate_token_key() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
