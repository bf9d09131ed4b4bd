//! Admin authentication: salted PBKDF2 password check, signed bearer tokens,
//! and per-IP rate limiting of login attempts.
//!
//! The ladder core never inspects credentials; the web layer calls into this
//! service and passes only already-authorized requests through.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Login attempts allowed per IP within the rate-limit window.
const MAX_ATTEMPTS: usize = 5;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);
/// Issued tokens are valid for 24 hours.
const TOKEN_TTL_SECS: i64 = 24 * 3600;
const PBKDF2_ITERATIONS: u32 = 10_000;
const PBKDF2_KEY_LEN: usize = 64;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AuthError {
    /// Too many attempts from this address; retry after the given minutes.
    RateLimited { retry_after_minutes: u64 },
    /// Password did not match.
    BadPassword,
    /// ADMIN_PASSWORD_HASH is missing or not in `salt:hash` form.
    BadConfig,
    /// Token is malformed or has a bad signature.
    InvalidToken,
    /// Token was valid once but has expired.
    TokenExpired,
    /// Token is valid but not an admin token.
    Forbidden,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::RateLimited {
                retry_after_minutes,
            } => write!(
                f,
                "Too many login attempts. Please try again in {} minute{}.",
                retry_after_minutes,
                if *retry_after_minutes == 1 { "" } else { "s" }
            ),
            AuthError::BadPassword => write!(f, "Invalid password"),
            AuthError::BadConfig => write!(f, "Invalid password configuration"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token expired"),
            AuthError::Forbidden => write!(f, "Insufficient permissions"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Claims carried by an admin bearer token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Password login and token verification.
pub struct AuthService {
    /// `salt:hash` pair, both hex.
    password_hash: String,
    jwt_secret: String,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl AuthService {
    pub fn new(password_hash: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            password_hash: password_hash.into(),
            jwt_secret: jwt_secret.into(),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Build from `ADMIN_PASSWORD_HASH` and `JWT_SECRET`; `None` when either
    /// is unset (the server then runs without admin auth).
    pub fn from_env() -> Option<Self> {
        let hash = std::env::var("ADMIN_PASSWORD_HASH").ok()?;
        let secret = std::env::var("JWT_SECRET").ok()?;
        if hash.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Self::new(hash, secret))
    }

    /// Validate the password and issue a signed admin token. Counts the
    /// attempt against the caller's rate limit either way.
    pub fn login(&self, ip: &str, password: &str) -> Result<String, AuthError> {
        self.check_rate_limit(ip)?;

        let (salt, stored) = self
            .password_hash
            .split_once(':')
            .ok_or(AuthError::BadConfig)?;
        if salt.is_empty() || stored.is_empty() {
            return Err(AuthError::BadConfig);
        }
        if hash_password(password, salt) != stored {
            return Err(AuthError::BadPassword);
        }

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            role: "admin".to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|_| AuthError::BadConfig)
    }

    /// Check a bearer token and return its claims; admin role required.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;
        if data.claims.role != "admin" {
            return Err(AuthError::Forbidden);
        }
        Ok(data.claims)
    }

    fn check_rate_limit(&self, ip: &str) -> Result<(), AuthError> {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let recent = attempts.entry(ip.to_string()).or_default();
        recent.retain(|t| now.duration_since(*t) < RATE_LIMIT_WINDOW);
        if recent.len() >= MAX_ATTEMPTS {
            let oldest = recent.iter().min().copied().unwrap_or(now);
            let until_reset = RATE_LIMIT_WINDOW.saturating_sub(now.duration_since(oldest));
            let minutes = (until_reset.as_secs() + 59) / 60;
            return Err(AuthError::RateLimited {
                retry_after_minutes: minutes.max(1),
            });
        }
        recent.push(now);

        // Keep the table bounded: drop addresses with no recent attempts.
        if attempts.len() > 1000 {
            attempts.retain(|_, v| v.iter().any(|t| now.duration_since(*t) < RATE_LIMIT_WINDOW));
        }
        Ok(())
    }
}

/// PBKDF2-SHA512, 10k iterations, 64-byte key, hex output. Matches the
/// format of hashes produced by `generate_password_hash`.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut key = [0u8; PBKDF2_KEY_LEN];
    pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    hex::encode(key)
}

/// Produce a fresh `salt:hash` pair for ADMIN_PASSWORD_HASH.
pub fn generate_password_hash(password: &str) -> String {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = hex::encode(salt_bytes);
    format!("{}:{}", salt, hash_password(password, &salt))
}
