//! Integration tests for admin login, token verification, and rate limiting.

use jsonwebtoken::{encode, EncodingKey, Header};
use pool_ladder_web::auth::{generate_password_hash, AuthError, AuthService, Claims};

const SECRET: &str = "test-secret";

fn service(password: &str) -> AuthService {
    AuthService::new(generate_password_hash(password), SECRET)
}

#[test]
fn login_and_verify_round_trip() {
    let auth = service("hunter2");
    let token = auth.login("127.0.0.1", "hunter2").unwrap();
    let claims = auth.verify(&token).unwrap();
    assert_eq!(claims.role, "admin");
    assert!(claims.exp > claims.iat);
    assert_eq!(claims.exp - claims.iat, 24 * 3600);
}

#[test]
fn wrong_password_is_rejected() {
    let auth = service("hunter2");
    assert_eq!(
        auth.login("127.0.0.1", "hunter3"),
        Err(AuthError::BadPassword)
    );
}

#[test]
fn malformed_stored_hash_is_a_config_error() {
    let auth = AuthService::new("no-colon-here", SECRET);
    assert_eq!(
        auth.login("127.0.0.1", "anything"),
        Err(AuthError::BadConfig)
    );
}

#[test]
fn sixth_attempt_is_rate_limited_even_with_the_right_password() {
    let auth = service("hunter2");
    for _ in 0..5 {
        assert_eq!(
            auth.login("10.0.0.1", "wrong"),
            Err(AuthError::BadPassword)
        );
    }
    match auth.login("10.0.0.1", "hunter2") {
        Err(AuthError::RateLimited {
            retry_after_minutes,
        }) => assert!((1..=15).contains(&retry_after_minutes)),
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[test]
fn rate_limit_is_per_address() {
    let auth = service("hunter2");
    for _ in 0..5 {
        auth.login("10.0.0.1", "wrong").ok();
    }
    assert!(auth.login("10.0.0.2", "hunter2").is_ok());
}

#[test]
fn garbage_token_is_invalid() {
    let auth = service("hunter2");
    assert_eq!(
        auth.verify("not.a.token"),
        Err(AuthError::InvalidToken)
    );
}

#[test]
fn token_signed_with_another_secret_is_invalid() {
    let auth = service("hunter2");
    let other = AuthService::new(generate_password_hash("hunter2"), "other-secret");
    let token = other.login("127.0.0.1", "hunter2").unwrap();
    assert_eq!(auth.verify(&token), Err(AuthError::InvalidToken));
}

#[test]
fn expired_token_is_reported_as_expired() {
    let auth = service("hunter2");
    let now = chrono::Utc::now().timestamp();
    let stale = Claims {
        role: "admin".to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::default(),
        &stale,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(auth.verify(&token), Err(AuthError::TokenExpired));
}

#[test]
fn non_admin_role_is_forbidden() {
    let auth = service("hunter2");
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        role: "viewer".to_string(),
        iat: now,
        exp: now + 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(auth.verify(&token), Err(AuthError::Forbidden));
}

#[test]
fn generated_hashes_are_salted() {
    let a = generate_password_hash("same-password");
    let b = generate_password_hash("same-password");
    assert_ne!(a, b);
    let (salt_a, hash_a) = a.split_once(':').unwrap();
    assert_eq!(salt_a.len(), 32);
    assert_eq!(hash_a.len(), 128);
}

#[test]
fn verify_round_trips_through_the_hash_format() {
    // A hash generated out of band (e.g. by the hash-password subcommand)
    // must authenticate when installed verbatim.
    let stored = generate_password_hash("correct horse battery staple");
    let auth = AuthService::new(stored, SECRET);
    assert!(auth.login("::1", "correct horse battery staple").is_ok());
}
