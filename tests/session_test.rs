use std::env;

use lokok_backend::domain::country::Country;
use lokok_backend::middleware::auth::{decode_session_token, issue_session_token};
use lokok_backend::models::user::{Role, SessionUser};
use uuid::Uuid;

fn ensure_config() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("DATABASE_URL", "postgres://localhost/lokok_test");
    env::set_var("SESSION_SECRET", "test_secret_key");
    // Already-initialized is fine when several tests share the binary.
    let _ = lokok_backend::config::init_config();
}

#[test]
fn session_token_round_trips_the_user() {
    ensure_config();
    let user = SessionUser {
        id: Uuid::new_v4(),
        email: "maria.lopez@lokok.example".to_string(),
        name: "Maria Lopez".to_string(),
        role: Role::Manager,
        allowed_countries: vec![Country::Us, Country::Mx],
    };

    let token = issue_session_token(&user).expect("issue");
    let decoded = decode_session_token(&token).expect("decode");

    assert_eq!(decoded.id, user.id);
    assert_eq!(decoded.email, user.email);
    assert_eq!(decoded.role, Role::Manager);
    assert_eq!(decoded.allowed_countries, vec![Country::Us, Country::Mx]);
}

#[test]
fn tampered_token_is_rejected() {
    ensure_config();
    let user = SessionUser {
        id: Uuid::new_v4(),
        email: "admin@lokok.example".to_string(),
        name: "Admin".to_string(),
        role: Role::Admin,
        allowed_countries: vec![],
    };

    let mut token = issue_session_token(&user).expect("issue");
    token.push('x');
    assert!(decode_session_token(&token).is_err());
    assert!(decode_session_token("not-a-token").is_err());
}
