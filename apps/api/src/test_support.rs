use congress_core::{AppError, Principal};

use crate::api_config::ApiConfig;
use crate::api_services::{Repositories, bootstrap_security, build_app_state};
use crate::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@congress.test";
pub const ADMIN_PASSWORD: &str = "Congress-Admin-2024!";

/// Bootstrapped in-memory state and the signed-in administrator.
pub async fn memory_state() -> (AppState, Principal) {
    let config = ApiConfig::from_lookup(None, |name| match name {
        "STORAGE_BACKEND" => Some("memory".to_owned()),
        "BOOTSTRAP_ADMIN_EMAIL" => Some(ADMIN_EMAIL.to_owned()),
        "BOOTSTRAP_ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_owned()),
        _ => None,
    })
    .unwrap_or_else(|_| unreachable!());

    let state = build_app_state(&config, Repositories::in_memory());
    bootstrap_security(&state, &config)
        .await
        .unwrap_or_else(|_: AppError| unreachable!());

    let identity = state
        .user_service
        .login(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap_or_else(|_| unreachable!());

    (state, Principal::Authenticated(identity))
}
