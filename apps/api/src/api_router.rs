use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use congress_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

pub fn build_router<S>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<S>,
) -> Result<Router, AppError>
where
    S: SessionStore + Clone,
{
    let security_routes = Router::new()
        .route(
            "/api/security/permissions",
            get(handlers::security::list_permissions_handler)
                .post(handlers::security::create_permission_handler),
        )
        .route(
            "/api/security/permissions/{permission}",
            delete(handlers::security::delete_permission_handler),
        )
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/security/roles/{role_name}",
            delete(handlers::security::delete_role_handler),
        )
        .route(
            "/api/security/roles/{role_name}/permissions",
            get(handlers::security::list_role_permissions_handler)
                .post(handlers::security::grant_role_permission_handler),
        )
        .route(
            "/api/security/roles/{role_name}/permissions/{permission}",
            delete(handlers::security::revoke_role_permission_handler),
        )
        .route(
            "/api/security/users/{user_id}/roles",
            post(handlers::security::assign_role_handler),
        )
        .route(
            "/api/security/users/{user_id}/roles/{role_name}",
            delete(handlers::security::unassign_role_handler),
        )
        .route(
            "/api/security/users/{user_id}/permissions",
            get(handlers::security::list_user_permissions_handler)
                .post(handlers::security::grant_user_permission_handler),
        )
        .route(
            "/api/security/users/{user_id}/permissions/{permission}",
            delete(handlers::security::revoke_user_permission_handler),
        )
        .route(
            "/api/security/users/{user_id}/object-permissions",
            put(handlers::security::save_object_permission_handler),
        );

    let account_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/api/users", post(auth::register_user_handler))
        .route("/api/profile/password", put(auth::change_password_handler));

    let record_routes = Router::new()
        .route(
            "/api/{resource}",
            get(handlers::records::list_records_handler)
                .post(handlers::records::create_record_handler),
        )
        .route(
            "/api/{resource}/query",
            post(handlers::records::query_records_handler),
        )
        .route(
            "/api/{resource}/{record_id}",
            get(handlers::records::get_record_handler)
                .patch(handlers::records::update_record_handler)
                .put(handlers::records::update_record_handler)
                .delete(handlers::records::delete_record_handler),
        );

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(security_routes)
        .merge(account_routes)
        .merge(record_routes)
        .route_layer(from_fn(middleware::resolve_principal))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
