use congress_application::{AuthorizationService, RecordService, SecurityAdminService, UserService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub record_service: RecordService,
    pub security_admin_service: SecurityAdminService,
    pub authorization_service: AuthorizationService,
    pub user_service: UserService,
    pub frontend_url: String,
}
