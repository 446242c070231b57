mod password;
mod session;

pub use password::{change_password_handler, login_handler, register_user_handler};
pub use session::{logout_handler, me_handler};

/// Session key of the verified [`congress_core::UserIdentity`].
pub const SESSION_USER_KEY: &str = "user_identity";
