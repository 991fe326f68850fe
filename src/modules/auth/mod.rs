pub mod service;
pub mod session;
pub mod store;
pub mod validation;

// Re-export the main types and functions
pub use service::{
    AuthResponse, AuthService, INVALID_CREDENTIALS, LOGIN_SUCCESSFUL, REGISTRATION_SUCCESSFUL,
    USERNAME_EXISTS,
};
pub use session::{Listener, SessionState, Subscription};
pub use store::{generate_user_id, User, UserStore};
pub use validation::{validate_login, validate_registration, ValidationError};
