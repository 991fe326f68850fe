// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{auth, config, storage, utils};

// Re-export commonly used types
pub use modules::auth::service::{AuthResponse, AuthService};
pub use modules::auth::session::{SessionState, Subscription};
pub use modules::auth::store::{User, UserStore};
pub use modules::config::AppConfig;
pub use modules::storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};

// Persisted slot names
pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "currentUser";
pub const TOKEN_KEY: &str = "token";

// Caller-side validation
pub const MIN_PASSWORD_LENGTH: usize = 6;
