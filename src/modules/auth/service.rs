use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use log::debug;
use serde::Serialize;

use super::session::{SessionState, Subscription};
use super::store::{generate_user_id, User, UserStore};
use crate::modules::storage::{KeyValueStore, StorageError};
use crate::modules::utils::logging::{log_auth_event, log_data_operation};
use crate::TOKEN_KEY;

pub const REGISTRATION_SUCCESSFUL: &str = "Registration successful";
pub const USERNAME_EXISTS: &str = "Username already exists";
pub const LOGIN_SUCCESSFUL: &str = "Login successful";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Outcome of `register` or `login`.
///
/// A rejected request is still `Ok`: duplicate usernames and bad credentials
/// are routine answers carried in `success` and `message`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl AuthResponse {
    fn success(message: &str, user: User) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            user: Some(user),
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            user: None,
        }
    }
}

/// Registers and verifies credentials and publishes who is logged in.
///
/// Every read-decide-write sequence runs under one lock on the store, so two
/// callers can never both pass the uniqueness check for the same username.
/// Session changes are staged while that lock is held, which keeps listener
/// notifications in the same order as the writes, and delivered once it is
/// released so listeners can call back into the service.
pub struct AuthService<S: KeyValueStore> {
    store: Mutex<UserStore<S>>,
    session: SessionState,
}

impl<S: KeyValueStore> AuthService<S> {
    /// Build the service, restoring the session from the persisted snapshot
    pub fn new(storage: S) -> Self {
        let store = UserStore::new(storage);
        let restored = store.load_current();
        if let Some(user) = &restored {
            debug!("Restored session for user id {}", user.id);
        }

        Self {
            store: Mutex::new(store),
            session: SessionState::new(restored),
        }
    }

    /// Create a new account and log it in
    pub fn register(&self, username: &str, password: &str) -> Result<AuthResponse, StorageError> {
        let mut store = self.lock_store();
        let mut users = store.load_all();

        if users.iter().any(|u| u.username == username) {
            log_auth_event("register", username, false, Some(USERNAME_EXISTS));
            return Ok(AuthResponse::failure(USERNAME_EXISTS));
        }

        let user = User::new(generate_user_id(&users), username, password, Utc::now());
        users.push(user.clone());

        let previous = &users[..users.len() - 1];
        Self::commit(&mut store, previous, &users, &user)?;
        self.session.stage(Some(user.clone()));
        drop(store);
        self.session.deliver_pending();

        log_auth_event("register", username, true, None);
        Ok(AuthResponse::success(REGISTRATION_SUCCESSFUL, user))
    }

    /// Check credentials and, on a match, stamp the login time and log the user in
    pub fn login(&self, username: &str, password: &str) -> Result<AuthResponse, StorageError> {
        let mut store = self.lock_store();
        let mut users = store.load_all();

        // Same answer for unknown user and wrong password
        let index = match users
            .iter()
            .position(|u| u.matches_credentials(username, password))
        {
            Some(index) => index,
            None => {
                log_auth_event("login", username, false, Some(INVALID_CREDENTIALS));
                return Ok(AuthResponse::failure(INVALID_CREDENTIALS));
            }
        };

        let previous = users.clone();
        users[index].last_login_time = Utc::now();
        let user = users[index].clone();

        Self::commit(&mut store, &previous, &users, &user)?;
        self.session.stage(Some(user.clone()));
        drop(store);
        self.session.deliver_pending();

        log_auth_event("login", username, true, None);
        Ok(AuthResponse::success(LOGIN_SUCCESSFUL, user))
    }

    /// Forget the current session and publish absence. Safe to repeat.
    ///
    /// The token goes first: if it cannot be removed the snapshot and the
    /// live session are both left as they were.
    pub fn logout(&self) -> Result<(), StorageError> {
        let mut store = self.lock_store();
        store.storage_mut().remove(TOKEN_KEY)?;
        store.clear_current()?;

        let previous = self.session.value();
        self.session.stage(None);
        drop(store);
        self.session.deliver_pending();

        if let Some(user) = previous {
            log_auth_event("logout", &user.username, true, None);
        }
        Ok(())
    }

    /// Current session value without subscribing
    pub fn current_user_value(&self) -> Option<User> {
        self.session.value()
    }

    /// The observable session state
    pub fn current_user(&self) -> &SessionState {
        &self.session
    }

    /// Shorthand for `current_user().subscribe(listener)`
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        self.session.subscribe(listener)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Snapshot of every registered user
    pub fn users(&self) -> Vec<User> {
        self.lock_store().load_all()
    }

    fn lock_store(&self) -> MutexGuard<'_, UserStore<S>> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persist the new user list and snapshot, restoring `previous` if the
    /// snapshot write fails so that nothing is half-applied.
    fn commit(
        store: &mut UserStore<S>,
        previous: &[User],
        users: &[User],
        current: &User,
    ) -> Result<(), StorageError> {
        if let Err(e) = store.save_all(users) {
            log_data_operation("save_users", &current.username, "users", false, Some(&e.to_string()));
            return Err(e);
        }

        if let Err(e) = store.save_current(current) {
            log_data_operation(
                "save_current",
                &current.username,
                "currentUser",
                false,
                Some(&e.to_string()),
            );
            if let Err(rollback) = store.save_all(previous) {
                log_data_operation(
                    "restore_users",
                    &current.username,
                    "users",
                    false,
                    Some(&rollback.to_string()),
                );
            }
            return Err(e);
        }

        log_data_operation("save_users", &current.username, "users", true, None);
        Ok(())
    }
}
