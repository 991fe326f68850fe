use chrono::{DateTime, Utc};
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::modules::storage::{KeyValueStore, StorageError};
use crate::{CURRENT_USER_KEY, USERS_KEY};

/// A stored credential entry.
///
/// The password is kept exactly as supplied; this store does no hashing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String, // Unique, case-sensitive
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub last_login_time: DateTime<Utc>, // Updated on each successful login
}

impl User {
    /// Build a fresh record with both timestamps set to `now`
    pub fn new(id: String, username: &str, password: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.to_string(),
            password: password.to_string(),
            created_at: now,
            last_login_time: now,
        }
    }

    /// Exact match on both fields
    pub fn matches_credentials(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// Random 128-bit hex id not used by any record in `existing`
pub fn generate_user_id(existing: &[User]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let bytes: [u8; 16] = rng.gen();
        let id = hex::encode(bytes);
        if !existing.iter().any(|u| u.id == id) {
            return id;
        }
    }
}

/// Persistence for the full user list and the current-user snapshot.
///
/// Reads fail open: a missing, unreadable or undecodable slot is treated as
/// empty rather than reported, so the service stays usable after corruption.
pub struct UserStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> UserStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// All persisted users in registration order, or empty
    pub fn load_all(&self) -> Vec<User> {
        self.read_slot::<Vec<User>>(USERS_KEY).unwrap_or_default()
    }

    /// Overwrite the persisted user list
    pub fn save_all(&mut self, users: &[User]) -> Result<(), StorageError> {
        let data = serde_json::to_string(users)?;
        self.storage.set(USERS_KEY, &data)
    }

    /// The persisted current-user snapshot, if any
    pub fn load_current(&self) -> Option<User> {
        self.read_slot::<User>(CURRENT_USER_KEY)
    }

    pub fn save_current(&mut self, user: &User) -> Result<(), StorageError> {
        let data = serde_json::to_string(user)?;
        self.storage.set(CURRENT_USER_KEY, &data)
    }

    pub fn clear_current(&mut self) -> Result<(), StorageError> {
        self.storage.remove(CURRENT_USER_KEY)
    }

    /// First record with exactly this username
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.load_all().into_iter().find(|u| u.username == username)
    }

    pub fn contains_username(&self, username: &str) -> bool {
        self.find_by_username(username).is_some()
    }

    fn read_slot<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.decode_slot(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Falling back to empty value: {}", e);
                None
            }
        }
    }

    fn decode_slot<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let raw = match self.storage.get(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    fn sample_user(username: &str) -> User {
        User::new(generate_user_id(&[]), username, "secret1", Utc::now())
    }

    #[test]
    fn test_empty_store() {
        let store = UserStore::new(MemoryStorage::new());
        assert!(store.load_all().is_empty());
        assert!(store.load_current().is_none());
        assert!(!store.contains_username("alice"));
    }

    #[test]
    fn test_save_and_load_users() {
        let mut store = UserStore::new(MemoryStorage::new());
        let users = vec![sample_user("alice"), sample_user("bob")];

        store.save_all(&users).unwrap();
        assert_eq!(store.load_all(), users);
        assert_eq!(store.find_by_username("bob"), Some(users[1].clone()));

        // Lookups are case-sensitive
        assert!(store.find_by_username("Alice").is_none());
    }

    #[test]
    fn test_current_user_snapshot() {
        let mut store = UserStore::new(MemoryStorage::new());
        let user = sample_user("alice");

        store.save_current(&user).unwrap();
        assert_eq!(store.load_current(), Some(user));

        store.clear_current().unwrap();
        assert!(store.load_current().is_none());
        assert!(store.clear_current().is_ok());
    }

    #[test]
    fn test_json_field_names() {
        let mut store = UserStore::new(MemoryStorage::new());
        store.save_current(&sample_user("alice")).unwrap();

        let raw = store.storage().get(CURRENT_USER_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for field in ["id", "username", "password", "createdAt", "lastLoginTime"] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
    }

    #[test]
    fn test_corrupt_slots_fail_open() {
        let mut storage = MemoryStorage::new();
        storage.set(USERS_KEY, "not json").unwrap();
        storage.set(CURRENT_USER_KEY, "{\"id\":").unwrap();

        let store = UserStore::new(storage);
        assert!(store.load_all().is_empty());
        assert!(store.load_current().is_none());
    }

    #[test]
    fn test_decode_reports_corruption() {
        let mut storage = MemoryStorage::new();
        storage.set(USERS_KEY, "[1, 2").unwrap();

        let store = UserStore::new(storage);
        let result = store.decode_slot::<Vec<User>>(USERS_KEY);
        assert!(matches!(result, Err(StorageError::Corrupt { ref key, .. }) if key == USERS_KEY));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut users: Vec<User> = Vec::new();
        for i in 0..50 {
            let id = generate_user_id(&users);
            assert_eq!(id.len(), 32);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(!users.iter().any(|u| u.id == id));
            users.push(User::new(id, &format!("user{}", i), "pw", Utc::now()));
        }
    }

    #[test]
    fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let user = sample_user("alice");

        let mut store = UserStore::new(FileStorage::new(temp_dir.path()));
        store.save_all(&[user.clone()]).unwrap();
        store.save_current(&user).unwrap();
        drop(store);

        let reopened = UserStore::new(FileStorage::new(temp_dir.path()));
        assert_eq!(reopened.load_all(), vec![user.clone()]);
        assert_eq!(reopened.load_current(), Some(user));
    }
}
