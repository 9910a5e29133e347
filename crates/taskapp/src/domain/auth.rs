//! Authentication domain facade.
//!
//! Accounts live in the local store next to the task lists. Credentials are
//! kept as salted SHA-256 digests; this is a single-machine login, not an
//! identity provider.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{Session, User};
use crate::errors::{TasksError, TasksResult};
use crate::storage::Storage;

/// Shortest accepted password, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap());

// Letters (including Latin-1 accented) and whitespace
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÀ-ÿ\s]+$").unwrap());

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn invalid(reason: &str) -> TasksError {
    TasksError::InvalidArgument {
        reason: reason.to_string(),
    }
}

/// Authentication facade: registration, login and the active session
pub struct AuthDomain {
    storage: Arc<dyn Storage>,
}

impl AuthDomain {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> TasksResult<User> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        let password = password.trim();

        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(invalid("all fields are required"));
        }
        if !NAME_PATTERN.is_match(name) {
            return Err(invalid("name must contain only letters"));
        }
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(invalid("invalid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(TasksError::WeakPassword {
                min_len: MIN_PASSWORD_LEN,
            });
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user = User {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            password_hash: hash_password(&salt, password),
            salt,
            email,
            created_at: Utc::now(),
        };

        // Duplicate check and append happen under the store's write lock
        self.storage
            .update_users_with(&mut |users: &mut Vec<User>| {
                if users.iter().any(|u| u.email == user.email) {
                    return Err(TasksError::EmailAlreadyRegistered {
                        email: user.email.clone(),
                    });
                }
                users.push(user.clone());
                Ok(())
            })
            .await?;

        info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(user)
    }

    /// Verify credentials and start a session
    pub async fn login(&self, email: &str, password: &str) -> TasksResult<User> {
        let email = email.trim().to_lowercase();
        let password = password.trim();

        if email.is_empty() || password.is_empty() {
            return Err(invalid("all fields are required"));
        }
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(invalid("invalid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid("password too short"));
        }

        let users = self.storage.load_users().await?;
        let user = users
            .into_iter()
            .find(|u| u.email == email)
            .filter(|u| hash_password(&u.salt, password) == u.password_hash);

        let Some(user) = user else {
            warn!(email = %email, "Login rejected");
            return Err(TasksError::InvalidCredentials);
        };

        self.storage.save_session(&Session::login(&user.id)).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// End the active session, if any
    pub async fn logout(&self) -> TasksResult<()> {
        self.storage.save_session(&Session::default()).await?;
        info!("User logged out");
        Ok(())
    }

    /// The logged-in user
    pub async fn current_user(&self) -> TasksResult<User> {
        let session = self.storage.load_session().await?;
        let user_id = session.user_id.ok_or(TasksError::NotAuthenticated)?;

        let users = self.storage.load_users().await?;
        users.into_iter().find(|u| u.id == user_id).ok_or_else(|| {
            warn!(user_id = %user_id, "Session refers to unknown user");
            TasksError::NotAuthenticated
        })
    }
}
