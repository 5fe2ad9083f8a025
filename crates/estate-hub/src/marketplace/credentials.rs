use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;
use tracing::{debug, info};

use super::domain::{Principal, User};

/// Hashing capability used by the credential store.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashingError>;
    fn verify(&self, digest: &str, password: &str) -> bool;
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashingError(pub String);

/// Argon2id with the crate's default parameters; digests are PHC strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|err| HashingError(err.to_string()))
    }

    fn verify(&self, digest: &str, password: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("An account with email {email} already exists")]
pub struct DuplicateEmail {
    pub email: String,
}

/// Registered accounts for the lifetime of the process.
pub struct CredentialStore<H> {
    hasher: Arc<H>,
    users: Mutex<Vec<User>>,
}

impl<H> CredentialStore<H>
where
    H: PasswordHasher,
{
    pub fn new(hasher: Arc<H>) -> Self {
        Self {
            hasher,
            users: Mutex::new(Vec::new()),
        }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// First registration for an email wins.
    pub fn register(&self, user: User) -> Result<(), DuplicateEmail> {
        let mut users = self.users();
        if users.iter().any(|existing| existing.email == user.email) {
            debug!(email = %user.email, "rejecting duplicate registration");
            return Err(DuplicateEmail { email: user.email });
        }

        info!(email = %user.email, role = user.role.label(), "registered account");
        users.push(user);
        Ok(())
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.users()
            .iter()
            .find(|user| user.email == email)
            .cloned()
    }

    /// Resolve a login attempt. Unknown emails and wrong passwords both yield `None`.
    pub fn verify_login(&self, email: &str, password: &str) -> Option<Principal> {
        let user = self.find_by_email(email)?;
        if self.hasher.verify(&user.password_digest, password) {
            Some(user.principal())
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.users().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users().is_empty()
    }

    fn users(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
