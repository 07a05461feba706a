//! User and identity records shared by the loader and the web service,
//! and the capability surface a storage backend must provide.
//!
//! This crate ships no backend of its own: cmsweb supplies a disk-backed
//! implementation and tests substitute an in-memory one. Backends own
//! all persisted state; callers receive copies and route every mutation
//! through [`Database::user_update`].

pub mod user;

use thiserror::Error;

pub use user::{
    Identity, PUBLIC_KEY_SIZE, PublicKey, User, active_identity, active_identity_hex,
};

/// Typed failure conditions surfaced by a [`Database`] backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    /// No record matched the lookup key.
    #[error("user not found")]
    UserNotFound,

    /// The email or username is already taken.
    #[error("user already exists")]
    UserExists,

    /// The email address is not properly formatted.
    #[error("invalid user email")]
    InvalidEmail,

    /// The backend has been closed; no further operations are served.
    #[error("database is shutting down")]
    Shutdown,

    /// Storage-internal failure.
    #[error("database backend failure: {0}")]
    Backend(String),
}

/// Capability surface required of a storage backend.
///
/// Operations are self-contained requests; the backend serialises
/// conflicting writes to the same record. Invoked concurrently by
/// multiple callers.
pub trait Database: Send + Sync {
    /// Return the user record keyed by email.
    fn user_get(&self, email: &str) -> Result<User, DbError>;

    /// Return the user record with the given username.
    fn user_get_by_username(&self, username: &str) -> Result<User, DbError>;

    /// Return the user record with the given id.
    fn user_get_by_id(&self, id: u64) -> Result<User, DbError>;

    /// Add a new user record.
    fn user_new(&self, user: User) -> Result<(), DbError>;

    /// Replace the existing record with the same id.
    fn user_update(&self, user: User) -> Result<(), DbError>;

    /// Apply `visit` to every user record, in no particular order,
    /// without materialising the full set.
    fn all_users(&self, visit: &mut dyn FnMut(&User)) -> Result<(), DbError>;

    /// Release backend resources. Later operations fail with
    /// [`DbError::Shutdown`].
    fn close(&self) -> Result<(), DbError>;
}
