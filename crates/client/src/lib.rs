//! Icycon client - authenticated access to the Icycon REST backend.
//!
//! # Architecture
//!
//! Three layers, leaves first:
//!
//! - [`credentials`] - Durable store for the one logged-in user's credentials
//!   and cached profile, over a pluggable [`storage`] backend
//! - [`executor`] - Builds and sends requests with HTTP Basic auth, reads the
//!   body once, and normalizes errors into [`ApiError`]
//! - [`session`] - Application-wide auth state with background refresh of
//!   features and profile
//!
//! Typed endpoint wrappers live in [`api`]; configuration in [`config`].
//!
//! # Security
//!
//! HTTP Basic resends the password on every call, so the password is
//! persisted in plaintext by the credential store. It is held as a
//! `SecretString` in memory and redacted from `Debug` output.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod session;
pub mod storage;

pub use api::CreateRequest;
pub use config::{ClientConfig, ConfigError};
pub use credentials::{CredentialRecord, CredentialStore, Credentials};
pub use error::ApiError;
pub use executor::{ApiClient, ApiRequest, RequestBody, ResponseBody};
pub use session::{Session, SessionStatus};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
