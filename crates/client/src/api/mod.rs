//! Typed endpoint families.
//!
//! Each submodule adds methods to [`ApiClient`](crate::ApiClient) for one
//! area of the backend. The wire format stays freeform JSON; these wrappers
//! give callers a concrete type per endpoint.

pub mod auth;
pub mod create;
pub mod features;
pub mod profile;

pub use auth::{LoginResponse, SignupResponse};
pub use create::*;
