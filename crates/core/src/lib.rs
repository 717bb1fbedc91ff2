//! Icycon Core - Shared wire types for the Icycon API client.
//!
//! This crate provides the types exchanged with the Icycon backend. It is
//! used by:
//! - `client` - Authenticated request layer and session state
//! - `cli` - Command-line front end built on the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Login identifiers, user profiles, and feature descriptors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
