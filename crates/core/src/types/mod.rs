//! Core types for Icycon.
//!
//! This module provides type-safe wrappers for the backend's JSON payloads.

pub mod feature;
pub mod identifier;
pub mod profile;

pub use feature::{Feature, FeatureList};
pub use identifier::{Identifier, IdentifierError};
pub use profile::{Profile, ProfileUpdate, UserId};
