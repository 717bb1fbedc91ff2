//! Login identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Identifier`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The input string is empty.
    #[error("identifier cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("identifier must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a colon, which cannot appear in a Basic auth user-id.
    #[error("identifier cannot contain ':'")]
    ContainsColon,
}

/// The name a user logs in with: an email address or a username.
///
/// The identifier is sent as the user-id half of an HTTP Basic credential,
/// so it is validated against the constraints of that scheme.
///
/// ## Constraints
///
/// - Length: 1-254 characters
/// - Must not contain `:` (RFC 7617)
///
/// ## Examples
///
/// ```
/// use icycon_core::Identifier;
///
/// assert!(Identifier::parse("user@example.com").is_ok());
/// assert!(Identifier::parse("growth_team").is_ok());
///
/// assert!(Identifier::parse("").is_err());
/// assert!(Identifier::parse("user:name").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Maximum length of an identifier (matches the RFC 5321 email limit).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Identifier` from a string.
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 254
    /// characters, or contains a colon.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(IdentifierError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(IdentifierError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.contains(':') {
            return Err(IdentifierError::ContainsColon);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Identifier` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether the identifier looks like an email address rather than a username.
    #[must_use]
    pub fn is_email(&self) -> bool {
        self.0.contains('@')
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
