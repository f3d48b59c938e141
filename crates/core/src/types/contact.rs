//! Customer contact details captured at checkout.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// The input is longer than RFC 5321 allows.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not have exactly one `@` separating two non-empty parts.
    #[error("email must look like name@domain")]
    Malformed,
    /// The input contains whitespace.
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A customer email address.
///
/// Surrounding whitespace is trimmed; the address must then contain exactly
/// one `@` with a non-empty local part and a domain that contains a dot.
///
/// ```
/// use preluda_core::Email;
///
/// assert!(Email::parse(" kupac@example.rs ").is_ok());
/// assert!(Email::parse("kupac@localhost").is_err());
/// assert!(Email::parse("a@b@c.rs").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, contains
    /// whitespace, or is not of the form `local@domain.tld`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::Malformed)?;
        let domain_ok = domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.');
        if local.is_empty() || domain.contains('@') || !domain_ok {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part (after the `@`).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// Errors that can occur when parsing an [`InstagramHandle`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InstagramHandleError {
    /// Nothing left after stripping `@` and whitespace.
    #[error("instagram handle cannot be empty")]
    Empty,
    /// Instagram usernames are limited to 30 characters.
    #[error("instagram handle must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Only letters, digits, `.` and `_` are allowed.
    #[error("instagram handle contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// An Instagram username supplied for the follower promotion.
///
/// Its presence on an order is the promo flag that grants the checkout
/// discount. Stored lowercase without the leading `@`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct InstagramHandle(String);

impl InstagramHandle {
    /// Maximum username length accepted by Instagram.
    pub const MAX_LENGTH: usize = 30;

    /// Parse a handle as typed by a customer (`@Name`, ` name `, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized handle is empty, too long, or
    /// contains characters Instagram does not allow.
    pub fn parse(s: &str) -> Result<Self, InstagramHandleError> {
        let handle = s.trim().trim_start_matches('@').to_lowercase();
        if handle.is_empty() {
            return Err(InstagramHandleError::Empty);
        }
        if handle.chars().count() > Self::MAX_LENGTH {
            return Err(InstagramHandleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(bad) = handle
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_'))
        {
            return Err(InstagramHandleError::InvalidCharacter(bad));
        }
        Ok(Self(handle))
    }

    /// Returns the handle without the leading `@`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstagramHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl TryFrom<String> for InstagramHandle {
    type Error = InstagramHandleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InstagramHandle> for String {
    fn from(handle: InstagramHandle) -> Self {
        handle.0
    }
}
