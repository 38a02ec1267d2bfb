//! Identifier types for MFlix.
//!
//! Users are keyed by their email address, and sessions reference their owner
//! by the same value, so a single validated newtype covers both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated email address.
///
/// This is the business key of a user and the `user_id` of a session.
/// Parsing validates; deserializing a stored value takes it as-is.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Return the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the email and return the owned string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for Email {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(IdError::InvalidEmail(s.to_string()));
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_string()))
            }
            _ => Err(IdError::InvalidEmail(s.to_string())),
        }
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is empty.
    #[error("identifier must not be empty")]
    Empty,

    /// The input is not a usable email address.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_parses_plain_address() {
        let email: Email = "ned@example.com".parse().unwrap();
        assert_eq!(email.as_str(), "ned@example.com");
        assert_eq!(email.to_string(), "ned@example.com");
    }

    #[test]
    fn email_rejects_malformed_input() {
        assert_eq!(Email::from_str(""), Err(IdError::Empty));
        assert!(matches!(
            Email::from_str("no-at-sign"),
            Err(IdError::InvalidEmail(_))
        ));
        assert!(matches!(
            Email::from_str("@example.com"),
            Err(IdError::InvalidEmail(_))
        ));
        assert!(matches!(
            Email::from_str("ned@"),
            Err(IdError::InvalidEmail(_))
        ));
        assert!(matches!(
            Email::from_str("ned@a@b"),
            Err(IdError::InvalidEmail(_))
        ));
        assert!(matches!(
            Email::from_str("ned stark@example.com"),
            Err(IdError::InvalidEmail(_))
        ));
    }

    #[test]
    fn email_serializes_as_plain_string() {
        let email: Email = "arya@example.com".parse().unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"arya@example.com\"");

        let parsed: Email = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, email);
    }

    #[test]
    fn stored_email_is_read_without_validation() {
        let email: Email = serde_json::from_str("\"legacy user@localhost\"").unwrap();
        assert_eq!(email.as_str(), "legacy user@localhost");
        assert!(Email::from_str(email.as_str()).is_err());
    }
}
