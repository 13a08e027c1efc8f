//! Package token newtype.
//!
//! A token is the unique identifier of a package within the receipt registry,
//! so it doubles as a directory name under the caskroom and as part of
//! cached download file names.

use super::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated package token such as `pikachuexe-freetube`.
///
/// Tokens are lowercase ASCII letters and digits plus `-`, `_`, `.`, and
/// `@`, and must start with a letter or digit.
///
/// # Examples
///
/// ```
/// use casket::manifest::token::Token;
///
/// let token = Token::try_from("pikachuexe-freetube").expect("valid token");
/// assert_eq!(token.as_str(), "pikachuexe-freetube");
/// assert!(Token::try_from("Not A Token").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Return the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Token {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self> {
        validate_token(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Token {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> {
        validate_token(&value)?;
        Ok(Self(value))
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_token(value: &str) -> Result<()> {
    let invalid = |reason: &str| ManifestError::InvalidToken {
        value: value.to_owned(),
        reason: reason.to_owned(),
    };

    let Some(first) = value.chars().next() else {
        return Err(invalid("token must not be empty"));
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return Err(invalid("token must start with a lowercase letter or digit"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || "-_.@".contains(*c)))
    {
        return Err(ManifestError::InvalidToken {
            value: value.to_owned(),
            reason: format!("unsupported character '{bad}'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("freetube")]
    #[case::hyphenated("pikachuexe-freetube")]
    #[case::versioned("python@3.12")]
    #[case::leading_digit("1password")]
    fn accepts_valid_tokens(#[case] value: &str) {
        assert!(Token::try_from(value).is_ok(), "expected {value} to be valid");
    }

    #[rstest]
    #[case::empty("")]
    #[case::uppercase("FreeTube")]
    #[case::space("free tube")]
    #[case::slash("../etc")]
    #[case::leading_hyphen("-freetube")]
    fn rejects_invalid_tokens(#[case] value: &str) {
        assert!(
            matches!(Token::try_from(value), Err(ManifestError::InvalidToken { .. })),
            "expected {value} to be rejected"
        );
    }

    #[test]
    fn round_trips_through_string() {
        let token = Token::try_from("freetube").expect("valid token");
        let raw: String = token.clone().into();
        assert_eq!(Token::try_from(raw), Ok(token));
    }
}
