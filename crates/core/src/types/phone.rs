//! Colombian mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Celular`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("phone number may only contain digits")]
    InvalidCharacters,
    /// Not exactly ten digits after removing the country code.
    #[error("phone number must have 10 digits (got {0})")]
    WrongLength(usize),
    /// Colombian mobile numbers start with 3.
    #[error("mobile numbers must start with 3")]
    NotMobile,
}

/// A Colombian mobile number (`celular`), stored as its ten national digits.
///
/// Spaces, dashes, dots and parentheses are ignored, as is a leading `+57`
/// or `57` country code when it precedes ten digits.
///
/// ```
/// use tq_core::Celular;
///
/// assert_eq!(Celular::parse("+57 300 123 4567").unwrap().as_str(), "3001234567");
/// assert!(Celular::parse("6011234567").is_err()); // landline
/// assert!(Celular::parse("300123456").is_err());  // 9 digits
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Celular(String);

impl Celular {
    /// Number of national digits.
    pub const DIGITS: usize = 10;

    /// Parse a `Celular` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains letters, does not
    /// have ten national digits, or does not start with 3.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let without_plus = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let mut digits = String::with_capacity(without_plus.len());
        for c in without_plus.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(PhoneError::InvalidCharacters),
            }
        }

        let national = match digits.len() {
            12 if digits.starts_with("57") => digits.split_off(2),
            _ => digits,
        };

        if national.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength(national.len()));
        }

        if !national.starts_with('3') {
            return Err(PhoneError::NotMobile);
        }

        Ok(Self(national))
    }

    /// Returns the ten national digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number with the country calling code, e.g. `573001234567`.
    ///
    /// This is the form `wa.me` links expect.
    #[must_use]
    pub fn international(&self, country_code: &str) -> String {
        format!("{country_code}{}", self.0)
    }
}

impl fmt::Display for Celular {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Celular {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Celular {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Celular> for String {
    fn from(phone: Celular) -> Self {
        phone.0
    }
}
