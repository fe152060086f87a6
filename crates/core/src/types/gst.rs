//! GST identification number type.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Alphabet used by the GSTIN check character (base 36).
const GSTIN_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors that can occur when parsing a [`GstNo`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GstNoError {
    /// The input string is empty.
    #[error("GST number cannot be empty")]
    Empty,
    /// The input is not exactly 15 characters long.
    #[error("GST number must be exactly {expected} characters (got {actual})")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Length of the input.
        actual: usize,
    },
    /// A character is not valid at its position.
    #[error("GST number has an invalid character at position {position}")]
    InvalidCharacter {
        /// 1-based position of the offending character.
        position: usize,
    },
    /// The check character does not match the first 14 characters.
    #[error("GST number check character does not match")]
    ChecksumMismatch,
}

/// A GST identification number (GSTIN).
///
/// ## Format
///
/// - Characters 1-2: state code (digits)
/// - Characters 3-12: PAN of the holder (5 letters, 4 digits, 1 letter)
/// - Character 13: entity number (alphanumeric)
/// - Character 14: always `Z`
/// - Character 15: base-36 check character
///
/// Input is trimmed and upper-cased before validation.
///
/// ## Examples
///
/// ```
/// use tooldepot_core::GstNo;
///
/// assert!(GstNo::parse("27AAPFU0939F1ZV").is_ok());
/// assert!(GstNo::parse("27aapfu0939f1zv").is_ok());
///
/// assert!(GstNo::parse("").is_err());                // empty
/// assert!(GstNo::parse("27AAPFU0939F1Z").is_err());  // too short
/// assert!(GstNo::parse("27AAPFU0939F1ZA").is_err()); // bad check character
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct GstNo(String);

impl GstNo {
    /// Length of every GSTIN.
    pub const LENGTH: usize = 15;

    /// Parse a `GstNo` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is not 15 characters long
    /// - Has a character that is invalid for its position
    /// - Has a check character that does not match
    pub fn parse(s: &str) -> Result<Self, GstNoError> {
        let normalized = s.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(GstNoError::Empty);
        }

        let bytes = normalized.as_bytes();
        if bytes.len() != Self::LENGTH {
            return Err(GstNoError::WrongLength {
                expected: Self::LENGTH,
                actual: normalized.chars().count(),
            });
        }

        for (index, byte) in bytes.iter().enumerate() {
            let valid = match index {
                0 | 1 | 7..=10 => byte.is_ascii_digit(),
                2..=6 | 11 => byte.is_ascii_uppercase(),
                13 => *byte == b'Z',
                _ => byte.is_ascii_alphanumeric(),
            };
            if !valid {
                return Err(GstNoError::InvalidCharacter {
                    position: index + 1,
                });
            }
        }

        let (body, check) = bytes.split_at(Self::LENGTH - 1);
        if check.first() != Some(&check_character(body)) {
            return Err(GstNoError::ChecksumMismatch);
        }

        Ok(Self(normalized))
    }

    /// Returns the GSTIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `GstNo` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Two-digit state code the number was registered in.
    #[must_use]
    pub fn state_code(&self) -> &str {
        self.0.get(..2).unwrap_or("")
    }

    /// PAN embedded in the number.
    #[must_use]
    pub fn pan(&self) -> &str {
        self.0.get(2..12).unwrap_or("")
    }
}

/// Compute the base-36 check character over the first 14 characters.
fn check_character(body: &[u8]) -> u8 {
    let sum: usize = body
        .iter()
        .enumerate()
        .map(|(index, byte)| {
            let value = GSTIN_ALPHABET
                .iter()
                .position(|c| c == byte)
                .unwrap_or_default();
            let product = value * if index % 2 == 0 { 1 } else { 2 };
            product / 36 + product % 36
        })
        .sum();

    GSTIN_ALPHABET
        .get((36 - sum % 36) % 36)
        .copied()
        .unwrap_or(b'0')
}

impl fmt::Display for GstNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for GstNo {
    type Err = GstNoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for GstNo {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Deserialized values go through the same validation as `parse`
impl<'de> Deserialize<'de> for GstNo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_numbers() {
        assert!(GstNo::parse("27AAPFU0939F1ZV").is_ok());
        assert!(GstNo::parse("29ABCDE1234F1ZW").is_ok());
        assert!(GstNo::parse("07AAACH7409R1Z3").is_ok());
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let gst = GstNo::parse("  27aapfu0939f1zv ").unwrap();
        assert_eq!(gst.as_str(), "27AAPFU0939F1ZV");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(GstNo::parse("   "), Err(GstNoError::Empty));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            GstNo::parse("27AAPFU0939F1Z"),
            Err(GstNoError::WrongLength {
                expected: 15,
                actual: 14
            })
        ));
    }

    #[test]
    fn test_parse_invalid_character() {
        // Position 3 must be a letter
        assert_eq!(
            GstNo::parse("2712PFU0939F1ZV"),
            Err(GstNoError::InvalidCharacter { position: 3 })
        );
        // Position 14 must be Z
        assert_eq!(
            GstNo::parse("27AAPFU0939F1YV"),
            Err(GstNoError::InvalidCharacter { position: 14 })
        );
    }

    #[test]
    fn test_parse_checksum_mismatch() {
        assert_eq!(
            GstNo::parse("27AAPFU0939F1ZA"),
            Err(GstNoError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_parts() {
        let gst = GstNo::parse("27AAPFU0939F1ZV").unwrap();
        assert_eq!(gst.state_code(), "27");
        assert_eq!(gst.pan(), "AAPFU0939F");
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<GstNo>("\"27AAPFU0939F1ZA\"").is_err());
        let gst: GstNo = serde_json::from_str("\"27AAPFU0939F1ZV\"").unwrap();
        assert_eq!(gst.to_string(), "27AAPFU0939F1ZV");
    }
}
