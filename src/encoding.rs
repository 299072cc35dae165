//! Text encodings applied to the child's standard streams.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors raised while converting between text and pipe bytes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The encoding label is not recognized.
    #[error("Unknown text encoding: {0}")]
    Unknown(String),

    /// A character cannot be represented in the target encoding.
    #[error("Cannot encode {character:?} as {encoding}")]
    Unencodable {
        encoding: TextEncoding,
        character: char,
    },

    /// The byte sequence is not valid in the source encoding.
    #[error("Invalid {encoding} data at byte offset {offset}")]
    Undecodable { encoding: TextEncoding, offset: usize },
}

/// Byte/text encoding used on all three pipes of a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// Strict 7-bit ASCII.
    Ascii,
}

impl TextEncoding {
    /// Canonical label, e.g. `"utf-8"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Ascii => "ascii",
        }
    }

    /// Encode `text` into `buf`, appending.
    ///
    /// Nothing is appended when an unencodable character is found.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError::Unencodable` for characters outside the
    /// encoding's repertoire.
    pub fn encode_into(self, text: &str, buf: &mut Vec<u8>) -> Result<(), EncodingError> {
        match self {
            Self::Utf8 => buf.extend_from_slice(text.as_bytes()),
            Self::Latin1 | Self::Ascii => {
                let limit = if self == Self::Ascii { 0x7F } else { 0xFF };
                if let Some(character) = text.chars().find(|c| u32::from(*c) > limit) {
                    return Err(EncodingError::Unencodable {
                        encoding: self,
                        character,
                    });
                }
                // Checked above: every char fits in a byte.
                buf.extend(text.chars().map(|c| u8::try_from(c).unwrap_or(b'?')));
            }
        }
        Ok(())
    }

    /// Decode `bytes` into a `String`.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError::Undecodable` if `bytes` is invalid for this
    /// encoding.
    pub fn decode(self, bytes: Vec<u8>) -> Result<String, EncodingError> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|e| EncodingError::Undecodable {
                encoding: self,
                offset: e.utf8_error().valid_up_to(),
            }),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(EncodingError::Undecodable {
                    encoding: self,
                    offset,
                }),
                None => Ok(bytes.into_iter().map(char::from).collect()),
            },
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            _ => Err(EncodingError::Unknown(s.to_string())),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = EncodingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextEncoding> for String {
    fn from(encoding: TextEncoding) -> Self {
        encoding.label().to_string()
    }
}
