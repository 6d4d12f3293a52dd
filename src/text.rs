//! String decode/encode for `Text` event bodies.
//!
//! The encoding is selected by the project's `FlVersion`: below the unicode
//! threshold, strings are one byte per codepoint in an implementation
//! -defined 8-bit charset (treated here as Latin-1, the closest lossless
//! byte-for-byte mapping); at or above it, strings are UTF-16LE. A string
//! may carry a single trailing NUL terminator, stripped on read and
//! re-added on write only if it was present originally, grounded on the
//! teacher's `Text` type (`text.rs`) which likewise remembers enough to
//! round-trip losslessly.

use crate::version::FlVersion;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StringEncoding {
    Ansi,
    Utf16Le,
}

impl StringEncoding {
    pub(crate) fn for_version(version: FlVersion) -> Self {
        if version >= FlVersion::UNICODE_THRESHOLD {
            StringEncoding::Utf16Le
        } else {
            StringEncoding::Ansi
        }
    }
}

/// A decoded `Text` event body, remembering whether the source bytes carried
/// a trailing NUL terminator so that an unmodified string round-trips byte
/// for byte.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Text {
    value: String,
    had_terminator: bool,
}

impl Text {
    /// Creates a new `Text` that will be written with a terminator.
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
            had_terminator: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn set<S: Into<String>>(&mut self, value: S) {
        self.value = value.into();
    }

    pub(crate) fn decode(bytes: &[u8], encoding: StringEncoding) -> Self {
        match encoding {
            StringEncoding::Ansi => {
                let mut bytes = bytes.to_vec();
                let had_terminator = bytes.last() == Some(&0);
                if had_terminator {
                    bytes.pop();
                }
                let value = bytes.iter().map(|&b| b as char).collect();
                Self {
                    value,
                    had_terminator,
                }
            }
            StringEncoding::Utf16Le => {
                let mut units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
                    .collect();
                let had_terminator = units.last() == Some(&0);
                if had_terminator {
                    units.pop();
                }
                let value = String::from_utf16_lossy(&units);
                Self {
                    value,
                    had_terminator,
                }
            }
        }
    }

    pub(crate) fn encode(&self, encoding: StringEncoding) -> Vec<u8> {
        match encoding {
            StringEncoding::Ansi => {
                let mut bytes: Vec<u8> = self
                    .value
                    .chars()
                    .map(|c| {
                        if c as u32 > 0xFF {
                            log::warn!("lossy ANSI encode of non-Latin-1 char {:?}, writing '?'", c);
                            b'?'
                        } else {
                            c as u8
                        }
                    })
                    .collect();
                if self.had_terminator {
                    bytes.push(0);
                }
                bytes
            }
            StringEncoding::Utf16Le => {
                let mut bytes = Vec::with_capacity(self.value.len() * 2 + 2);
                for unit in self.value.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                if self.had_terminator {
                    bytes.extend_from_slice(&0u16.to_le_bytes());
                }
                bytes
            }
        }
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.value, f)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::new(s)
    }
}

impl From<Text> for String {
    fn from(t: Text) -> Self {
        t.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_roundtrip_with_terminator() {
        let bytes = b"Master\0";
        let text = Text::decode(bytes, StringEncoding::Ansi);
        assert_eq!("Master", text.as_str());
        assert_eq!(bytes.to_vec(), text.encode(StringEncoding::Ansi));
    }

    #[test]
    fn ansi_roundtrip_without_terminator() {
        let bytes = b"Master";
        let text = Text::decode(bytes, StringEncoding::Ansi);
        assert_eq!("Master", text.as_str());
        assert_eq!(bytes.to_vec(), text.encode(StringEncoding::Ansi));
    }

    #[test]
    fn utf16_roundtrip_with_terminator() {
        let mut bytes = Vec::new();
        for unit in "Insert 1".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        let text = Text::decode(&bytes, StringEncoding::Utf16Le);
        assert_eq!("Insert 1", text.as_str());
        assert_eq!(bytes, text.encode(StringEncoding::Utf16Le));
    }

    #[test]
    fn encoding_selected_by_version() {
        assert_eq!(
            StringEncoding::Ansi,
            StringEncoding::for_version(FlVersion::new(9, 0, 0, None))
        );
        assert_eq!(
            StringEncoding::Utf16Le,
            StringEncoding::for_version(FlVersion::new(11, 5, 0, None))
        );
        assert_eq!(
            StringEncoding::Utf16Le,
            StringEncoding::for_version(FlVersion::new(20, 9, 1, None))
        );
    }
}
