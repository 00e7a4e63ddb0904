//! PDF name objects

use std::fmt;

/// A PDF name, stored in decoded form (after `#XX` unescaping).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    /// Decodes a raw name token: `#XX` pairs become the byte they denote.
    /// A `#` not followed by two hex digits is kept literally, and raw
    /// high bytes survive through lossy UTF-8.
    pub fn from_escaped(raw: &str) -> Self {
        let bytes = raw.as_bytes();
        let mut decoded = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'#' {
                if let Some(&[hi, lo]) = bytes.get(i + 1..i + 3) {
                    if let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) {
                        decoded.push(hi << 4 | lo);
                        i += 3;
                        continue;
                    }
                }
            }
            decoded.push(bytes[i]);
            i += 1;
        }
        Name(String::from_utf8_lossy(&decoded).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name(value)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
