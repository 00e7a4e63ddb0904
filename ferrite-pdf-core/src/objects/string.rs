//! PDF string objects

use std::fmt;
use std::str::Utf8Error;

/// A PDF string: arbitrary bytes plus the form it was written in.
///
/// PDF has two string syntaxes, literal `(...)` and hex `<...>`. The
/// backing form is remembered so a writer can round-trip it; it does not
/// participate in equality beyond the derived comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString {
    data: Vec<u8>,
    hex: bool,
}

impl PdfString {
    /// Creates a literal-backed string.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        PdfString {
            data: data.into(),
            hex: false,
        }
    }

    /// Creates a hex-backed string from already decoded bytes.
    pub fn hex_backed(data: impl Into<Vec<u8>>) -> Self {
        PdfString {
            data: data.into(),
            hex: true,
        }
    }

    /// Decodes a run of hex digit characters into a hex-backed string.
    /// An odd digit count behaves as if a trailing `0` were present.
    pub fn from_hex_digits(digits: &[u8]) -> Self {
        let mut data = Vec::with_capacity(digits.len().div_ceil(2));
        let mut chunks = digits.chunks_exact(2);
        for pair in &mut chunks {
            data.push(hex_nibble(pair[0]) << 4 | hex_nibble(pair[1]));
        }
        if let [odd] = chunks.remainder() {
            data.push(hex_nibble(*odd) << 4);
        }
        PdfString { data, hex: true }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether the string was written in hex form.
    pub fn is_hex(&self) -> bool {
        self.hex
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The content as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.data)
    }
}

/// Value of a hex digit character. Callers guarantee the input is a hex
/// digit; anything else maps to zero.
fn hex_nibble(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}

impl fmt::Display for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.data))
    }
}

impl From<&str> for PdfString {
    fn from(value: &str) -> Self {
        PdfString::new(value.as_bytes())
    }
}
