//! Stream filter chains
//!
//! Decoding and encoding of stream payloads according to ISO 32000-1
//! Section 7.4. The text filters and FlateDecode are implemented; the
//! image codecs are recognized but unsupported. `Crypt` passes data
//! through untouched here because document encryption handles it at the
//! parsing layer.

use crate::error::{PdfError, PdfResult};
use crate::objects::Object;

/// Standard stream filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// ASCII hex decode
    ASCIIHexDecode,

    /// ASCII 85 decode
    ASCII85Decode,

    /// LZW decode
    LZWDecode,

    /// Flate decode (zlib/deflate compression)
    FlateDecode,

    /// Run length decode
    RunLengthDecode,

    /// CCITT fax decode
    CCITTFaxDecode,

    /// JBIG2 decode
    JBIG2Decode,

    /// DCT decode (JPEG)
    DCTDecode,

    /// JPX decode (JPEG 2000)
    JPXDecode,

    /// Crypt filter
    Crypt,
}

impl Filter {
    /// Parses a filter from its `/Filter` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ASCIIHexDecode" => Some(Filter::ASCIIHexDecode),
            "ASCII85Decode" => Some(Filter::ASCII85Decode),
            "LZWDecode" => Some(Filter::LZWDecode),
            "FlateDecode" => Some(Filter::FlateDecode),
            "RunLengthDecode" => Some(Filter::RunLengthDecode),
            "CCITTFaxDecode" => Some(Filter::CCITTFaxDecode),
            "JBIG2Decode" => Some(Filter::JBIG2Decode),
            "DCTDecode" => Some(Filter::DCTDecode),
            "JPXDecode" => Some(Filter::JPXDecode),
            "Crypt" => Some(Filter::Crypt),
            _ => None,
        }
    }

    /// The `/Filter` name of this filter.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::ASCIIHexDecode => "ASCIIHexDecode",
            Filter::ASCII85Decode => "ASCII85Decode",
            Filter::LZWDecode => "LZWDecode",
            Filter::FlateDecode => "FlateDecode",
            Filter::RunLengthDecode => "RunLengthDecode",
            Filter::CCITTFaxDecode => "CCITTFaxDecode",
            Filter::JBIG2Decode => "JBIG2Decode",
            Filter::DCTDecode => "DCTDecode",
            Filter::JPXDecode => "JPXDecode",
            Filter::Crypt => "Crypt",
        }
    }

    /// Extracts a filter chain from a `/Filter` value: absent means no
    /// filters, a single name means one, an array of names several.
    pub fn chain_from_object(value: Option<&Object>) -> PdfResult<Vec<Filter>> {
        match value {
            None => Ok(Vec::new()),
            Some(Object::Name(name)) => Ok(vec![Self::named(name.as_str())?]),
            Some(Object::Array(items)) => {
                let mut chain = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Object::Name(name) => chain.push(Self::named(name.as_str())?),
                        other => {
                            return Err(PdfError::invalid_type(format!(
                                "filter array entry is not a name: {other:?}"
                            )))
                        }
                    }
                }
                Ok(chain)
            }
            Some(other) => Err(PdfError::invalid_type(format!(
                "/Filter is neither a name nor an array of names: {other:?}"
            ))),
        }
    }

    fn named(name: &str) -> PdfResult<Filter> {
        Filter::from_name(name).ok_or_else(|| PdfError::UnsupportedFilter(name.to_string()))
    }

    /// Decodes one filter's worth of encoding.
    pub fn decode(&self, data: &[u8]) -> PdfResult<Vec<u8>> {
        match self {
            Filter::FlateDecode => decode_flate(data),
            Filter::ASCIIHexDecode => decode_ascii_hex(data),
            Filter::ASCII85Decode => decode_ascii85(data),
            Filter::Crypt => Ok(data.to_vec()),
            other => Err(PdfError::UnsupportedFilter(other.name().to_string())),
        }
    }

    /// Applies one filter's worth of encoding.
    pub fn encode(&self, data: &[u8]) -> PdfResult<Vec<u8>> {
        match self {
            Filter::FlateDecode => encode_flate(data),
            Filter::ASCIIHexDecode => Ok(encode_ascii_hex(data)),
            Filter::Crypt => Ok(data.to_vec()),
            other => Err(PdfError::UnsupportedFilter(format!(
                "{} encoding",
                other.name()
            ))),
        }
    }
}

/// Decodes `data` through `chain`. The first `/Filter` entry is the first
/// one applied when decoding.
pub fn decode_chain(data: &[u8], chain: &[Filter]) -> PdfResult<Vec<u8>> {
    let mut result = data.to_vec();
    for filter in chain {
        result = filter.decode(&result)?;
    }
    Ok(result)
}

/// Encodes `data` through `chain`. Encoding runs the chain backwards so
/// that decoding in `/Filter` order restores the original bytes.
pub fn encode_chain(data: &[u8], chain: &[Filter]) -> PdfResult<Vec<u8>> {
    let mut result = data.to_vec();
    for filter in chain.iter().rev() {
        result = filter.encode(&result)?;
    }
    Ok(result)
}

/// Decode FlateDecode (zlib/deflate) compressed data
#[cfg(feature = "compression")]
fn decode_flate(data: &[u8]) -> PdfResult<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| PdfError::StreamDecode(format!("Flate decode error: {e}")))?;
    Ok(result)
}

#[cfg(not(feature = "compression"))]
fn decode_flate(_data: &[u8]) -> PdfResult<Vec<u8>> {
    Err(PdfError::FlateUnavailable)
}

#[cfg(feature = "compression")]
fn encode_flate(data: &[u8]) -> PdfResult<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfError::StreamDecode(format!("Flate encode error: {e}")))
}

#[cfg(not(feature = "compression"))]
fn encode_flate(_data: &[u8]) -> PdfResult<Vec<u8>> {
    Err(PdfError::FlateUnavailable)
}

/// Decode ASCIIHexDecode data
fn decode_ascii_hex(data: &[u8]) -> PdfResult<Vec<u8>> {
    let mut result = Vec::new();
    let mut chars = data.iter().filter(|&&b| !b.is_ascii_whitespace());

    loop {
        let high = match chars.next() {
            Some(&b'>') => break, // End marker
            Some(&ch) => ch,
            None => break,
        };

        let low = match chars.next() {
            // Odd number of digits behaves as if a trailing 0 were present
            Some(&b'>') | None => b'0',
            Some(&ch) => ch,
        };

        let high_val = hex_digit_value(high).ok_or_else(|| {
            PdfError::StreamDecode(format!("Invalid hex digit: {}", high as char))
        })?;
        let low_val = hex_digit_value(low)
            .ok_or_else(|| PdfError::StreamDecode(format!("Invalid hex digit: {}", low as char)))?;

        result.push((high_val << 4) | low_val);
    }

    Ok(result)
}

fn encode_ascii_hex(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() * 2 + 1);
    for byte in data {
        result.push(HEX_DIGITS[(byte >> 4) as usize]);
        result.push(HEX_DIGITS[(byte & 0x0F) as usize]);
    }
    result.push(b'>');
    result
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Get value of hex digit
fn hex_digit_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

/// Decode ASCII85Decode data
fn decode_ascii85(data: &[u8]) -> PdfResult<Vec<u8>> {
    let mut result = Vec::new();
    let mut chars = data.iter().filter(|&&b| !b.is_ascii_whitespace());
    let mut group: Vec<u8> = Vec::with_capacity(5);

    // Skip optional <~ prefix
    let mut ch = match chars.next() {
        Some(&b'<') => {
            if chars.next() == Some(&b'~') {
                chars.next()
            } else {
                // Not a valid prefix, treat '<' as data
                Some(&b'<')
            }
        }
        other => other,
    };

    while let Some(&c) = ch {
        match c {
            b'~' => {
                // End marker is ~>
                if chars.next() == Some(&b'>') {
                    break;
                } else {
                    return Err(PdfError::StreamDecode(
                        "Invalid ASCII85 end marker".to_string(),
                    ));
                }
            }
            b'z' if group.is_empty() => {
                // 'z' is shorthand for four zero bytes
                result.extend_from_slice(&[0, 0, 0, 0]);
            }
            b'!'..=b'u' => {
                group.push(c);
                if group.len() == 5 {
                    let value = group
                        .iter()
                        .enumerate()
                        .map(|(i, &ch)| (ch - b'!') as u32 * 85u32.pow(4 - i as u32))
                        .sum::<u32>();

                    result.push((value >> 24) as u8);
                    result.push((value >> 16) as u8);
                    result.push((value >> 8) as u8);
                    result.push(value as u8);

                    group.clear();
                }
            }
            _ => {
                return Err(PdfError::StreamDecode(format!(
                    "Invalid ASCII85 character: {}",
                    c as char
                )));
            }
        }
        ch = chars.next();
    }

    // Incomplete final group: pad with 'u', drop the padding bytes
    if !group.is_empty() {
        let original_len = group.len();
        while group.len() < 5 {
            group.push(b'u');
        }
        let value = group
            .iter()
            .enumerate()
            .map(|(i, &ch)| (ch - b'!') as u32 * 85u32.pow(4 - i as u32))
            .sum::<u32>();

        let bytes = [
            (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ];
        result.extend_from_slice(&bytes[..original_len.saturating_sub(1)]);
    }

    Ok(result)
}
