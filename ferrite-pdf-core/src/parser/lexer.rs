//! PDF object-syntax tokenizer
//!
//! Splits a device's byte stream into word and delimiter tokens under
//! PDF's whitespace, delimiter and comment rules. Tokens read ahead can
//! be pushed back onto a FIFO queue and are replayed before any further
//! device bytes, which is how the reference-vs-number lookahead keeps the
//! stream consistent.

use std::collections::VecDeque;

use lazy_static::lazy_static;

use crate::device::StreamDevice;
use crate::error::{PdfError, PdfResult};
use crate::options::ParseOptions;

/// Upper bound on a single token's length. A longer run of regular
/// characters splits into several tokens.
pub(super) const TOKEN_BUFFER_SIZE: usize = 4096;

lazy_static! {
    /// The ten delimiter characters of PDF object syntax.
    static ref DELIMITER_MAP: [bool; 256] = {
        let mut map = [false; 256];
        for c in [b'(', b')', b'<', b'>', b'[', b']', b'{', b'}', b'/', b'%'] {
            map[c as usize] = true;
        }
        map
    };

    /// NUL, tab, line feed, form feed, carriage return and space.
    static ref WHITESPACE_MAP: [bool; 256] = {
        let mut map = [false; 256];
        for c in [0u8, b'\t', b'\n', 0x0C, b'\r', b' '] {
            map[c as usize] = true;
        }
        map
    };

    /// Literal-string escape values; zero means the escape produces
    /// nothing and both bytes are dropped.
    pub(super) static ref ESCAPE_MAP: [u8; 256] = {
        let mut map = [0u8; 256];
        map[b'n' as usize] = b'\n';
        map[b'r' as usize] = b'\r';
        map[b't' as usize] = b'\t';
        map[b'b' as usize] = 0x08;
        map[b'f' as usize] = 0x0C;
        map[b'(' as usize] = b'(';
        map[b')' as usize] = b')';
        map[b'\\' as usize] = b'\\';
        map
    };
}

pub(super) fn is_whitespace(byte: u8) -> bool {
    WHITESPACE_MAP[byte as usize]
}

pub(super) fn is_delimiter(byte: u8) -> bool {
    DELIMITER_MAP[byte as usize]
}

/// Whether `byte` ends a token in progress.
pub(super) fn is_token_terminator(byte: u8) -> bool {
    is_whitespace(byte) || is_delimiter(byte)
}

/// Token classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of regular characters: keyword, number, name body
    Word,
    /// A delimiter character, or the two-character `<<` / `>>`
    Delimiter,
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

/// The tokenizer: a token machine over a [`StreamDevice`].
///
/// Holds no reference to the device; callers pass it to every read so one
/// tokenizer can serve several sources. The scratch buffer is reused
/// across calls to keep steady-state tokenizing allocation-light.
#[derive(Debug)]
pub struct Tokenizer {
    pub(super) queue: VecDeque<Token>,
    pub(super) scratch: Vec<u8>,
    pub(super) string_buf: Vec<u8>,
    pub(super) options: ParseOptions,
    pub(super) depth: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Tokenizer {
            queue: VecDeque::new(),
            scratch: Vec::with_capacity(TOKEN_BUFFER_SIZE),
            string_buf: Vec::new(),
            options,
            depth: 0,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Pushes a token onto the replay queue. Queued tokens come back
    /// from `next_token` in queue order, before any device bytes.
    pub fn enqueue_token(&mut self, text: impl Into<String>, kind: TokenKind) {
        self.queue.push_back(Token {
            text: text.into(),
            kind,
        });
    }

    /// Returns the next token, from the replay queue first and then the
    /// device. `None` means the device is exhausted.
    pub fn next_token(&mut self, device: &mut dyn StreamDevice) -> PdfResult<Option<Token>> {
        if let Some(token) = self.queue.pop_front() {
            return Ok(Some(token));
        }

        self.scratch.clear();
        let mut kind = TokenKind::Word;

        while self.scratch.len() + 1 < TOKEN_BUFFER_SIZE {
            let byte = match device.peek_byte()? {
                Some(byte) => byte,
                None => break,
            };

            if self.scratch.is_empty() && is_whitespace(byte) {
                device.read_byte()?;
                continue;
            }

            if byte == b'%' {
                // Comment runs to end of line. It also terminates any
                // token already in progress.
                device.read_byte()?;
                loop {
                    match device.read_byte()? {
                        None | Some(b'\n') | Some(b'\r') => break,
                        Some(_) => {}
                    }
                }
                if !self.scratch.is_empty() {
                    break;
                }
                continue;
            }

            if self.scratch.is_empty() && (byte == b'<' || byte == b'>') {
                // Possibly the two-character dictionary delimiter
                kind = TokenKind::Delimiter;
                device.read_byte()?;
                self.scratch.push(byte);
                if device.peek_byte()? == Some(byte) {
                    device.read_byte()?;
                    self.scratch.push(byte);
                }
                break;
            }

            if !self.scratch.is_empty() && is_token_terminator(byte) {
                // Terminator stays in the device for the next call
                break;
            }

            device.read_byte()?;
            self.scratch.push(byte);
            if is_delimiter(byte) {
                kind = TokenKind::Delimiter;
                break;
            }
        }

        if self.scratch.is_empty() {
            return Ok(None);
        }
        Ok(Some(Token {
            text: String::from_utf8_lossy(&self.scratch).into_owned(),
            kind,
        }))
    }

    /// Consumes the next token and reports whether it equals `expected`.
    /// The token is consumed either way.
    pub fn is_next_token(
        &mut self,
        device: &mut dyn StreamDevice,
        expected: &str,
    ) -> PdfResult<bool> {
        match self.next_token(device)? {
            Some(token) => Ok(token.text == expected),
            None => Err(PdfError::eof(format!("expected token '{expected}'"))),
        }
    }

    /// Reads the next token as an integer. A non-numeric token is pushed
    /// back onto the queue before the error returns.
    pub fn read_next_number(&mut self, device: &mut dyn StreamDevice) -> PdfResult<i64> {
        let token = self
            .next_token(device)?
            .ok_or_else(|| PdfError::eof("expected number"))?;
        match token.text.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                let message = format!("expected number, found '{}'", token.text);
                self.enqueue_token(token.text, token.kind);
                Err(PdfError::malformed(message))
            }
        }
    }

    pub(super) fn enter_nesting(&mut self) -> PdfResult<()> {
        if self.depth >= self.options.max_nesting_depth {
            return Err(PdfError::NestingTooDeep {
                limit: self.options.max_nesting_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(super) fn exit_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryDevice;

    fn tokens(input: &[u8]) -> Vec<Token> {
        let mut device = MemoryDevice::new(input);
        let mut tokenizer = Tokenizer::new();
        let mut out = Vec::new();
        while let Some(token) = tokenizer.next_token(&mut device).unwrap() {
            out.push(token);
        }
        out
    }

    fn texts(input: &[u8]) -> Vec<String> {
        tokens(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_words_split_on_whitespace() {
        assert_eq!(texts(b"1 0 obj"), ["1", "0", "obj"]);
        assert_eq!(texts(b"  true\r\nfalse\tnull "), ["true", "false", "null"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokens(b"").is_empty());
        assert!(tokens(b"   \r\n\t ").is_empty());
    }

    #[test]
    fn test_single_delimiters() {
        let toks = tokens(b"[/Name]");
        assert_eq!(
            toks.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            ["[", "/", "Name", "]"]
        );
        assert_eq!(toks[0].kind, TokenKind::Delimiter);
        assert_eq!(toks[2].kind, TokenKind::Word);
        assert_eq!(toks[3].kind, TokenKind::Delimiter);
    }

    #[test]
    fn test_double_angle_delimiters() {
        let toks = tokens(b"<</Type/Catalog>>");
        assert_eq!(
            toks.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            ["<<", "/", "Type", "/", "Catalog", ">>"]
        );
        assert!(toks.iter().all(|t| t.text != "<"));
    }

    #[test]
    fn test_lone_angle_is_its_own_token() {
        assert_eq!(texts(b"<48656C>"), ["<", "48656C", ">"]);
    }

    #[test]
    fn test_delimiter_ends_word() {
        assert_eq!(texts(b"123/Name"), ["123", "/", "Name"]);
        assert_eq!(texts(b"endobj<<"), ["endobj", "<<"]);
    }

    #[test]
    fn test_comment_skipped_at_token_start() {
        assert_eq!(texts(b"% a comment\nvalue"), ["value"]);
        assert_eq!(texts(b"%first\r\n%second\nvalue"), ["value"]);
    }

    #[test]
    fn test_comment_terminates_token() {
        assert_eq!(texts(b"abc%comment\ndef"), ["abc", "def"]);
    }

    #[test]
    fn test_queue_replays_in_order() {
        let mut device = MemoryDevice::new(b"tail".as_slice());
        let mut tokenizer = Tokenizer::new();
        tokenizer.enqueue_token("first", TokenKind::Word);
        tokenizer.enqueue_token("second", TokenKind::Word);
        assert_eq!(tokenizer.next_token(&mut device).unwrap().unwrap().text, "first");
        assert_eq!(tokenizer.next_token(&mut device).unwrap().unwrap().text, "second");
        assert_eq!(tokenizer.next_token(&mut device).unwrap().unwrap().text, "tail");
    }

    #[test]
    fn test_is_next_token() {
        let mut device = MemoryDevice::new(b"obj endobj".as_slice());
        let mut tokenizer = Tokenizer::new();
        assert!(tokenizer.is_next_token(&mut device, "obj").unwrap());
        assert!(!tokenizer.is_next_token(&mut device, "stream").unwrap());
        assert!(matches!(
            tokenizer.is_next_token(&mut device, "endobj"),
            Err(PdfError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_read_next_number() {
        let mut device = MemoryDevice::new(b"42 -17 oops".as_slice());
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.read_next_number(&mut device).unwrap(), 42);
        assert_eq!(tokenizer.read_next_number(&mut device).unwrap(), -17);
        assert!(matches!(
            tokenizer.read_next_number(&mut device),
            Err(PdfError::MalformedToken(_))
        ));
        // the offending token was pushed back
        assert_eq!(tokenizer.next_token(&mut device).unwrap().unwrap().text, "oops");
    }

    #[test]
    fn test_oversized_token_splits() {
        let input = vec![b'a'; TOKEN_BUFFER_SIZE + 1000];
        let toks = tokens(&input);
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].text.len(), TOKEN_BUFFER_SIZE - 1);
        assert_eq!(toks[1].text.len(), 1001);
    }

    #[test]
    fn test_binary_bytes_survive_lossily() {
        let toks = tokens(&[b'a', 0xFF, b'b']);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].text, "a\u{FFFD}b");
    }
}
