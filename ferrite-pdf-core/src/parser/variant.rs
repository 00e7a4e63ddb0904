//! Variant reading on top of the token machine
//!
//! A variant's type is decided from its first token; integers need a
//! bounded two-token lookahead to tell a plain number from an `N G R`
//! indirect reference. Whenever the lookahead does not pan out, the extra
//! tokens go back on the replay queue in read order, so the stream is
//! positioned exactly as if no lookahead had happened.

use super::lexer::{is_whitespace, Token, TokenKind, Tokenizer, ESCAPE_MAP};
use crate::device::StreamDevice;
use crate::encryption::EncryptionContext;
use crate::error::{PdfError, PdfResult};
use crate::objects::{Dictionary, Name, Object, ObjectId, PdfString};

/// The variant type announced by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Null,
    Bool,
    Number,
    Real,
    Reference,
    String,
    HexString,
    Name,
    Array,
    Dictionary,
    Unknown,
}

/// Classifies a word as integer or real if every character could belong
/// to a number. The actual parse decides whether it really is one.
fn classify_number(text: &str) -> Option<DataType> {
    if text.is_empty() {
        return None;
    }
    let mut has_dot = false;
    for byte in text.bytes() {
        match byte {
            b'0'..=b'9' | b'-' | b'+' => {}
            b'.' => has_dot = true,
            _ => return None,
        }
    }
    Some(if has_dot {
        DataType::Real
    } else {
        DataType::Number
    })
}

impl Tokenizer {
    /// Reads one complete variant of any type.
    pub fn read_next_variant(
        &mut self,
        device: &mut dyn StreamDevice,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<Object> {
        let token = self
            .next_token(device)?
            .ok_or_else(|| PdfError::eof("expected variant"))?;
        self.read_variant_from_token(device, &token, encrypt)
    }

    /// Reads the variant whose first token has already been consumed.
    pub fn read_variant_from_token(
        &mut self,
        device: &mut dyn StreamDevice,
        token: &Token,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<Object> {
        let mut value = Object::Null;
        match self.determine_data_type(device, token, &mut value)? {
            DataType::Null
            | DataType::Bool
            | DataType::Number
            | DataType::Real
            | DataType::Reference => Ok(value),
            DataType::Dictionary => self.read_dictionary(device, encrypt).map(Object::Dictionary),
            DataType::Array => self.read_array(device, encrypt).map(Object::Array),
            DataType::String => self.read_string(device, encrypt).map(Object::String),
            DataType::HexString => self.read_hex_string(device, encrypt).map(Object::String),
            DataType::Name => self.read_name(device).map(Object::Name),
            DataType::Unknown => Err(PdfError::invalid_type(format!(
                "unexpected token '{}'",
                token.text
            ))),
        }
    }

    /// Decides the variant type announced by `token`, filling `value` for
    /// the scalar types that are complete after classification.
    pub fn determine_data_type(
        &mut self,
        device: &mut dyn StreamDevice,
        token: &Token,
        value: &mut Object,
    ) -> PdfResult<DataType> {
        match token.kind {
            TokenKind::Word => match token.text.as_str() {
                "null" => {
                    *value = Object::Null;
                    Ok(DataType::Null)
                }
                "true" => {
                    *value = Object::Boolean(true);
                    Ok(DataType::Bool)
                }
                "false" => {
                    *value = Object::Boolean(false);
                    Ok(DataType::Bool)
                }
                text => match classify_number(text) {
                    Some(DataType::Real) => {
                        let real = text.parse::<f64>().map_err(|_| {
                            PdfError::malformed(format!("expected real number, found '{text}'"))
                        })?;
                        *value = Object::Real(real);
                        Ok(DataType::Real)
                    }
                    Some(_) => self.disambiguate_number(device, text, value),
                    None => Ok(DataType::Unknown),
                },
            },
            TokenKind::Delimiter => match token.text.as_str() {
                "<<" => Ok(DataType::Dictionary),
                "[" => Ok(DataType::Array),
                "(" => Ok(DataType::String),
                "<" => Ok(DataType::HexString),
                "/" => Ok(DataType::Name),
                _ => Ok(DataType::Unknown),
            },
        }
    }

    /// Integer versus indirect reference. Looks ahead up to two tokens;
    /// every early exit replays the lookahead in read order first.
    fn disambiguate_number(
        &mut self,
        device: &mut dyn StreamDevice,
        text: &str,
        value: &mut Object,
    ) -> PdfResult<DataType> {
        let number = text
            .parse::<i64>()
            .map_err(|_| PdfError::malformed(format!("expected number, found '{text}'")))?;
        *value = Object::Integer(number);

        let second = match self.next_token(device)? {
            Some(token) => token,
            None => return Ok(DataType::Number),
        };
        if second.kind != TokenKind::Word {
            self.enqueue_token(second.text, second.kind);
            return Ok(DataType::Number);
        }
        let generation = match second.text.parse::<i64>() {
            Ok(generation) => generation,
            Err(_) => {
                self.enqueue_token(second.text, second.kind);
                return Ok(DataType::Number);
            }
        };

        let third = match self.next_token(device)? {
            Some(token) => token,
            None => {
                self.enqueue_token(second.text, second.kind);
                return Ok(DataType::Number);
            }
        };
        if third.kind == TokenKind::Word && third.text == "R" {
            if let (Ok(number), Ok(generation)) =
                (u32::try_from(number), u16::try_from(generation))
            {
                *value = Object::Reference(ObjectId::new(number, generation));
                return Ok(DataType::Reference);
            }
        }
        self.enqueue_token(second.text, second.kind);
        self.enqueue_token(third.text, third.kind);
        Ok(DataType::Number)
    }

    /// Reads a dictionary body; the opening `<<` has been consumed.
    pub fn read_dictionary(
        &mut self,
        device: &mut dyn StreamDevice,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<Dictionary> {
        self.enter_nesting()?;
        let result = self.read_dictionary_inner(device, encrypt);
        self.exit_nesting();
        result
    }

    fn read_dictionary_inner(
        &mut self,
        device: &mut dyn StreamDevice,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<Dictionary> {
        let mut dict = Dictionary::new();
        // Hex /Contents cannot be decrypted until the whole dictionary is
        // read: signature dictionaries keep theirs as written, and /Type
        // may come after /Contents.
        let mut contents_digits: Option<Vec<u8>> = None;

        loop {
            let token = self
                .next_token(device)?
                .ok_or_else(|| PdfError::eof("expected dictionary key or '>>'"))?;
            if token.kind == TokenKind::Delimiter && token.text == ">>" {
                break;
            }
            let key = match self.read_variant_from_token(device, &token, encrypt)? {
                Object::Name(name) => name,
                other => {
                    return Err(PdfError::invalid_type(format!(
                        "dictionary key is not a name: {other:?}"
                    )))
                }
            };

            let value_token = self
                .next_token(device)?
                .ok_or_else(|| PdfError::eof(format!("expected value for key {key}")))?;
            let mut value = Object::Null;
            let data_type = self.determine_data_type(device, &value_token, &mut value)?;

            if encrypt.is_some() && data_type == DataType::HexString && key == "Contents" {
                contents_digits = Some(self.read_hex_digits(device)?);
                continue;
            }

            let value = match data_type {
                DataType::Null
                | DataType::Bool
                | DataType::Number
                | DataType::Real
                | DataType::Reference => value,
                DataType::Dictionary => {
                    self.read_dictionary(device, encrypt).map(Object::Dictionary)?
                }
                DataType::Array => self.read_array(device, encrypt).map(Object::Array)?,
                DataType::String => self.read_string(device, encrypt).map(Object::String)?,
                DataType::HexString => self.read_hex_string(device, encrypt).map(Object::String)?,
                DataType::Name => self.read_name(device).map(Object::Name)?,
                DataType::Unknown => {
                    return Err(PdfError::invalid_type(format!(
                        "unexpected token '{}' as value for key {}",
                        value_token.text, key
                    )))
                }
            };
            dict.set(key.as_str(), value);
        }

        if let Some(digits) = contents_digits {
            let string = PdfString::from_hex_digits(&digits);
            let is_signature = matches!(
                dict.get_name("Type"),
                Some(t) if *t == "Sig" || *t == "DocTimeStamp"
            );
            let value = match encrypt {
                Some(ctx) if !is_signature => {
                    PdfString::hex_backed(ctx.decrypt(string.as_bytes())?)
                }
                _ => string,
            };
            dict.set("Contents", value);
        }
        Ok(dict)
    }

    /// Reads an array body; the opening `[` has been consumed.
    pub fn read_array(
        &mut self,
        device: &mut dyn StreamDevice,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<Vec<Object>> {
        self.enter_nesting()?;
        let result = self.read_array_inner(device, encrypt);
        self.exit_nesting();
        result
    }

    fn read_array_inner(
        &mut self,
        device: &mut dyn StreamDevice,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<Vec<Object>> {
        let mut items = Vec::new();
        loop {
            let token = self
                .next_token(device)?
                .ok_or_else(|| PdfError::eof("expected array item or ']'"))?;
            if token.kind == TokenKind::Delimiter && token.text == "]" {
                return Ok(items);
            }
            items.push(self.read_variant_from_token(device, &token, encrypt)?);
        }
    }

    /// Reads a literal string body; the opening `(` has been consumed.
    ///
    /// Unbalanced closing parens end the string; balanced pairs nest.
    /// Escapes follow the table in `ESCAPE_MAP` (unknown escapes are
    /// dropped entirely), octal escapes run up to three digits and stop
    /// early at the first non-octal character.
    pub fn read_string(
        &mut self,
        device: &mut dyn StreamDevice,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<PdfString> {
        self.string_buf.clear();
        let mut escape = false;
        let mut octal = false;
        let mut octal_count = 0u8;
        let mut octal_value = 0u8;
        let mut balance = 0i32;

        while let Some(byte) = device.peek_byte()? {
            if !escape {
                device.read_byte()?;
                if balance == 0 && byte == b')' {
                    break;
                }
                if byte == b'(' {
                    balance += 1;
                } else if byte == b')' {
                    balance -= 1;
                }
                if byte == b'\\' {
                    escape = true;
                } else {
                    self.string_buf.push(byte);
                }
            } else if octal || matches!(byte, b'0'..=b'7') {
                octal = true;
                octal_count += 1;
                if !matches!(byte, b'0'..=b'7') {
                    // Octal run ended early: emit what accumulated and
                    // reprocess this byte as a regular character.
                    self.string_buf.push(octal_value);
                    escape = false;
                    octal = false;
                    octal_count = 0;
                    octal_value = 0;
                    continue;
                }
                device.read_byte()?;
                octal_value = octal_value.wrapping_shl(3) | (byte - b'0');
                if octal_count > 2 {
                    self.string_buf.push(octal_value);
                    escape = false;
                    octal = false;
                    octal_count = 0;
                    octal_value = 0;
                }
            } else {
                device.read_byte()?;
                let code = ESCAPE_MAP[byte as usize];
                if code != 0 {
                    self.string_buf.push(code);
                }
                escape = false;
            }
        }
        if octal {
            self.string_buf.push(octal_value);
        }

        match encrypt {
            Some(ctx) => Ok(PdfString::new(ctx.decrypt(&self.string_buf)?)),
            None => Ok(PdfString::new(self.string_buf.clone())),
        }
    }

    /// Reads a hex string body; the opening `<` has been consumed.
    /// Non-hex bytes are skipped, an odd digit count pads with `0`, and
    /// end of input is as good as the closing `>`.
    pub fn read_hex_string(
        &mut self,
        device: &mut dyn StreamDevice,
        encrypt: Option<EncryptionContext<'_>>,
    ) -> PdfResult<PdfString> {
        let digits = self.read_hex_digits(device)?;
        let string = PdfString::from_hex_digits(&digits);
        match encrypt {
            Some(ctx) => Ok(PdfString::hex_backed(ctx.decrypt(string.as_bytes())?)),
            None => Ok(string),
        }
    }

    /// Collects the raw digit characters of a hex string.
    fn read_hex_digits(&mut self, device: &mut dyn StreamDevice) -> PdfResult<Vec<u8>> {
        let mut digits = Vec::new();
        while let Some(byte) = device.read_byte()? {
            if byte == b'>' {
                break;
            }
            if byte.is_ascii_hexdigit() {
                digits.push(byte);
            }
        }
        if digits.len() % 2 != 0 {
            digits.push(b'0');
        }
        Ok(digits)
    }

    /// Reads a name body; the `/` has been consumed. A `/` followed by
    /// whitespace, a delimiter or end of input is the empty name.
    pub fn read_name(&mut self, device: &mut dyn StreamDevice) -> PdfResult<Name> {
        if let Some(byte) = device.peek_byte()? {
            if is_whitespace(byte) {
                return Ok(Name::new(""));
            }
        }
        match self.next_token(device)? {
            Some(token) if token.kind == TokenKind::Word => Ok(Name::from_escaped(&token.text)),
            Some(token) => {
                self.enqueue_token(token.text, token.kind);
                Ok(Name::new(""))
            }
            None => Ok(Name::new("")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryDevice;
    use crate::encryption::{DecodingFilter, Decryptor};

    fn parse(input: &[u8]) -> PdfResult<Object> {
        let mut device = MemoryDevice::new(input);
        let mut tokenizer = Tokenizer::new();
        tokenizer.read_next_variant(&mut device, None)
    }

    fn parse_ok(input: &[u8]) -> Object {
        parse(input).unwrap()
    }

    fn string_bytes(value: &Object) -> &[u8] {
        value.as_string().expect("string object").as_bytes()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse_ok(b"null"), Object::Null);
        assert_eq!(parse_ok(b"true"), Object::Boolean(true));
        assert_eq!(parse_ok(b"false"), Object::Boolean(false));
        assert_eq!(parse_ok(b"42"), Object::Integer(42));
        assert_eq!(parse_ok(b"-17"), Object::Integer(-17));
        assert_eq!(parse_ok(b"+8"), Object::Integer(8));
        assert_eq!(parse_ok(b"3.14"), Object::Real(3.14));
        assert_eq!(parse_ok(b"-.5"), Object::Real(-0.5));
        assert_eq!(parse_ok(b"4."), Object::Real(4.0));
    }

    #[test]
    fn test_garbage_number_is_malformed() {
        assert!(matches!(parse(b"+"), Err(PdfError::MalformedToken(_))));
        assert!(matches!(parse(b"1-2"), Err(PdfError::MalformedToken(_))));
        assert!(matches!(parse(b"1.2.3"), Err(PdfError::MalformedToken(_))));
    }

    #[test]
    fn test_unknown_token_is_invalid_type() {
        assert!(matches!(parse(b"frobnicate"), Err(PdfError::InvalidDataType(_))));
        assert!(matches!(parse(b")"), Err(PdfError::InvalidDataType(_))));
    }

    #[test]
    fn test_reference() {
        assert_eq!(
            parse_ok(b"12 0 R"),
            Object::Reference(ObjectId::new(12, 0))
        );
        assert_eq!(
            parse_ok(b"3 65535 R"),
            Object::Reference(ObjectId::new(3, 65535))
        );
    }

    #[test]
    fn test_number_lookahead_replays_tokens() {
        // "12 5 /N" is the integer 12; the 5 and the name follow
        let mut device = MemoryDevice::new(b"12 5 /N".as_slice());
        let mut tokenizer = Tokenizer::new();
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Integer(12)
        );
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Integer(5)
        );
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Name(Name::new("N"))
        );
    }

    #[test]
    fn test_number_lookahead_single_token() {
        // non-numeric second token: only that one token is replayed
        let mut device = MemoryDevice::new(b"7 obj".as_slice());
        let mut tokenizer = Tokenizer::new();
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Integer(7)
        );
        assert_eq!(tokenizer.next_token(&mut device).unwrap().unwrap().text, "obj");
    }

    #[test]
    fn test_number_lookahead_at_eof() {
        let mut device = MemoryDevice::new(b"12 5".as_slice());
        let mut tokenizer = Tokenizer::new();
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Integer(12)
        );
        // the second integer must still be readable
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Integer(5)
        );
        assert!(tokenizer.next_token(&mut device).unwrap().is_none());
    }

    #[test]
    fn test_number_lookahead_non_r_third() {
        let mut device = MemoryDevice::new(b"1 2 3".as_slice());
        let mut tokenizer = Tokenizer::new();
        for expected in [1, 2, 3] {
            assert_eq!(
                tokenizer.read_next_variant(&mut device, None).unwrap(),
                Object::Integer(expected)
            );
        }
    }

    #[test]
    fn test_out_of_range_reference_stays_numbers() {
        // generation beyond u16 cannot form a reference
        let mut device = MemoryDevice::new(b"1 99999 R".as_slice());
        let mut tokenizer = Tokenizer::new();
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Integer(1)
        );
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Integer(99999)
        );
        assert_eq!(tokenizer.next_token(&mut device).unwrap().unwrap().text, "R");
    }

    #[test]
    fn test_literal_string() {
        assert_eq!(
            parse_ok(b"(Hello World)"),
            Object::String(PdfString::new(b"Hello World".as_slice()))
        );
        assert_eq!(
            parse_ok(b"(a(b)c)"),
            Object::String(PdfString::new(b"a(b)c".as_slice()))
        );
        assert_eq!(
            parse_ok(b"()"),
            Object::String(PdfString::new(Vec::new()))
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse_ok(b"(line\\nbreak)"),
            Object::String(PdfString::new(b"line\nbreak".as_slice()))
        );
        assert_eq!(
            parse_ok(b"(a\\)b)"),
            Object::String(PdfString::new(b"a)b".as_slice()))
        );
        assert_eq!(
            parse_ok(b"(back\\\\slash)"),
            Object::String(PdfString::new(b"back\\slash".as_slice()))
        );
        // unknown escapes are dropped entirely
        assert_eq!(
            parse_ok(b"(a\\qb)"),
            Object::String(PdfString::new(b"ab".as_slice()))
        );
        // backslash before a newline is a line continuation
        assert_eq!(
            parse_ok(b"(a\\\nb)"),
            Object::String(PdfString::new(b"ab".as_slice()))
        );
    }

    #[test]
    fn test_string_octal_escapes() {
        assert_eq!(
            parse_ok(b"(\\101\\102)"),
            Object::String(PdfString::new(b"AB".as_slice()))
        );
        // short octal run ends at the first non-octal character
        assert_eq!(
            parse_ok(b"(\\5x)"),
            Object::String(PdfString::new([5u8, b'x'].as_slice()))
        );
        // three digits max; the fourth is a regular character
        assert_eq!(
            parse_ok(b"(\\0053)"),
            Object::String(PdfString::new([5u8, b'3'].as_slice()))
        );
        // high octal values wrap like the byte they denote
        assert_eq!(
            parse_ok(b"(\\377)"),
            Object::String(PdfString::new([0xFFu8].as_slice()))
        );
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(
            parse_ok(b"<48656C6C6F>"),
            Object::String(PdfString::from_hex_digits(b"48656C6C6F"))
        );
        // whitespace and garbage bytes inside are skipped
        assert_eq!(
            string_bytes(&parse_ok(b"<48 65 6C 6C 6F>")),
            b"Hello".as_slice()
        );
        assert_eq!(
            string_bytes(&parse_ok(b"<4 8z65!6C6C6F>")),
            b"Hello".as_slice()
        );
        // odd digit count pads with zero
        assert_eq!(
            string_bytes(&parse_ok(b"<901FA>")),
            [0x90u8, 0x1F, 0xA0].as_slice()
        );
        assert_eq!(string_bytes(&parse_ok(b"<>")), b"".as_slice());
    }

    #[test]
    fn test_name() {
        assert_eq!(parse_ok(b"/Type"), Object::Name(Name::new("Type")));
        assert_eq!(
            parse_ok(b"/With#20Space"),
            Object::Name(Name::new("With Space"))
        );
        assert_eq!(parse_ok(b"/ x"), Object::Name(Name::new("")));
    }

    #[test]
    fn test_array() {
        let value = parse_ok(b"[1 2.5 /X (s) [true] 3 0 R]");
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0], Object::Integer(1));
        assert_eq!(items[1], Object::Real(2.5));
        assert_eq!(items[2], Object::Name(Name::new("X")));
        assert_eq!(items[3], Object::String(PdfString::new(b"s".as_slice())));
        assert_eq!(items[4], Object::Array(vec![Object::Boolean(true)]));
        assert_eq!(items[5], Object::Reference(ObjectId::new(3, 0)));
    }

    #[test]
    fn test_array_unterminated() {
        assert!(matches!(parse(b"[1 2"), Err(PdfError::UnexpectedEof(_))));
    }

    #[test]
    fn test_dictionary() {
        let value = parse_ok(b"<< /Type /Page /Count 3 /Parent 2 0 R >>");
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.get_name("Type"), Some(&Name::new("Page")));
        assert_eq!(dict.get_integer("Count"), Some(3));
        assert_eq!(
            dict.get("Parent").and_then(Object::as_reference),
            Some(ObjectId::new(2, 0))
        );
    }

    #[test]
    fn test_dictionary_nested() {
        let value = parse_ok(b"<< /Kids [4 0 R] /Info << /V (x) >> >>");
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.get_array("Kids").unwrap().len(), 1);
        assert_eq!(
            dict.get_dict("Info")
                .and_then(|d| d.get("V"))
                .and_then(Object::as_string)
                .map(PdfString::as_bytes),
            Some(b"x".as_slice())
        );
    }

    #[test]
    fn test_dictionary_key_must_be_name() {
        assert!(matches!(
            parse(b"<< 5 /V >>"),
            Err(PdfError::InvalidDataType(_))
        ));
    }

    #[test]
    fn test_dictionary_unterminated() {
        assert!(matches!(
            parse(b"<< /K (v)"),
            Err(PdfError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let mut input = b"[".repeat(300);
        input.extend_from_slice(b"1");
        match parse(&input) {
            Err(PdfError::NestingTooDeep { limit }) => assert_eq!(limit, 256),
            other => panic!("expected nesting error, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_depth_unwinds_after_error() {
        let mut device = MemoryDevice::new(b"[[[[[[[[[[1".as_slice());
        let mut tokenizer = Tokenizer::with_options(
            crate::ParseOptions::default().with_max_nesting_depth(4),
        );
        assert!(tokenizer.read_next_variant(&mut device, None).is_err());
        // the guard unwound; a shallow parse still works
        let mut device = MemoryDevice::new(b"[1 2]".as_slice());
        assert_eq!(
            tokenizer.read_next_variant(&mut device, None).unwrap(),
            Object::Array(vec![Object::Integer(1), Object::Integer(2)])
        );
    }

    // Reversible toy decryptor for exercising the string paths without
    // pulling in the real cipher.
    struct XorDecryptor(u8);

    struct XorFilter(u8);

    impl DecodingFilter for XorFilter {
        fn feed(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> PdfResult<()> {
            out.extend(chunk.iter().map(|b| b ^ self.0));
            Ok(())
        }

        fn finish(&mut self, _out: &mut Vec<u8>) -> PdfResult<()> {
            Ok(())
        }
    }

    impl Decryptor for XorDecryptor {
        fn decrypt(&self, data: &[u8], _id: ObjectId) -> PdfResult<Vec<u8>> {
            Ok(data.iter().map(|b| b ^ self.0).collect())
        }

        fn decoding_filter(&self, _id: ObjectId) -> Box<dyn DecodingFilter> {
            Box::new(XorFilter(self.0))
        }
    }

    fn parse_encrypted(input: &[u8]) -> Object {
        let decryptor = XorDecryptor(0x20);
        let ctx = EncryptionContext::new(&decryptor, ObjectId::new(1, 0));
        let mut device = MemoryDevice::new(input);
        let mut tokenizer = Tokenizer::new();
        tokenizer.read_next_variant(&mut device, Some(ctx)).unwrap()
    }

    #[test]
    fn test_strings_decrypt() {
        // "HELLO" xor 0x20 is "hello"
        let value = parse_encrypted(b"(HELLO)");
        assert_eq!(string_bytes(&value), b"hello".as_slice());
        let value = parse_encrypted(b"<48454C4C4F>");
        assert_eq!(string_bytes(&value), b"hello".as_slice());
    }

    #[test]
    fn test_signature_contents_stay_encrypted() {
        let value = parse_encrypted(b"<< /Contents <4143> /Type /Sig >>");
        let dict = value.as_dict().unwrap();
        assert_eq!(
            string_bytes(dict.get("Contents").unwrap()),
            [0x41u8, 0x43].as_slice()
        );

        let value = parse_encrypted(b"<< /Type /DocTimeStamp /Contents <4143> >>");
        let dict = value.as_dict().unwrap();
        assert_eq!(
            string_bytes(dict.get("Contents").unwrap()),
            [0x41u8, 0x43].as_slice()
        );
    }

    #[test]
    fn test_ordinary_contents_decrypt() {
        let value = parse_encrypted(b"<< /Type /Annot /Contents <6865> >>");
        let dict = value.as_dict().unwrap();
        // 0x68 0x65 xor 0x20 = "HE"
        assert_eq!(
            string_bytes(dict.get("Contents").unwrap()),
            b"HE".as_slice()
        );
    }
}
