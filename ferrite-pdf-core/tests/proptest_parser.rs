//! Property-based tests for object syntax robustness
//!
//! Any byte input must produce a value or an error, never a panic, and
//! well-formed constructs must survive the tokenizer unchanged.

use ferrite_pdf::{MemoryDevice, Object, ObjectId, PdfResult, Tokenizer};
use proptest::prelude::*;

fn parse_one(input: &[u8]) -> PdfResult<Object> {
    let mut device = MemoryDevice::new(input.to_vec());
    let mut tokenizer = Tokenizer::new();
    tokenizer.read_next_variant(&mut device, None)
}

#[test]
fn test_empty_input_is_an_error() {
    assert!(parse_one(b"").is_err());
}

proptest! {
    #[test]
    fn test_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        // Deep nesting must come back as an error, not a stack overflow
        let _ = parse_one(&data);
    }

    #[test]
    fn test_integers_round_trip(n in any::<i64>()) {
        let value = parse_one(format!("{n}").as_bytes()).unwrap();
        prop_assert_eq!(value, Object::Integer(n));
    }

    #[test]
    fn test_two_numbers_stay_two_numbers(a in any::<i64>(), b in any::<i64>()) {
        // The reference lookahead must replay exactly what it consumed
        let text = format!("{a} {b}");
        let mut device = MemoryDevice::new(text.into_bytes());
        let mut tokenizer = Tokenizer::new();
        let first = tokenizer.read_next_variant(&mut device, None).unwrap();
        let second = tokenizer.read_next_variant(&mut device, None).unwrap();
        prop_assert_eq!(first, Object::Integer(a));
        prop_assert_eq!(second, Object::Integer(b));
    }

    #[test]
    fn test_references_round_trip(number in 1u32.., generation in any::<u16>()) {
        let value = parse_one(format!("{number} {generation} R").as_bytes()).unwrap();
        prop_assert_eq!(value, Object::Reference(ObjectId::new(number, generation)));
    }

    #[test]
    fn test_literal_strings_round_trip(s in "[a-zA-Z0-9 .,;:!?*+=_-]{0,64}") {
        let value = parse_one(format!("({s})").as_bytes()).unwrap();
        let string = value.as_string().expect("a string");
        prop_assert_eq!(string.as_bytes(), s.as_bytes());
    }

    #[test]
    fn test_hex_strings_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        let value = parse_one(format!("<{hex}>").as_bytes()).unwrap();
        let string = value.as_string().expect("a hex string");
        prop_assert!(string.is_hex());
        prop_assert_eq!(string.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_names_round_trip(s in "[a-zA-Z][a-zA-Z0-9.]{0,32}") {
        let value = parse_one(format!("/{s}").as_bytes()).unwrap();
        prop_assert!(matches!(value, Object::Name(name) if name == s.as_str()));
    }
}
