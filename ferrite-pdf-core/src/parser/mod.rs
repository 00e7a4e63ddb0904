//! Tokenizing and deferred parsing of document objects
//!
//! The [`Tokenizer`] splits a device into PDF tokens and assembles them
//! into complete variants, with the two-token lookahead that tells a
//! number from an `N G R` reference. [`ParserObject`] builds on it to
//! load numbered records lazily, streams included. The `/Filter` codecs
//! used by stream payloads live here as well.
//!
//! # Example
//!
//! ```
//! use ferrite_pdf::{MemoryDevice, Object, Tokenizer};
//!
//! let mut device = MemoryDevice::new(b"<< /Kind /Demo /Size 2 >>".as_slice());
//! let mut tokenizer = Tokenizer::new();
//! let value = tokenizer.read_next_variant(&mut device, None).unwrap();
//! assert!(matches!(value, Object::Dictionary(_)));
//! ```

mod filters;
mod lexer;
mod object;
mod variant;

pub use filters::{decode_chain, encode_chain, Filter};
pub use lexer::{Token, TokenKind, Tokenizer};
pub use object::{share_device, ParserObject, SharedDevice};
pub use variant::DataType;
