//! # ferrite-pdf
//!
//! A low-level, pure Rust engine for the PDF object model: tokenizing, deferred
//! object loading, stream filters, and in-place signature patching.
//!
//! ## Features
//!
//! - **Object Syntax**: Tokenizer and variant reader for the full PDF object
//!   grammar (numbers, strings, names, arrays, dictionaries, references)
//! - **Deferred Loading**: Objects remember their file offset and parse on
//!   first access; loaded objects can be evicted again to cap memory
//! - **Stream Filters**: FlateDecode, ASCIIHexDecode and ASCII85Decode with
//!   chained encode/decode following the `/Filter` key
//! - **Devices**: One read/seek/write abstraction over files, memory buffers
//!   and concatenated page content
//! - **Encryption Hooks**: Pluggable decryption applied during parsing, with
//!   RC4 and per-object key derivation built in
//! - **Signature Patching**: Byte-range and placeholder rewriting for
//!   incremental signing without rewriting the document
//! - **Pure Rust**: No C dependencies or external PDF libraries
//!
//! ## Quick Start
//!
//! ### Parsing an object record
//!
//! ```rust
//! use ferrite_pdf::{share_device, MemoryDevice, ParserObject};
//!
//! # fn main() -> ferrite_pdf::PdfResult<()> {
//! let data = b"1 0 obj\n<< /Length 5 >>\nstream\nHELLO\nendstream\nendobj".as_slice();
//! let device = share_device(MemoryDevice::new(data));
//!
//! // Nothing is read until the value is first touched.
//! let mut object = ParserObject::new(device, 0);
//! let dict = object.value()?.as_dict().expect("a dictionary");
//! assert_eq!(dict.get_integer("Length"), Some(5));
//!
//! // The stream payload is deferred one step further.
//! let stream = object.stream()?.expect("a stream payload");
//! assert_eq!(stream.raw_data(), b"HELLO".as_slice());
//! # Ok(())
//! # }
//! ```
//!
//! ### Reading bare values
//!
//! ```rust
//! use ferrite_pdf::{MemoryDevice, Object, Tokenizer};
//!
//! # fn main() -> ferrite_pdf::PdfResult<()> {
//! let mut device = MemoryDevice::new(b"[ /Kids 3 0 R (text) ]".as_slice());
//! let mut tokenizer = Tokenizer::new();
//!
//! let value = tokenizer.read_next_variant(&mut device, None)?;
//! let items = value.as_array().expect("an array");
//! assert_eq!(items.len(), 3);
//! assert!(matches!(items[1], Object::Reference(_)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`objects`] - The object model: [`Object`], [`Dictionary`], [`Name`],
//!   [`PdfString`], [`IndirectObject`] and [`ObjectStream`]
//! - [`parser`] - Tokenizer, variant reader, deferred [`ParserObject`] and the
//!   stream [`Filter`] codecs
//! - [`device`] - [`StreamDevice`] plus the file, memory and canvas devices
//! - [`encryption`] - The [`Decryptor`] seam and the RC4 standard handler
//! - [`signer`] - Byte-range patching for digital signatures
//! - [`error`] - [`PdfError`] and the crate-wide [`PdfResult`]

pub mod device;
pub mod encryption;
pub mod error;
pub mod objects;
pub mod options;
pub mod parser;
pub mod signer;

// Re-export the object model
pub use objects::{Dictionary, IndirectObject, Name, Object, ObjectId, ObjectStream, PdfString};

// Re-export parsing types
pub use error::{PdfError, PdfResult, ResultExt};
pub use options::ParseOptions;
pub use parser::{
    decode_chain, encode_chain, share_device, DataType, Filter, ParserObject, SharedDevice, Token,
    TokenKind, Tokenizer,
};

// Re-export the device layer
pub use device::{
    BufferDevice, CanvasInputDevice, DeviceAccess, FileDevice, MemoryDevice, StreamDevice,
};

// Re-export encryption and signing seams
pub use encryption::{
    DecodingFilter, Decryptor, EncryptionContext, IdentityDecryptor, StandardDecryptor,
};
pub use signer::{sign_document, SignatureBeacons, Signer};

/// Current version of ferrite-pdf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_through_the_root() {
        let mut device = MemoryDevice::new(b"<< /Pages 2 0 R >>".as_slice());
        let mut tokenizer = Tokenizer::new();
        let value = tokenizer.read_next_variant(&mut device, None).unwrap();
        let pages = value.as_dict().and_then(|d| d.get("Pages").cloned());
        assert_eq!(pages, Some(Object::Reference(ObjectId::new(2, 0))));
    }

    #[test]
    fn test_object_from_parts() {
        let mut object = ParserObject::from_parts(ObjectId::new(4, 0), Object::Integer(7), None);
        assert_eq!(object.id(), Some(ObjectId::new(4, 0)));
        assert_eq!(object.value().unwrap().as_integer(), Some(7));
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
