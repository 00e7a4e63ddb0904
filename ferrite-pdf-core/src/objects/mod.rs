//! The PDF object model
//!
//! Everything a document is made of: the variant [`Object`] with its
//! scalar and container types, [`Name`] and [`PdfString`] with their
//! escape rules, and [`IndirectObject`], which binds a value to an
//! object number and optionally to a raw stream payload.
//!
//! # Example
//!
//! ```
//! use ferrite_pdf::{Dictionary, IndirectObject, Object};
//!
//! let mut dict = Dictionary::new();
//! dict.set("Type", Object::Name("Page".into()));
//! dict.set("Count", 3);
//! let object = IndirectObject::new(dict);
//! assert!(object.is_dirty());
//! assert!(!object.has_stream());
//! ```

mod dictionary;
mod indirect;
mod name;
mod primitive;
mod stream;
mod string;

pub use dictionary::Dictionary;
pub use indirect::IndirectObject;
pub use name::Name;
pub use primitive::{Object, ObjectId};
pub use stream::ObjectStream;
pub use string::PdfString;
