//! Numbered objects and the stream append protocol
//!
//! An [`IndirectObject`] pairs a variant value with the object identity
//! it was (or will be) written under, plus the optional stream payload
//! only dictionary objects may carry. Editing tracks a dirty bit so an
//! incremental writer can tell which objects need to be rewritten.

use super::stream::ObjectStream;
use super::{Dictionary, Name, Object, ObjectId};
use crate::error::{PdfError, PdfResult};
use crate::parser::{decode_chain, Filter};

#[derive(Debug, Clone)]
pub struct IndirectObject {
    id: Option<ObjectId>,
    value: Object,
    stream: Option<ObjectStream>,
    dirty: bool,
}

impl IndirectObject {
    /// Creates a new object that has never been written to a file.
    pub fn new(value: impl Into<Object>) -> Self {
        IndirectObject {
            id: None,
            value: value.into(),
            stream: None,
            dirty: true,
        }
    }

    /// Wraps a value just read from a file, clean and bound to `id`.
    /// Trailer-style direct objects pass `None` for the identity.
    pub(crate) fn from_parsed(
        id: Option<ObjectId>,
        value: Object,
        stream: Option<ObjectStream>,
    ) -> Self {
        IndirectObject {
            id,
            value,
            stream,
            dirty: false,
        }
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn value(&self) -> &Object {
        &self.value
    }

    /// Mutable access marks the object as needing a rewrite.
    pub fn value_mut(&mut self) -> &mut Object {
        self.dirty = true;
        &mut self.value
    }

    pub(crate) fn set_value(&mut self, value: Object) {
        self.value = value;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream(&self) -> Option<&ObjectStream> {
        self.stream.as_ref()
    }

    pub(crate) fn set_parsed_stream(&mut self, stream: ObjectStream) {
        self.stream = Some(stream);
    }

    pub(crate) fn drop_payload(&mut self) {
        self.value = Object::Null;
        self.stream = None;
    }

    /// Opens an append scope on the object's stream, creating the stream
    /// if there is none yet.
    ///
    /// When `clear_existing` is false, the current payload is decoded
    /// through the old `/Filter` chain first and re-appended through the
    /// new one. The `/Filter` key follows `filters`: one filter writes a
    /// name, several write an array, and an empty list removes the key
    /// only when `update_filter_key` is set.
    ///
    /// # Panics
    ///
    /// Panics if an append scope is already open.
    pub fn begin_append_stream(
        &mut self,
        filters: Vec<Filter>,
        clear_existing: bool,
        update_filter_key: bool,
    ) -> PdfResult<()> {
        let Some(dict) = self.value.as_dict_mut() else {
            return Err(PdfError::invalid_type(
                "only dictionary objects can carry a stream",
            ));
        };
        self.dirty = true;

        let stream = self.stream.get_or_insert_with(ObjectStream::new);
        let preserved = if !clear_existing && !stream.is_empty() {
            Some(decoded_stream(dict, stream)?)
        } else {
            None
        };

        if update_filter_key || !filters.is_empty() {
            match filters.as_slice() {
                [] => {
                    dict.remove("Filter");
                }
                [single] => {
                    dict.set("Filter", Object::Name(Name::new(single.name())));
                }
                multiple => {
                    let names = multiple
                        .iter()
                        .map(|filter| Object::Name(Name::new(filter.name())))
                        .collect::<Vec<_>>();
                    dict.set("Filter", Object::Array(names));
                }
            }
        }

        stream.begin_append(filters);
        if let Some(data) = preserved {
            stream.append(&data);
        }
        Ok(())
    }

    /// Appends plain bytes inside an open append scope.
    ///
    /// # Panics
    ///
    /// Panics if called outside a `begin_append_stream` scope.
    pub fn append_stream(&mut self, bytes: &[u8]) {
        match self.stream.as_mut() {
            Some(stream) => stream.append(bytes),
            None => panic!("append_stream without begin_append_stream"),
        }
    }

    /// Closes the append scope, encodes the collected bytes through the
    /// chain given to `begin_append_stream` and refreshes `/Length`.
    ///
    /// # Panics
    ///
    /// Panics if no append scope is open.
    pub fn end_append_stream(&mut self) -> PdfResult<()> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => panic!("end_append_stream without begin_append_stream"),
        };
        let length = stream.end_append()?;
        if let Some(dict) = self.value.as_dict_mut() {
            dict.set("Length", Object::Integer(length as i64));
        }
        Ok(())
    }

    /// Returns the stream payload decoded through its `/Filter` chain.
    /// Objects without a stream yield an empty buffer.
    pub fn filtered_stream_copy(&self) -> PdfResult<Vec<u8>> {
        match (&self.stream, self.value.as_dict()) {
            (None, _) => Ok(Vec::new()),
            (Some(stream), Some(dict)) => decoded_stream(dict, stream),
            (Some(stream), None) => Ok(stream.raw_data().to_vec()),
        }
    }
}

fn decoded_stream(dict: &Dictionary, stream: &ObjectStream) -> PdfResult<Vec<u8>> {
    let chain = Filter::chain_from_object(dict.get("Filter"))?;
    decode_chain(stream.raw_data(), &chain)
}
