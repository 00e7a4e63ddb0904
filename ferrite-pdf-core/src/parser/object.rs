//! Deferred loading of numbered objects
//!
//! A [`ParserObject`] remembers where an `N G obj` record starts on a
//! shared device and puts off tokenizing it until the value is first
//! touched. Stream payloads are deferred one step further: the value
//! parse only records where the data begins, and the bytes are pulled
//! off the device when the stream itself is asked for. A loaded object
//! can be dropped again with [`ParserObject::free_object_memory`] to cap
//! memory on large documents.

use std::cell::RefCell;
use std::io::SeekFrom;
use std::rc::Rc;

use super::lexer::{TokenKind, Tokenizer};
use crate::device::StreamDevice;
use crate::encryption::{Decryptor, EncryptionContext};
use crate::error::{PdfError, PdfResult, ResultExt};
use crate::objects::{Dictionary, IndirectObject, Object, ObjectId, ObjectStream};
use crate::options::ParseOptions;

/// A device handed out to several parser objects of one document.
pub type SharedDevice = Rc<RefCell<dyn StreamDevice>>;

/// Wraps a concrete device for shared use.
pub fn share_device(device: impl StreamDevice + 'static) -> SharedDevice {
    Rc::new(RefCell::new(device))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

pub struct ParserObject {
    device: Option<SharedDevice>,
    decryptor: Option<Rc<dyn Decryptor>>,
    /// Start of the record; moved past the `N G obj` header once that
    /// header has been read.
    offset: u64,
    tokenizer: Tokenizer,
    inner: IndirectObject,
    state: LoadState,
    stream_state: LoadState,
    load_on_demand: bool,
    is_trailer: bool,
    header_parsed: bool,
    has_stream_keyword: bool,
    stream_offset: u64,
}

impl ParserObject {
    /// Prepares the object starting at `offset` for deferred loading.
    /// Nothing is read from the device yet.
    pub fn new(device: SharedDevice, offset: u64) -> Self {
        Self::with_options(device, offset, ParseOptions::default())
    }

    pub fn with_options(device: SharedDevice, offset: u64, options: ParseOptions) -> Self {
        ParserObject {
            device: Some(device),
            decryptor: None,
            offset,
            tokenizer: Tokenizer::with_options(options),
            inner: IndirectObject::new(Object::Null),
            state: LoadState::Unloaded,
            stream_state: LoadState::Unloaded,
            load_on_demand: true,
            is_trailer: false,
            header_parsed: false,
            has_stream_keyword: false,
            stream_offset: 0,
        }
    }

    /// Attaches the decryptor used for strings and stream data.
    pub fn with_decryptor(mut self, decryptor: Rc<dyn Decryptor>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    /// Builds an already-loaded object that lives purely in memory.
    pub fn from_parts(
        id: ObjectId,
        value: impl Into<Object>,
        stream: Option<ObjectStream>,
    ) -> Self {
        ParserObject {
            device: None,
            decryptor: None,
            offset: 0,
            tokenizer: Tokenizer::new(),
            inner: IndirectObject::from_parsed(Some(id), value.into(), stream),
            state: LoadState::Loaded,
            stream_state: LoadState::Loaded,
            load_on_demand: false,
            is_trailer: false,
            header_parsed: true,
            has_stream_keyword: false,
            stream_offset: 0,
        }
    }

    /// Reads the `N G obj` record header and decides how the rest of the
    /// record loads.
    ///
    /// In trailer mode there is no header and no closing `endobj`; the
    /// offset is taken to point straight at the value. With
    /// `load_on_demand` set the value stays on the device until first
    /// access, otherwise it is parsed right away. The stream payload is
    /// always deferred, its `/Length` is not known before the value is.
    pub fn parse(&mut self, is_trailer: bool, load_on_demand: bool) -> PdfResult<()> {
        self.is_trailer = is_trailer;
        self.load_on_demand = load_on_demand;
        if !self.header_parsed {
            let shared = self.backing_device()?;
            let mut guard = shared.borrow_mut();
            let device = &mut *guard;
            self.tokenizer.queue.clear();
            device.seek(SeekFrom::Start(self.offset))?;
            if !is_trailer {
                let id = self.read_object_header(device)?;
                self.inner = IndirectObject::from_parsed(Some(id), Object::Null, None);
            }
            self.offset = device.position()?;
            self.header_parsed = true;
        }
        if !load_on_demand {
            self.ensure_value_loaded()?;
        }
        Ok(())
    }

    /// The object identity read from the record header, once known.
    pub fn id(&self) -> Option<ObjectId> {
        self.inner.id()
    }

    pub fn value(&mut self) -> PdfResult<&Object> {
        self.ensure_value_loaded()?;
        Ok(self.inner.value())
    }

    pub fn value_mut(&mut self) -> PdfResult<&mut Object> {
        self.ensure_value_loaded()?;
        Ok(self.inner.value_mut())
    }

    pub fn is_dirty(&mut self) -> PdfResult<bool> {
        self.ensure_value_loaded()?;
        Ok(self.inner.is_dirty())
    }

    pub fn has_stream(&mut self) -> PdfResult<bool> {
        self.ensure_value_loaded()?;
        Ok(self.has_stream_keyword || self.inner.has_stream())
    }

    pub fn stream(&mut self) -> PdfResult<Option<&ObjectStream>> {
        self.ensure_value_loaded()?;
        self.ensure_stream_loaded()?;
        Ok(self.inner.stream())
    }

    /// Loads value and stream right away instead of on first use.
    pub fn force_stream_parse(&mut self) -> PdfResult<()> {
        self.ensure_value_loaded()?;
        self.ensure_stream_loaded()
    }

    /// The stream payload decoded through its `/Filter` chain, or `None`
    /// if the object carries no stream.
    pub fn filtered_stream_copy(&mut self) -> PdfResult<Option<Vec<u8>>> {
        self.ensure_value_loaded()?;
        self.ensure_stream_loaded()?;
        if !self.inner.has_stream() {
            return Ok(None);
        }
        self.inner.filtered_stream_copy().map(Some)
    }

    /// Full access to the underlying object, loading value and stream
    /// first.
    pub fn object_mut(&mut self) -> PdfResult<&mut IndirectObject> {
        self.ensure_value_loaded()?;
        self.ensure_stream_loaded()?;
        Ok(&mut self.inner)
    }

    pub fn into_object(mut self) -> PdfResult<IndirectObject> {
        self.ensure_value_loaded()?;
        self.ensure_stream_loaded()?;
        Ok(self.inner)
    }

    /// Drops the parsed value and stream so they reload from the device
    /// on next access. Only demand-loaded objects can be freed, and dirty
    /// ones are kept unless `force` is set.
    pub fn free_object_memory(&mut self, force: bool) {
        if !self.load_on_demand || self.device.is_none() || self.state != LoadState::Loaded {
            return;
        }
        if self.inner.is_dirty() && !force {
            return;
        }
        tracing::debug!(object = %self.describe(), "freeing parsed object memory");
        self.inner.drop_payload();
        self.state = LoadState::Unloaded;
        self.stream_state = LoadState::Unloaded;
        self.has_stream_keyword = false;
        self.stream_offset = 0;
    }

    fn backing_device(&self) -> PdfResult<SharedDevice> {
        match &self.device {
            Some(device) => Ok(Rc::clone(device)),
            None => Err(PdfError::invalid_type("object is not backed by a device")),
        }
    }

    fn ensure_value_loaded(&mut self) -> PdfResult<()> {
        match self.state {
            LoadState::Loaded => Ok(()),
            LoadState::Loading => panic!("re-entrant load of object value"),
            LoadState::Unloaded => {
                self.state = LoadState::Loading;
                match self.parse_value() {
                    Ok(()) => {
                        self.state = LoadState::Loaded;
                        Ok(())
                    }
                    Err(err) => {
                        self.state = LoadState::Unloaded;
                        Err(err)
                    }
                }
            }
        }
    }

    fn parse_value(&mut self) -> PdfResult<()> {
        let shared = self.backing_device()?;
        let mut guard = shared.borrow_mut();
        let device = &mut *guard;
        // Lookahead queued by an earlier failed attempt belongs to a
        // stale device position.
        self.tokenizer.queue.clear();
        device.seek(SeekFrom::Start(self.offset))?;

        if !self.header_parsed {
            let id = self.read_object_header(device)?;
            self.inner = IndirectObject::from_parsed(Some(id), Object::Null, None);
            self.offset = device.position()?;
            self.header_parsed = true;
        }
        let id = self.inner.id();

        let token = self
            .tokenizer
            .next_token(device)?
            .ok_or_else(|| PdfError::eof("expected object value or 'endobj'"))?;
        let mut value = Object::Null;
        let mut has_stream = false;
        if !(token.kind == TokenKind::Word && token.text == "endobj") {
            let decryptor = self.decryptor.clone();
            let encrypt = match (decryptor.as_deref(), id) {
                (Some(decryptor), Some(id)) => Some(EncryptionContext::new(decryptor, id)),
                _ => None,
            };
            value = self
                .tokenizer
                .read_variant_from_token(device, &token, encrypt)
                .with_context(|| self.describe())?;

            if !self.is_trailer {
                let after = self.tokenizer.next_token(device)?.ok_or_else(|| {
                    PdfError::eof(format!("expected 'endobj' to close {}", self.describe()))
                })?;
                match (after.kind, after.text.as_str()) {
                    (TokenKind::Word, "endobj") => {}
                    (TokenKind::Word, "stream") if value.as_dict().is_some() => {
                        has_stream = true;
                        self.stream_offset = device.position()?;
                    }
                    _ => {
                        return Err(PdfError::invalid_type(format!(
                            "unexpected token '{}' after the value of {}",
                            after.text,
                            self.describe()
                        )))
                    }
                }
            }
        }

        self.inner = IndirectObject::from_parsed(id, value, None);
        self.has_stream_keyword = has_stream;
        Ok(())
    }

    /// Reads `N G obj` at the current device position.
    fn read_object_header(&mut self, device: &mut dyn StreamDevice) -> PdfResult<ObjectId> {
        let number = self
            .tokenizer
            .read_next_number(device)
            .context("object and generation number cannot be read")?;
        let generation = self
            .tokenizer
            .read_next_number(device)
            .context("object and generation number cannot be read")?;
        let id = match (u32::try_from(number), u16::try_from(generation)) {
            (Ok(number), Ok(generation)) => ObjectId::new(number, generation),
            _ => {
                return Err(PdfError::malformed(format!(
                    "object identity {number} {generation} is out of range"
                )))
            }
        };
        if !self.tokenizer.is_next_token(device, "obj")? {
            return Err(PdfError::malformed(format!(
                "expected keyword 'obj' after {number} {generation}"
            )));
        }
        Ok(id)
    }

    fn describe(&self) -> String {
        match self.inner.id() {
            Some(id) => format!("object {id} at offset {}", self.offset),
            None => format!("trailer at offset {}", self.offset),
        }
    }

    fn ensure_stream_loaded(&mut self) -> PdfResult<()> {
        if !self.has_stream_keyword || self.stream_state == LoadState::Loaded {
            return Ok(());
        }
        if self.stream_state == LoadState::Loading {
            panic!("re-entrant load of object stream");
        }
        self.stream_state = LoadState::Loading;
        match self.parse_stream() {
            Ok(()) => {
                self.stream_state = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                self.stream_state = LoadState::Unloaded;
                let id = self.inner.id().unwrap_or_else(|| ObjectId::new(0, 0));
                Err(err.with_context(format!("unable to parse the stream of object {id}")))
            }
        }
    }

    /// Positions the device on the first data byte and copies `/Length`
    /// bytes, decrypting on the way in when a decryptor applies.
    fn parse_stream(&mut self) -> PdfResult<()> {
        let shared = self.backing_device()?;
        let mut guard = shared.borrow_mut();
        let device = &mut *guard;
        device.seek(SeekFrom::Start(self.stream_offset))?;

        loop {
            match device.peek_byte()? {
                Some(b' ') | Some(b'\t') => {
                    device.read_byte()?;
                }
                _ => break,
            }
        }
        let data_start = match device.peek_byte()? {
            Some(b'\r') => {
                let at_cr = device.position()?;
                device.read_byte()?;
                if device.peek_byte()? == Some(b'\n') {
                    device.read_byte()?;
                    device.position()?
                } else {
                    // Lone CR line ends come from old writers; the CR
                    // byte already counts as data.
                    at_cr
                }
            }
            Some(b'\n') => {
                device.read_byte()?;
                device.position()?
            }
            _ => {
                tracing::debug!(
                    offset = self.stream_offset,
                    "stream keyword without EOL marker"
                );
                device.position()?
            }
        };
        device.seek(SeekFrom::Start(data_start))?;

        let length = self
            .inner
            .value()
            .as_dict()
            .and_then(|dict| dict.get_integer("Length"))
            .and_then(|length| usize::try_from(length).ok())
            .ok_or(PdfError::InvalidStreamLength)?;

        let mut stream = ObjectStream::new();
        match self.stream_decryptor() {
            Some(decryptor) => {
                let id = self.inner.id().unwrap_or_else(|| ObjectId::new(0, 0));
                let mut filter = decryptor.decoding_filter(id);
                stream.set_raw_data_decoded(device, Some(length), filter.as_mut())?;
            }
            None => stream.set_raw_data(device, Some(length))?,
        }
        self.inner.set_parsed_stream(stream);
        Ok(())
    }

    /// Streams marked `/Crypt` stay as stored when the document keeps
    /// its metadata unencrypted.
    fn stream_decryptor(&self) -> Option<Rc<dyn Decryptor>> {
        let decryptor = self.decryptor.as_ref()?;
        if !decryptor.is_metadata_encrypted()
            && self.inner.value().as_dict().map_or(false, has_crypt_filter)
        {
            return None;
        }
        Some(Rc::clone(decryptor))
    }
}

fn has_crypt_filter(dict: &Dictionary) -> bool {
    match dict.get("Filter") {
        Some(Object::Name(name)) => *name == "Crypt",
        Some(Object::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Object::Name(name) if *name == "Crypt")),
        _ => false,
    }
}
