//! Stream payload storage and the append protocol

use crate::device::StreamDevice;
use crate::encryption::DecodingFilter;
use crate::error::{PdfError, PdfResult};
use crate::parser::{encode_chain, Filter};

/// Bounded buffer size for device-to-stream copies.
pub(crate) const RAW_COPY_CHUNK: usize = 4096;

/// The payload of a stream object.
///
/// `data` always holds the raw form: bytes exactly as they sit in the
/// file, still encoded per the owning dictionary's `/Filter` chain.
/// Plaintext only exists transiently, inside an append scope or in the
/// buffer returned by a filtered copy.
///
/// The append protocol is exclusive and scoped: `begin_append`, any
/// number of `append` calls, then `end_append`. Misuse of the protocol is
/// a caller bug, not bad input, and panics.
#[derive(Debug, Clone, Default)]
pub struct ObjectStream {
    data: Vec<u8>,
    append: Option<AppendState>,
}

#[derive(Debug, Clone)]
struct AppendState {
    filters: Vec<Filter>,
    buffer: Vec<u8>,
}

impl ObjectStream {
    pub fn new() -> Self {
        ObjectStream::default()
    }

    /// Creates a stream holding existing raw (encoded) bytes.
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        ObjectStream {
            data: data.into(),
            append: None,
        }
    }

    /// The raw payload, still encoded.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether an append scope is currently open.
    pub fn is_appending(&self) -> bool {
        self.append.is_some()
    }

    /// Opens an append scope that will encode through `filters`.
    /// Existing raw data is discarded; callers wanting to keep it take a
    /// filtered copy first and re-append it.
    ///
    /// # Panics
    ///
    /// Panics if an append scope is already open.
    pub(crate) fn begin_append(&mut self, filters: Vec<Filter>) {
        if self.append.is_some() {
            panic!("begin_append while an append scope is already open; end_append was not called");
        }
        self.data.clear();
        self.append = Some(AppendState {
            filters,
            buffer: Vec::new(),
        });
    }

    /// Buffers plaintext inside the open append scope.
    ///
    /// # Panics
    ///
    /// Panics if no append scope is open.
    pub fn append(&mut self, bytes: &[u8]) {
        match &mut self.append {
            Some(state) => state.buffer.extend_from_slice(bytes),
            None => panic!("append without begin_append"),
        }
    }

    /// Closes the scope: encodes the buffered plaintext through the
    /// scope's filter chain and stores the result as the raw payload.
    /// Returns the new raw length.
    ///
    /// # Panics
    ///
    /// Panics if no append scope is open.
    pub(crate) fn end_append(&mut self) -> PdfResult<usize> {
        let state = match self.append.take() {
            Some(state) => state,
            None => panic!("end_append without begin_append"),
        };
        self.data = encode_chain(&state.buffer, &state.filters)?;
        Ok(self.data.len())
    }

    /// Replaces the raw payload with bytes copied from `device`,
    /// bypassing filters. `len = Some(n)` reads exactly `n` bytes and
    /// fails with `UnexpectedEof` if the device ends early; `None` reads
    /// to exhaustion. The copy goes through a bounded intermediate
    /// buffer, never one unbounded allocation.
    ///
    /// # Panics
    ///
    /// Panics if an append scope is open.
    pub fn set_raw_data(
        &mut self,
        device: &mut dyn StreamDevice,
        len: Option<usize>,
    ) -> PdfResult<()> {
        self.read_raw_from(device, len, None)
    }

    /// Like `set_raw_data`, but pushes every chunk through `filter`
    /// before storing it. Used for decrypt-on-parse.
    pub(crate) fn set_raw_data_decoded(
        &mut self,
        device: &mut dyn StreamDevice,
        len: Option<usize>,
        filter: &mut dyn DecodingFilter,
    ) -> PdfResult<()> {
        self.read_raw_from(device, len, Some(filter))
    }

    fn read_raw_from(
        &mut self,
        device: &mut dyn StreamDevice,
        len: Option<usize>,
        mut filter: Option<&mut dyn DecodingFilter>,
    ) -> PdfResult<()> {
        if self.append.is_some() {
            panic!("set_raw_data while an append scope is open");
        }
        let mut data = Vec::with_capacity(len.unwrap_or(0).min(RAW_COPY_CHUNK * 16));
        let mut chunk = [0u8; RAW_COPY_CHUNK];
        match len {
            Some(total) => {
                let mut remaining = total;
                while remaining > 0 {
                    let want = remaining.min(chunk.len());
                    let got = device.read_exact_or_eof(&mut chunk[..want])?;
                    if got == 0 {
                        return Err(PdfError::eof(format!(
                            "stream data ended after {} of {} bytes",
                            total - remaining,
                            total
                        )));
                    }
                    match &mut filter {
                        Some(f) => f.feed(&chunk[..got], &mut data)?,
                        None => data.extend_from_slice(&chunk[..got]),
                    }
                    remaining -= got;
                }
            }
            None => loop {
                let got = device.read(&mut chunk)?;
                if got == 0 {
                    break;
                }
                match &mut filter {
                    Some(f) => f.feed(&chunk[..got], &mut data)?,
                    None => data.extend_from_slice(&chunk[..got]),
                }
            },
        }
        if let Some(f) = filter {
            f.finish(&mut data)?;
        }
        self.data = data;
        Ok(())
    }
}
