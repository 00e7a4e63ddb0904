//! Reading page content as one continuous device
//!
//! A page's `/Contents` may be a single stream or an array of streams
//! whose concatenation forms the content. [`CanvasInputDevice`] walks
//! the blocks in order and yields their decoded bytes as one read-only
//! byte source, inserting a single newline between consecutive blocks so
//! a token ending one block can never fuse with the start of the next.
//! Blocks are opened lazily, so a canvas over objects that were never
//! loaded only pulls data as reading progresses.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{DeviceAccess, MemoryDevice, StreamDevice};
use crate::error::{PdfError, PdfResult};
use crate::objects::{Object, ObjectId};
use crate::parser::ParserObject;

pub struct CanvasInputDevice {
    blocks: VecDeque<Rc<RefCell<ParserObject>>>,
    current: Option<MemoryDevice>,
    separator_pending: bool,
    finished: bool,
}

impl CanvasInputDevice {
    /// Builds a canvas over content blocks already in hand.
    pub fn new(blocks: impl IntoIterator<Item = Rc<RefCell<ParserObject>>>) -> Self {
        CanvasInputDevice {
            blocks: blocks.into_iter().collect(),
            current: None,
            separator_pending: false,
            finished: false,
        }
    }

    /// Builds a canvas from a page's `/Contents` entry. `resolve` maps a
    /// reference to its object; references that resolve to nothing are
    /// skipped. Anything other than a reference or an array of
    /// references is rejected.
    pub fn try_from_contents<F>(contents: &Object, mut resolve: F) -> PdfResult<Self>
    where
        F: FnMut(ObjectId) -> Option<Rc<RefCell<ParserObject>>>,
    {
        let mut blocks = VecDeque::new();
        match contents {
            Object::Reference(id) => match resolve(*id) {
                Some(block) => blocks.push_back(block),
                None => tracing::warn!(%id, "page /Contents points at a missing object"),
            },
            Object::Array(items) => {
                for item in items {
                    let id = item.as_reference().ok_or_else(|| {
                        PdfError::invalid_type("page /Contents array holds a non-reference entry")
                    })?;
                    match resolve(id) {
                        Some(block) => blocks.push_back(block),
                        None => tracing::warn!(%id, "page /Contents points at a missing object"),
                    }
                }
            }
            _ => {
                return Err(PdfError::invalid_type(
                    "page /Contents is not a stream reference or an array of them",
                ))
            }
        }
        Ok(CanvasInputDevice::new(blocks))
    }

    fn advance(&mut self, consume: bool) -> PdfResult<Option<u8>> {
        loop {
            if self.separator_pending {
                if consume {
                    self.separator_pending = false;
                }
                return Ok(Some(b'\n'));
            }
            if let Some(device) = &mut self.current {
                let byte = if consume {
                    device.read_byte()?
                } else {
                    device.peek_byte()?
                };
                if let Some(byte) = byte {
                    return Ok(Some(byte));
                }
                self.current = None;
                if self.open_next_block()? {
                    self.separator_pending = true;
                }
                continue;
            }
            if self.finished {
                return Ok(None);
            }
            // First use: open the leading block without a separator
            if !self.open_next_block()? {
                return Ok(None);
            }
        }
    }

    /// Opens the next block with actual content, dropping stream-less
    /// and empty ones. Returns false once the queue is exhausted.
    fn open_next_block(&mut self) -> PdfResult<bool> {
        while let Some(block) = self.blocks.pop_front() {
            let data = block.borrow_mut().filtered_stream_copy()?;
            match data {
                Some(data) if !data.is_empty() => {
                    self.current = Some(MemoryDevice::new(data));
                    return Ok(true);
                }
                Some(_) => tracing::debug!("skipping empty content block"),
                None => tracing::debug!("skipping content element without a stream"),
            }
        }
        self.finished = true;
        Ok(false)
    }
}

impl StreamDevice for CanvasInputDevice {
    fn access(&self) -> DeviceAccess {
        DeviceAccess::READ
    }

    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.advance(true)? {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None => break,
            }
        }
        Ok(filled)
    }

    fn read_byte(&mut self) -> PdfResult<Option<u8>> {
        self.advance(true)
    }

    fn peek_byte(&mut self) -> PdfResult<Option<u8>> {
        self.advance(false)
    }
}
