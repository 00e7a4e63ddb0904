//! Input/output device abstraction
//!
//! Everything the parser reads from and the signer writes to is a
//! [`StreamDevice`]: a byte source/sink with an explicit capability mask,
//! optional seeking and single-byte lookahead. Concrete devices cover
//! in-memory buffers, files on disk and the composite view over a page's
//! content streams.
//!
//! # Example
//!
//! ```rust
//! use ferrite_pdf::device::{MemoryDevice, StreamDevice};
//!
//! # fn main() -> Result<(), ferrite_pdf::PdfError> {
//! let mut device = MemoryDevice::new(b"42 0 R".as_slice());
//! assert_eq!(device.peek_byte()?, Some(b'4'));
//! assert_eq!(device.read_byte()?, Some(b'4'));
//! # Ok(())
//! # }
//! ```

use std::io::SeekFrom;

use bitflags::bitflags;

use crate::error::{PdfError, PdfResult};

mod canvas;
mod file;
mod memory;

pub use canvas::CanvasInputDevice;
pub use file::FileDevice;
pub use memory::{BufferDevice, MemoryDevice};

bitflags! {
    /// Capabilities granted by a device.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceAccess: u8 {
        /// Device supports read operations
        const READ = 1 << 0;
        /// Device supports write operations
        const WRITE = 1 << 1;
    }
}

impl DeviceAccess {
    /// Name used in access violation errors.
    pub fn name(self) -> &'static str {
        if self.contains(DeviceAccess::READ | DeviceAccess::WRITE) {
            "read/write"
        } else if self.contains(DeviceAccess::READ) {
            "read"
        } else if self.contains(DeviceAccess::WRITE) {
            "write"
        } else {
            "no"
        }
    }
}

/// A positionable byte source and/or sink.
///
/// Operations outside the device's capability mask fail with
/// [`PdfError::AccessViolation`]; operations the device cannot express at
/// all (such as seeking a forward-only composite) fail with
/// [`PdfError::UnsupportedDeviceOperation`]. End of input is reported as
/// `Ok(None)` or a short read count, never as an error.
pub trait StreamDevice {
    /// The capability mask of this device.
    fn access(&self) -> DeviceAccess;

    /// Whether `seek`, `position` and `len` are meaningful for this device.
    fn can_seek(&self) -> bool {
        false
    }

    /// Moves the read/write position. Seeking past the end is allowed;
    /// the next read then reports end of input.
    fn seek(&mut self, pos: SeekFrom) -> PdfResult<u64> {
        let _ = pos;
        Err(PdfError::UnsupportedDeviceOperation("seek"))
    }

    /// Current position, in bytes from the start of the device.
    fn position(&mut self) -> PdfResult<u64> {
        Err(PdfError::UnsupportedDeviceOperation("position"))
    }

    /// Total length of the device content, in bytes.
    fn len(&mut self) -> PdfResult<u64> {
        Err(PdfError::UnsupportedDeviceOperation("len"))
    }

    /// Reads up to `buf.len()` bytes, returning how many were read.
    /// Returns `Ok(0)` at end of input.
    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize>;

    /// Reads a single byte, or `None` at end of input.
    fn read_byte(&mut self) -> PdfResult<Option<u8>>;

    /// Returns the next byte without consuming it, or `None` at end of
    /// input. Peeking never advances the position.
    fn peek_byte(&mut self) -> PdfResult<Option<u8>>;

    /// Writes all of `buf` at the current position.
    fn write_all(&mut self, buf: &[u8]) -> PdfResult<()> {
        let _ = buf;
        self.ensure_access(DeviceAccess::WRITE)?;
        Err(PdfError::UnsupportedDeviceOperation("write"))
    }

    /// Flushes buffered writes to the backing store.
    fn flush(&mut self) -> PdfResult<()> {
        Ok(())
    }

    /// Fails with [`PdfError::AccessViolation`] unless the mask grants
    /// the requested capability.
    fn ensure_access(&self, requested: DeviceAccess) -> PdfResult<()> {
        if self.access().contains(requested) {
            Ok(())
        } else {
            Err(PdfError::AccessViolation {
                requested: requested.name(),
            })
        }
    }

    /// Reads until `buf` is full or the device is exhausted, returning
    /// the number of bytes actually read.
    fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        let mut total = 0;
        while total < buf.len() {
            let n = self.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }
}
