//! In-memory devices backed by byte buffers

use std::io::SeekFrom;
use std::rc::Rc;

use super::{DeviceAccess, StreamDevice};
use crate::error::PdfResult;

/// Resolves a seek target against the current position and total length.
/// Seeking past the end is legal; seeking before the start is not.
fn resolve_seek(current: u64, end: u64, pos: SeekFrom) -> PdfResult<u64> {
    let target = match pos {
        SeekFrom::Start(n) => n as i128,
        SeekFrom::Current(delta) => current as i128 + delta as i128,
        SeekFrom::End(delta) => end as i128 + delta as i128,
    };
    if target < 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "seek before start of device",
        )
        .into());
    }
    Ok(target as u64)
}

/// Read-only device over a shared byte buffer.
///
/// The buffer is reference counted, so several devices (or a device and
/// its owner) can view the same bytes without copying.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    data: Rc<[u8]>,
    pos: u64,
}

impl MemoryDevice {
    /// Creates a device positioned at the start of `data`.
    pub fn new(data: impl Into<Rc<[u8]>>) -> Self {
        MemoryDevice {
            data: data.into(),
            pos: 0,
        }
    }
}

impl StreamDevice for MemoryDevice {
    fn access(&self) -> DeviceAccess {
        DeviceAccess::READ
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn seek(&mut self, pos: SeekFrom) -> PdfResult<u64> {
        self.pos = resolve_seek(self.pos, self.data.len() as u64, pos)?;
        Ok(self.pos)
    }

    fn position(&mut self) -> PdfResult<u64> {
        Ok(self.pos)
    }

    fn len(&mut self) -> PdfResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        self.ensure_access(DeviceAccess::READ)?;
        let end = self.data.len() as u64;
        if self.pos >= end {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = (self.data.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn read_byte(&mut self) -> PdfResult<Option<u8>> {
        self.ensure_access(DeviceAccess::READ)?;
        if self.pos >= self.data.len() as u64 {
            return Ok(None);
        }
        let byte = self.data[self.pos as usize];
        self.pos += 1;
        Ok(Some(byte))
    }

    fn peek_byte(&mut self) -> PdfResult<Option<u8>> {
        self.ensure_access(DeviceAccess::READ)?;
        if self.pos >= self.data.len() as u64 {
            return Ok(None);
        }
        Ok(Some(self.data[self.pos as usize]))
    }
}

/// Growable read/write device over an owned buffer.
///
/// Writes overwrite existing bytes and extend the buffer past its end;
/// writing after a seek beyond the end zero-fills the gap, matching
/// `std::io::Cursor`.
#[derive(Debug, Default)]
pub struct BufferDevice {
    data: Vec<u8>,
    pos: u64,
}

impl BufferDevice {
    /// Creates an empty buffer device.
    pub fn new() -> Self {
        BufferDevice::default()
    }

    /// Creates a device positioned at the start of existing content.
    pub fn with_content(data: impl Into<Vec<u8>>) -> Self {
        BufferDevice {
            data: data.into(),
            pos: 0,
        }
    }

    /// The current buffer content.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the device, returning the buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl StreamDevice for BufferDevice {
    fn access(&self) -> DeviceAccess {
        DeviceAccess::READ | DeviceAccess::WRITE
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn seek(&mut self, pos: SeekFrom) -> PdfResult<u64> {
        self.pos = resolve_seek(self.pos, self.data.len() as u64, pos)?;
        Ok(self.pos)
    }

    fn position(&mut self) -> PdfResult<u64> {
        Ok(self.pos)
    }

    fn len(&mut self) -> PdfResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        self.ensure_access(DeviceAccess::READ)?;
        let end = self.data.len() as u64;
        if self.pos >= end {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = (self.data.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn read_byte(&mut self) -> PdfResult<Option<u8>> {
        self.ensure_access(DeviceAccess::READ)?;
        if self.pos >= self.data.len() as u64 {
            return Ok(None);
        }
        let byte = self.data[self.pos as usize];
        self.pos += 1;
        Ok(Some(byte))
    }

    fn peek_byte(&mut self) -> PdfResult<Option<u8>> {
        self.ensure_access(DeviceAccess::READ)?;
        if self.pos >= self.data.len() as u64 {
            return Ok(None);
        }
        Ok(Some(self.data[self.pos as usize]))
    }

    fn write_all(&mut self, buf: &[u8]) -> PdfResult<()> {
        self.ensure_access(DeviceAccess::WRITE)?;
        let pos = self.pos as usize;
        if pos > self.data.len() {
            self.data.resize(pos, 0);
        }
        let overlap = (self.data.len() - pos).min(buf.len());
        self.data[pos..pos + overlap].copy_from_slice(&buf[..overlap]);
        self.data.extend_from_slice(&buf[overlap..]);
        self.pos += buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;

    #[test]
    fn test_memory_read_and_peek() {
        let mut device = MemoryDevice::new(b"abc".as_slice());
        assert_eq!(device.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(device.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(device.read_byte().unwrap(), Some(b'a'));
        let mut buf = [0u8; 8];
        assert_eq!(device.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"bc".as_slice());
        assert_eq!(device.read_byte().unwrap(), None);
        assert_eq!(device.peek_byte().unwrap(), None);
    }

    #[test]
    fn test_memory_seek_past_end() {
        let mut device = MemoryDevice::new(b"abc".as_slice());
        assert_eq!(device.seek(SeekFrom::Start(100)).unwrap(), 100);
        assert_eq!(device.read_byte().unwrap(), None);
        assert_eq!(device.position().unwrap(), 100);
        assert_eq!(device.seek(SeekFrom::End(-1)).unwrap(), 2);
        assert_eq!(device.read_byte().unwrap(), Some(b'c'));
    }

    #[test]
    fn test_memory_seek_before_start() {
        let mut device = MemoryDevice::new(b"abc".as_slice());
        assert!(matches!(
            device.seek(SeekFrom::Current(-1)),
            Err(PdfError::Io(_))
        ));
    }

    #[test]
    fn test_memory_rejects_write() {
        let mut device = MemoryDevice::new(b"abc".as_slice());
        assert!(matches!(
            device.write_all(b"x"),
            Err(PdfError::AccessViolation { requested: "write" })
        ));
    }

    #[test]
    fn test_buffer_overwrite_and_extend() {
        let mut device = BufferDevice::with_content(b"hello world".as_slice());
        device.seek(SeekFrom::Start(6)).unwrap();
        device.write_all(b"there and more").unwrap();
        assert_eq!(device.as_slice(), b"hello there and more".as_slice());
        assert_eq!(device.position().unwrap(), 20);
    }

    #[test]
    fn test_buffer_write_past_end_zero_fills() {
        let mut device = BufferDevice::new();
        device.seek(SeekFrom::Start(3)).unwrap();
        device.write_all(b"xy").unwrap();
        assert_eq!(device.as_slice(), b"\0\0\0xy".as_slice());
    }

    #[test]
    fn test_buffer_read_back() {
        let mut device = BufferDevice::new();
        device.write_all(b"stream data").unwrap();
        device.seek(SeekFrom::Start(7)).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(device.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"data");
    }
}
