//! File-backed device

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{DeviceAccess, StreamDevice};
use crate::error::PdfResult;

/// Device over a file on disk.
///
/// The one byte of lookahead required by [`StreamDevice::peek_byte`] is
/// cached here; `position` and `seek` account for it so callers always
/// observe the logical position.
#[derive(Debug)]
pub struct FileDevice {
    file: File,
    access: DeviceAccess,
    peeked: Option<u8>,
}

impl FileDevice {
    /// Opens a file for reading.
    pub fn open(path: impl AsRef<Path>) -> PdfResult<Self> {
        let file = File::open(path)?;
        Ok(FileDevice {
            file,
            access: DeviceAccess::READ,
            peeked: None,
        })
    }

    /// Opens an existing file for reading and in-place writing, as the
    /// signature patcher requires.
    pub fn open_rw(path: impl AsRef<Path>) -> PdfResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(FileDevice {
            file,
            access: DeviceAccess::READ | DeviceAccess::WRITE,
            peeked: None,
        })
    }

    /// Rewinds over the cached lookahead byte, if any, so the OS file
    /// position matches the logical position.
    fn drop_peek(&mut self) -> PdfResult<()> {
        if self.peeked.take().is_some() {
            self.file.seek(SeekFrom::Current(-1))?;
        }
        Ok(())
    }
}

impl StreamDevice for FileDevice {
    fn access(&self) -> DeviceAccess {
        self.access
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn seek(&mut self, pos: SeekFrom) -> PdfResult<u64> {
        self.drop_peek()?;
        Ok(self.file.seek(pos)?)
    }

    fn position(&mut self) -> PdfResult<u64> {
        let pos = self.file.stream_position()?;
        Ok(pos - self.peeked.is_some() as u64)
    }

    fn len(&mut self) -> PdfResult<u64> {
        let current = self.file.stream_position()?;
        let end = self.file.seek(SeekFrom::End(0))?;
        self.file.seek(SeekFrom::Start(current))?;
        Ok(end)
    }

    fn read(&mut self, buf: &mut [u8]) -> PdfResult<usize> {
        self.ensure_access(DeviceAccess::READ)?;
        if buf.is_empty() {
            return Ok(0);
        }
        let mut offset = 0;
        if let Some(byte) = self.peeked.take() {
            buf[0] = byte;
            offset = 1;
        }
        let n = self.file.read(&mut buf[offset..])?;
        Ok(offset + n)
    }

    fn read_byte(&mut self) -> PdfResult<Option<u8>> {
        self.ensure_access(DeviceAccess::READ)?;
        if let Some(byte) = self.peeked.take() {
            return Ok(Some(byte));
        }
        let mut byte = [0u8; 1];
        match self.file.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    fn peek_byte(&mut self) -> PdfResult<Option<u8>> {
        self.ensure_access(DeviceAccess::READ)?;
        if let Some(byte) = self.peeked {
            return Ok(Some(byte));
        }
        let mut byte = [0u8; 1];
        match self.file.read(&mut byte)? {
            0 => Ok(None),
            _ => {
                self.peeked = Some(byte[0]);
                Ok(Some(byte[0]))
            }
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> PdfResult<()> {
        self.ensure_access(DeviceAccess::WRITE)?;
        self.drop_peek()?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> PdfResult<()> {
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfError;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn fixture(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_only_access() {
        let file = fixture(b"data");
        let mut device = FileDevice::open(file.path()).unwrap();
        assert_eq!(device.access(), DeviceAccess::READ);
        assert!(matches!(
            device.write_all(b"x"),
            Err(PdfError::AccessViolation { requested: "write" })
        ));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let file = fixture(b"abc");
        let mut device = FileDevice::open(file.path()).unwrap();
        assert_eq!(device.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(device.position().unwrap(), 0);
        assert_eq!(device.read_byte().unwrap(), Some(b'a'));
        assert_eq!(device.position().unwrap(), 1);
    }

    #[test]
    fn test_peek_then_bulk_read() {
        let file = fixture(b"abcdef");
        let mut device = FileDevice::open(file.path()).unwrap();
        assert_eq!(device.peek_byte().unwrap(), Some(b'a'));
        let mut buf = [0u8; 4];
        assert_eq!(device.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn test_seek_discards_peek() {
        let file = fixture(b"abcdef");
        let mut device = FileDevice::open(file.path()).unwrap();
        assert_eq!(device.peek_byte().unwrap(), Some(b'a'));
        device.seek(SeekFrom::Start(3)).unwrap();
        assert_eq!(device.read_byte().unwrap(), Some(b'd'));
    }

    #[test]
    fn test_len_preserves_position() {
        let file = fixture(b"abcdef");
        let mut device = FileDevice::open(file.path()).unwrap();
        device.seek(SeekFrom::Start(2)).unwrap();
        assert_eq!(device.len().unwrap(), 6);
        assert_eq!(device.position().unwrap(), 2);
    }

    #[test]
    fn test_in_place_patch() {
        let file = fixture(b"hello world");
        {
            let mut device = FileDevice::open_rw(file.path()).unwrap();
            device.seek(SeekFrom::Start(6)).unwrap();
            device.write_all(b"there").unwrap();
            device.flush().unwrap();
        }
        assert_eq!(std::fs::read(file.path()).unwrap(), b"hello there");
    }
}
