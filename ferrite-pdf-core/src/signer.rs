//! Signature patching of serialized documents
//!
//! Signing happens after serialization: the document is written with two
//! fixed-size placeholders, the `/ByteRange` array and the zero-filled
//! hex `/Contents` window, and this module patches both in place. The
//! byte range is rewritten with real offsets, every document byte
//! outside the `/Contents` window is fed to a [`Signer`], and the
//! resulting signature lands hex-encoded in the window. The document
//! bytes never move, so offsets written elsewhere in the file stay
//! valid.

use std::cell::Cell;
use std::io::SeekFrom;
use std::rc::Rc;

use crate::device::{DeviceAccess, StreamDevice};
use crate::error::{PdfError, PdfResult};

/// Placeholder written for `/ByteRange`, wide enough for four offsets
/// of a ten-digit file.
pub const BYTE_RANGE_BEACON: &[u8] = b"[ 0 1234567890 1234567890 1234567890]";

const SIGNING_CHUNK: usize = 65536;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Produces a digital signature over document bytes fed in order.
///
/// Implementations wrap whatever cryptography applies; the patcher only
/// needs the signature bytes and, for sizing the placeholder up front, a
/// dry run of the same length as the real thing.
pub trait Signer {
    /// Starts a fresh computation, discarding any fed data.
    fn reset(&mut self) -> PdfResult<()>;

    /// Feeds the next span of document bytes.
    fn append_data(&mut self, data: &[u8]) -> PdfResult<()>;

    /// Finishes the computation. A dry run returns placeholder bytes of
    /// the final signature's size without consuming the fed data.
    fn compute_signature(&mut self, dry_run: bool) -> PdfResult<Vec<u8>>;
}

/// The two placeholders a writer must emit for a signature field, plus
/// the file offsets they ended up at.
///
/// The offsets live in shared cells so the serialization code can hold
/// on to them and fill in the positions as it writes, while the caller
/// keeps the beacons to pass to [`sign_document`] afterwards.
pub struct SignatureBeacons {
    contents_beacon: Vec<u8>,
    byte_range_beacon: Vec<u8>,
    contents_offset: Rc<Cell<u64>>,
    byte_range_offset: Rc<Cell<u64>>,
}

impl SignatureBeacons {
    /// Builds beacons reserving room for a signature of
    /// `signature_size` bytes.
    pub fn new(signature_size: usize) -> Self {
        let mut contents = Vec::with_capacity(signature_size * 2 + 2);
        contents.push(b'<');
        contents.resize(signature_size * 2 + 1, b'0');
        contents.push(b'>');
        SignatureBeacons {
            contents_beacon: contents,
            byte_range_beacon: BYTE_RANGE_BEACON.to_vec(),
            contents_offset: Rc::new(Cell::new(0)),
            byte_range_offset: Rc::new(Cell::new(0)),
        }
    }

    /// Sizes the reservation by asking `signer` for a dry-run signature.
    pub fn for_signer(signer: &mut dyn Signer) -> PdfResult<Self> {
        signer.reset()?;
        let probe = signer.compute_signature(true)?;
        Ok(Self::new(probe.len()))
    }

    /// The zero-filled hex window to write for `/Contents`.
    pub fn contents_beacon(&self) -> &[u8] {
        &self.contents_beacon
    }

    /// The placeholder array to write for `/ByteRange`.
    pub fn byte_range_beacon(&self) -> &[u8] {
        &self.byte_range_beacon
    }

    pub fn set_contents_offset(&self, offset: u64) {
        self.contents_offset.set(offset);
    }

    pub fn set_byte_range_offset(&self, offset: u64) {
        self.byte_range_offset.set(offset);
    }

    /// Shared handle on the `/Contents` offset for the writing side.
    pub fn contents_offset_cell(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.contents_offset)
    }

    /// Shared handle on the `/ByteRange` offset for the writing side.
    pub fn byte_range_offset_cell(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.byte_range_offset)
    }

    /// Signature bytes the `/Contents` window can hold.
    pub fn reserved_size(&self) -> usize {
        (self.contents_beacon.len() - 2) / 2
    }
}

/// Patches the byte range and signature of a document whose placeholders
/// sit at the offsets recorded in `beacons`.
pub fn sign_document(
    device: &mut dyn StreamDevice,
    beacons: &SignatureBeacons,
    signer: &mut dyn Signer,
) -> PdfResult<()> {
    device.ensure_access(DeviceAccess::READ | DeviceAccess::WRITE)?;

    let file_end = device.len()?;
    let contents_offset = beacons.contents_offset.get();
    let contents_len = beacons.contents_beacon.len() as u64;
    let hole_end = contents_offset + contents_len;
    if hole_end > file_end {
        return Err(PdfError::invalid_type(
            "signature placeholder lies beyond the end of the document",
        ));
    }

    let range = [0, contents_offset, hole_end, file_end - hole_end];
    tracing::debug!(
        byte_range_offset = beacons.byte_range_offset.get(),
        contents_offset,
        file_end,
        "patching signature beacons"
    );
    adjust_byte_range(
        device,
        beacons.byte_range_offset.get(),
        beacons.byte_range_beacon.len(),
        &range,
    )?;

    signer.reset()?;
    read_for_signature(device, contents_offset, contents_len, signer)?;
    let signature = signer.compute_signature(false)?;

    let reserved = beacons.reserved_size();
    if signature.len() > reserved {
        return Err(PdfError::SignatureTooLarge {
            actual: signature.len(),
            reserved,
        });
    }
    let mut padded = signature;
    padded.resize(reserved, 0);

    let mut window = Vec::with_capacity(padded.len() * 2 + 2);
    window.push(b'<');
    for byte in &padded {
        window.push(HEX_DIGITS[(byte >> 4) as usize]);
        window.push(HEX_DIGITS[(byte & 0x0F) as usize]);
    }
    window.push(b'>');
    device.seek(SeekFrom::Start(contents_offset))?;
    device.write_all(&window)?;
    device.flush()
}

/// Overwrites the byte range placeholder with the real offsets,
/// left-justified and space-padded to the placeholder's full width.
fn adjust_byte_range(
    device: &mut dyn StreamDevice,
    offset: u64,
    beacon_len: usize,
    range: &[u64; 4],
) -> PdfResult<()> {
    let mut rendered =
        format!("[ {} {} {} {}]", range[0], range[1], range[2], range[3]).into_bytes();
    if rendered.len() > beacon_len {
        return Err(PdfError::invalid_type(
            "signature byte range does not fit its placeholder",
        ));
    }
    rendered.resize(beacon_len, b' ');
    device.seek(SeekFrom::Start(offset))?;
    device.write_all(&rendered)
}

/// Feeds the whole document to `signer` in bounded chunks, skipping the
/// reserved `/Contents` window.
fn read_for_signature(
    device: &mut dyn StreamDevice,
    contents_offset: u64,
    contents_len: u64,
    signer: &mut dyn Signer,
) -> PdfResult<()> {
    let mut buffer = vec![0u8; SIGNING_CHUNK];

    device.seek(SeekFrom::Start(0))?;
    let mut remaining = contents_offset;
    while remaining > 0 {
        let want = remaining.min(buffer.len() as u64) as usize;
        let got = device.read_exact_or_eof(&mut buffer[..want])?;
        if got == 0 {
            return Err(PdfError::eof("document ended inside the signed range"));
        }
        signer.append_data(&buffer[..got])?;
        remaining -= got as u64;
    }

    device.seek(SeekFrom::Start(contents_offset + contents_len))?;
    loop {
        let got = device.read(&mut buffer)?;
        if got == 0 {
            break;
        }
        signer.append_data(&buffer[..got])?;
    }
    Ok(())
}
