//! Decryption hooks for encrypted documents
//!
//! The tokenizer and the object parser never talk to a concrete security
//! handler. They see an [`EncryptionContext`], which pairs whatever
//! implements [`Decryptor`] with the identity of the object being read;
//! strings decrypt through it in place, stream payloads decrypt
//! incrementally through a [`DecodingFilter`] while the raw bytes are
//! pulled off the device.
//!
//! [`StandardDecryptor`] is the RC4 flavor of the standard security
//! handler: it derives a per-object key from the file encryption key and
//! the object identity. Authenticating passwords and computing the file
//! key from the `/Encrypt` dictionary happen a layer above this crate.

mod rc4;

use crate::error::PdfResult;
use crate::objects::ObjectId;
use rc4::Rc4;

/// Per-object decryption as exposed to the parsing layer.
pub trait Decryptor {
    /// Decrypts a complete buffer belonging to `id`.
    fn decrypt(&self, data: &[u8], id: ObjectId) -> PdfResult<Vec<u8>>;

    /// Returns a streaming decoder for the payload of `id`.
    fn decoding_filter(&self, id: ObjectId) -> Box<dyn DecodingFilter>;

    /// Whether the document metadata stream is encrypted. Plaintext
    /// metadata also exempts `/Crypt`-filtered streams from decryption.
    fn is_metadata_encrypted(&self) -> bool {
        true
    }
}

/// Incremental decoder fed chunk by chunk as stream bytes arrive.
pub trait DecodingFilter {
    fn feed(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> PdfResult<()>;

    /// Flushes whatever the decoder still holds once input is complete.
    fn finish(&mut self, out: &mut Vec<u8>) -> PdfResult<()>;
}

/// A decryptor bound to the object currently being parsed.
#[derive(Clone, Copy)]
pub struct EncryptionContext<'a> {
    decryptor: &'a dyn Decryptor,
    id: ObjectId,
}

impl<'a> EncryptionContext<'a> {
    pub fn new(decryptor: &'a dyn Decryptor, id: ObjectId) -> Self {
        EncryptionContext { decryptor, id }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn decrypt(&self, data: &[u8]) -> PdfResult<Vec<u8>> {
        self.decryptor.decrypt(data, self.id)
    }

    pub fn decoding_filter(&self) -> Box<dyn DecodingFilter> {
        self.decryptor.decoding_filter(self.id)
    }

    pub fn is_metadata_encrypted(&self) -> bool {
        self.decryptor.is_metadata_encrypted()
    }
}

/// RC4 decryption with per-object keys derived from the file key.
pub struct StandardDecryptor {
    file_key: Vec<u8>,
    metadata_encrypted: bool,
}

impl StandardDecryptor {
    pub fn new(file_key: impl Into<Vec<u8>>) -> Self {
        StandardDecryptor {
            file_key: file_key.into(),
            metadata_encrypted: true,
        }
    }

    /// Marks the document metadata as stored in plaintext.
    pub fn with_unencrypted_metadata(mut self) -> Self {
        self.metadata_encrypted = false;
        self
    }

    /// Object key: md5 over the file key, the low three bytes of the
    /// object number and the low two bytes of the generation, truncated
    /// to `min(file_key_len + 5, 16)`.
    fn object_key(&self, id: ObjectId) -> Vec<u8> {
        let mut material = Vec::with_capacity(self.file_key.len() + 5);
        material.extend_from_slice(&self.file_key);
        material.extend_from_slice(&id.number().to_le_bytes()[..3]);
        material.extend_from_slice(&id.generation().to_le_bytes()[..2]);
        let digest = md5::compute(&material);
        let len = (self.file_key.len() + 5).min(16);
        digest[..len].to_vec()
    }
}

impl Decryptor for StandardDecryptor {
    fn decrypt(&self, data: &[u8], id: ObjectId) -> PdfResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len());
        Rc4::new(&self.object_key(id)).process(data, &mut out);
        Ok(out)
    }

    fn decoding_filter(&self, id: ObjectId) -> Box<dyn DecodingFilter> {
        Box::new(Rc4DecodingFilter {
            cipher: Rc4::new(&self.object_key(id)),
        })
    }

    fn is_metadata_encrypted(&self) -> bool {
        self.metadata_encrypted
    }
}

struct Rc4DecodingFilter {
    cipher: Rc4,
}

impl DecodingFilter for Rc4DecodingFilter {
    fn feed(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> PdfResult<()> {
        self.cipher.process(chunk, out);
        Ok(())
    }

    fn finish(&mut self, _out: &mut Vec<u8>) -> PdfResult<()> {
        Ok(())
    }
}

/// Pass-through handler for documents that are not encrypted, useful
/// where an [`EncryptionContext`] is required by signature.
pub struct IdentityDecryptor;

impl Decryptor for IdentityDecryptor {
    fn decrypt(&self, data: &[u8], _id: ObjectId) -> PdfResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decoding_filter(&self, _id: ObjectId) -> Box<dyn DecodingFilter> {
        Box::new(IdentityFilter)
    }
}

struct IdentityFilter;

impl DecodingFilter for IdentityFilter {
    fn feed(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> PdfResult<()> {
        out.extend_from_slice(chunk);
        Ok(())
    }

    fn finish(&mut self, _out: &mut Vec<u8>) -> PdfResult<()> {
        Ok(())
    }
}
