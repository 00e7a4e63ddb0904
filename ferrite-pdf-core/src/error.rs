use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Invalid data type: {0}")]
    InvalidDataType(String),

    #[error("Missing, indirect or non-integer stream /Length")]
    InvalidStreamLength,

    #[error("Device does not support {0}")]
    UnsupportedDeviceOperation(&'static str),

    #[error("Device access violation: {requested} access not granted")]
    AccessViolation { requested: &'static str },

    #[error("Nesting depth exceeds limit of {limit}")]
    NestingTooDeep { limit: usize },

    #[error("Signature is {actual} bytes but only {reserved} bytes were reserved")]
    SignatureTooLarge { actual: usize, reserved: usize },

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Stream decode error: {0}")]
    StreamDecode(String),

    #[error("FlateDecode requires the compression feature")]
    FlateUnavailable,

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<PdfError>,
    },
}

impl PdfError {
    /// Wraps the error with a description of what was being parsed.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PdfError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub(crate) fn eof(context: impl Into<String>) -> Self {
        PdfError::UnexpectedEof(context.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        PdfError::MalformedToken(message.into())
    }

    pub(crate) fn invalid_type(message: impl Into<String>) -> Self {
        PdfError::InvalidDataType(message.into())
    }
}

pub type PdfResult<T> = std::result::Result<T, PdfError>;

/// Context helpers for `PdfResult`.
pub trait ResultExt<T> {
    /// Attaches a fixed context message to the error, if any.
    fn context(self, context: &str) -> PdfResult<T>;

    /// Attaches a lazily built context message to the error, if any.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> PdfResult<T>;
}

impl<T> ResultExt<T> for PdfResult<T> {
    fn context(self, context: &str) -> PdfResult<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> PdfResult<T> {
        self.map_err(|e| e.with_context(f()))
    }
}
