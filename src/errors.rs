use std::error::Error;
use std::fmt;
use std::io;

/// Enumeration of all possible errors that can end a capture session
#[derive(Debug)]
pub enum CaptureError {
    Stream(StreamError),
    Mp4(Mp4Error),
    Codec(CodecConfigError),
    Decode(DecodeError),
    Other(io::Error),
}

/// Machine-distinguishable category of a [`CaptureError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network fetch failure or stream abort
    Transport,
    /// Box tree missing an expected node, or a codec configuration box absent or malformed
    Structure,
    /// Codec configuration box present but serialized into an unusable descriptor
    CodecConfig,
    /// Decoder rejected its configuration or a chunk, or failed to flush
    Decoder,
    /// Anything that does not fit the categories above
    Unknown,
}

/// Transport errors raised while fetching the container bytes
#[derive(Debug)]
pub struct StreamError {
    pub message: String,
}

impl StreamError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Decoder errors
#[derive(Debug)]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// MP4 box structure errors
#[derive(Debug)]
pub enum Mp4Error {
    /// A required box was not found inside its parent
    MissingBox { name: String, parent: String },
    /// A box was found but its contents are inconsistent
    Malformed { message: String },
}

impl Mp4Error {
    pub fn missing(name: &str, parent: &str) -> Self {
        Mp4Error::MissingBox {
            name: name.to_string(),
            parent: parent.to_string(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Mp4Error::Malformed {
            message: message.into(),
        }
    }
}

/// Errors building the decoder configuration descriptor from a sample entry
#[derive(Debug, Clone, PartialEq)]
pub enum CodecConfigError {
    /// The sample entry carries none of avcC, hvcC, vpcC or av1C
    Absent { entry: String },
    /// A recognized box is present but its fields cannot be used
    Malformed { box_name: String, reason: String },
    /// Serializing the box produced fewer bytes than a box header
    Undersized { box_name: String, len: usize },
}

impl CaptureError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CaptureError::Stream(_) => ErrorCategory::Transport,
            CaptureError::Mp4(_) => ErrorCategory::Structure,
            CaptureError::Codec(CodecConfigError::Undersized { .. }) => ErrorCategory::CodecConfig,
            CaptureError::Codec(_) => ErrorCategory::Structure,
            CaptureError::Decode(_) => ErrorCategory::Decoder,
            CaptureError::Other(_) => ErrorCategory::Unknown,
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Stream(err) => write!(f, "Stream error: {}", err),
            CaptureError::Mp4(err) => write!(f, "{}", err),
            CaptureError::Codec(err) => write!(f, "Codec configuration error: {}", err),
            CaptureError::Decode(err) => write!(f, "Decode error: {}", err),
            CaptureError::Other(err) => write!(f, "Unexpected error: {}", err),
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for Mp4Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mp4Error::MissingBox { name, parent } => {
                write!(f, "MP4 error: {} box not found in {} box", name, parent)
            }
            Mp4Error::Malformed { message } => write!(f, "MP4 error: {}", message),
        }
    }
}

impl fmt::Display for CodecConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecConfigError::Absent { entry } => write!(
                f,
                "avcC, hvcC, vpcC, or av1C box not found in {} sample entry",
                entry
            ),
            CodecConfigError::Malformed { box_name, reason } => {
                write!(f, "Failed to parse {}: {}", box_name, reason)
            }
            CodecConfigError::Undersized { box_name, len } => write!(
                f,
                "Invalid {} box data - buffer too small ({} bytes)",
                box_name, len
            ),
        }
    }
}

impl Error for CaptureError {}
impl Error for StreamError {}
impl Error for DecodeError {}
impl Error for Mp4Error {}
impl Error for CodecConfigError {}

// Conversion implementations
impl From<io::Error> for CaptureError {
    fn from(err: io::Error) -> Self {
        CaptureError::Other(err)
    }
}

impl From<StreamError> for CaptureError {
    fn from(err: StreamError) -> Self {
        CaptureError::Stream(err)
    }
}

impl From<Mp4Error> for CaptureError {
    fn from(err: Mp4Error) -> Self {
        CaptureError::Mp4(err)
    }
}

impl From<CodecConfigError> for CaptureError {
    fn from(err: CodecConfigError) -> Self {
        CaptureError::Codec(err)
    }
}

impl From<DecodeError> for CaptureError {
    fn from(err: DecodeError) -> Self {
        CaptureError::Decode(err)
    }
}

// Type alias for Result with CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;
