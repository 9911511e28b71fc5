use thiserror::Error;

/// Result type for codec operations
pub type ImageResult<T> = Result<T, ImageError>;

/// Errors raised by the image codec.
///
/// Every variant is fatal to the operation that raised it: the codec never
/// retries and never leaves the buffer in a half-written state. An update
/// that fails leaves the image exactly as it was before the call.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Input buffer is not exactly the fixed image size
    #[error("image is {actual} bytes, expected exactly {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A header failed the base-magic mask check during a scan
    #[error("corrupt section header at offset {offset:#x}: magic {magic:#010x}")]
    CorruptSection { offset: usize, magic: u32 },

    /// A named file section does not exist in the image
    #[error("no file section named \"{0}\" in image")]
    TargetNotFound(String),

    /// A replacement payload would extend past the end of the image
    #[error("\"{name}\": {payload_len} byte payload does not fit in image")]
    CapacityExceeded { name: String, payload_len: usize },

    /// Short read while scanning the section table
    #[error("section table read failed")]
    Io(#[from] std::io::Error),
}
