/// Error types for bitmap decoding and pixel grid construction
use thiserror::Error;

/// Failure while reading or writing a BMP stream
#[derive(Debug, Error)]
pub enum BmpError {
    /// The stream does not start with the `BM` magic marker
    #[error("Invalid BMP data: {0}")]
    Format(String),

    /// Recognised but unsupported header, compression or bit depth
    #[error("Unsupported BMP: {0}")]
    UnsupportedFormat(String),

    /// The stream ended before the image was complete.
    /// Width and height are whatever had been parsed when the data ran out.
    #[error("BMP data truncated ({width}x{height})")]
    Truncated { width: u32, height: u32 },

    /// Header or pixel content that no valid bitmap carries, such as a
    /// negative width or a palette index past the end of the palette
    #[error("Malformed BMP ({width}x{height}): {reason}")]
    Malformed {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BmpError {
    pub fn format<T: ToString>(msg: T) -> Self {
        BmpError::Format(msg.to_string())
    }

    pub fn unsupported<T: ToString>(msg: T) -> Self {
        BmpError::UnsupportedFormat(msg.to_string())
    }

    pub fn malformed<T: ToString>(width: u32, height: u32, reason: T) -> Self {
        BmpError::Malformed {
            width,
            height,
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for BMP operations
pub type BmpResult<T> = Result<T, BmpError>;

/// Failure while assembling a pixel grid by hand
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("expected {expected} pixels for a {width}x{height} grid, got {actual}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}
