//! Error types for the camjpeg encoder.

use std::fmt;

/// Result type for camjpeg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for camjpeg operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid image dimensions (zero, or larger than a JPEG frame can describe)
    InvalidDimensions {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
    /// Pixel buffer size doesn't match dimensions and format
    BufferSizeMismatch {
        /// Expected buffer size in bytes
        expected: usize,
        /// Actual buffer size in bytes
        actual: usize,
    },
    /// Invalid quality value (must be 1-100)
    InvalidQuality(u8),
    /// A configured resource limit was exceeded
    LimitExceeded {
        /// Name of the limit
        what: &'static str,
        /// Requested value
        value: u64,
        /// Configured limit
        limit: u64,
    },
    /// Destination buffer exhausted with growth disallowed
    BufferOverflow {
        /// Capacity of the destination buffer in bytes
        capacity: usize,
    },
    /// Destination growth was allowed but memory could not be obtained
    AllocationFailed,
    /// Buffer is not a structurally valid baseline JPEG stream
    InvalidStream {
        /// Reason the stream was rejected
        reason: &'static str,
    },
    /// I/O error while handing the stream to a writer
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {}x{}", width, height)
            }
            Error::BufferSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "Buffer size mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            Error::InvalidQuality(q) => {
                write!(f, "Invalid quality value: {} (must be 1-100)", q)
            }
            Error::LimitExceeded { what, value, limit } => {
                write!(f, "Limit exceeded: {} is {} (limit {})", what, value, limit)
            }
            Error::BufferOverflow { capacity } => {
                write!(f, "Output buffer overflow (capacity {} bytes)", capacity)
            }
            Error::AllocationFailed => {
                write!(f, "Memory allocation failed")
            }
            Error::InvalidStream { reason } => {
                write!(f, "Invalid JPEG stream: {}", reason)
            }
            Error::IoError(msg) => {
                write!(f, "I/O error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}

impl Error {
    /// Returns true for failures caused by running out of output space.
    ///
    /// These are the only errors an encode can hit once the request has been
    /// accepted; the caller may retry with a larger buffer or with growth enabled.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::BufferOverflow { .. } | Error::AllocationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = [
            (
                Error::InvalidDimensions {
                    width: 0,
                    height: 100,
                },
                "Invalid image dimensions: 0x100",
            ),
            (
                Error::BufferSizeMismatch {
                    expected: 1000,
                    actual: 500,
                },
                "Buffer size mismatch: expected 1000, got 500",
            ),
            (
                Error::InvalidQuality(0),
                "Invalid quality value: 0 (must be 1-100)",
            ),
            (
                Error::LimitExceeded {
                    what: "width",
                    value: 5000,
                    limit: 4096,
                },
                "Limit exceeded: width is 5000 (limit 4096)",
            ),
            (
                Error::BufferOverflow { capacity: 128 },
                "Output buffer overflow (capacity 128 bytes)",
            ),
            (Error::AllocationFailed, "Memory allocation failed"),
            (
                Error::InvalidStream {
                    reason: "missing SOI",
                },
                "Invalid JPEG stream: missing SOI",
            ),
            (Error::IoError("disk full".into()), "I/O error: disk full"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_try_reserve_error() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(Error::from(err), Error::AllocationFailed);
    }

    #[test]
    fn test_is_capacity() {
        assert!(Error::BufferOverflow { capacity: 0 }.is_capacity());
        assert!(Error::AllocationFailed.is_capacity());
        assert!(!Error::InvalidQuality(0).is_capacity());
        assert!(!Error::InvalidStream { reason: "x" }.is_capacity());
    }
}
