//! # camjpeg
//!
//! Baseline JPEG encoder for raw camera frames.
//!
//! Frames arrive in the layouts a sensor or capture pipeline produces and are
//! coded straight from them, one MCU at a time, into a single baseline scan:
//!
//! - **1-bit bitmaps**, **8-bit grayscale** and **RGB565**
//! - **Packed YUV 4:2:2** (YUYV and YVYU)
//! - **Bayer CFA raw**, demosaiced tile by tile
//! - Already-compressed JPEG, copied through unchanged
//!
//! Output goes to a buffer that either grows in fixed steps or stays fixed
//! and fails cleanly with [`Error::BufferOverflow`] when the stream does not
//! fit.
//!
//! ## Quick Start
//!
//! ```no_run
//! use camjpeg::{Encoder, PixelFormat, SourceImage};
//!
//! # fn main() -> Result<(), camjpeg::Error> {
//! // RGB565 pixel data (2 bytes per pixel, little-endian, row-major)
//! let pixels: Vec<u8> = vec![0; 320 * 240 * 2];
//! let image = SourceImage::new(&pixels, 320, 240, PixelFormat::Rgb565);
//!
//! let jpeg = Encoder::new().quality(85).compress(&image)?;
//! assert!(camjpeg::is_valid(&jpeg));
//! # Ok(())
//! # }
//! ```
//!
//! ## Fixed Destination Buffer
//!
//! ```no_run
//! use camjpeg::{Encoder, Error, PixelFormat, SourceImage};
//!
//! # fn main() -> Result<(), camjpeg::Error> {
//! # let pixels: Vec<u8> = vec![0; 320 * 240];
//! let image = SourceImage::new(&pixels, 320, 240, PixelFormat::Grayscale);
//! let mut frame_buffer = Vec::with_capacity(32 * 1024);
//!
//! let mut encoder = Encoder::new().allow_growth(false);
//! match encoder.compress_into(&image, &mut frame_buffer) {
//!     Ok(summary) => println!("{} bytes", summary.bytes_written),
//!     Err(Error::BufferOverflow { capacity }) => {
//!         eprintln!("frame does not fit in {} bytes", capacity);
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Explicit Parameters
//!
//! [`compress`] takes every setting as an argument and caches quantization
//! tables in a caller-owned [`EncoderTables`]:
//!
//! ```no_run
//! use camjpeg::{compress, BayerPattern, EncoderTables, PixelFormat, SourceImage, Subsampling};
//!
//! # fn main() -> Result<(), camjpeg::Error> {
//! # let raw: Vec<u8> = vec![0; 640 * 480];
//! let image = SourceImage::new(&raw, 640, 480, PixelFormat::Bayer(BayerPattern::Rggb));
//! let mut tables = EncoderTables::default();
//! let jpeg = compress(&image, None, 50, true, Subsampling::Auto, &mut tables)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

// ============================================================================
// Internal modules - hidden from public docs but accessible for tests
// ============================================================================

/// Bit packing and output buffer management (internal).
#[doc(hidden)]
pub mod bitstream;

/// Color conversion utilities (internal).
#[doc(hidden)]
pub mod color;

/// Constants and standard tables (internal).
#[doc(hidden)]
pub mod consts;

/// DCT transform (internal).
#[doc(hidden)]
pub mod dct;

/// Entropy encoding (internal).
#[doc(hidden)]
pub mod entropy;

/// Huffman table utilities (internal).
#[doc(hidden)]
pub mod huffman;

/// JPEG marker writing (internal).
#[doc(hidden)]
pub mod marker;

/// Quantization tables (internal).
#[doc(hidden)]
pub mod quant;

/// MCU extraction and chroma downsampling (internal).
#[doc(hidden)]
pub mod sample;

/// SIMD dispatch (internal).
#[doc(hidden)]
pub mod simd;

/// Type definitions (internal).
#[doc(hidden)]
pub mod types;

mod debayer;
mod encode;
mod error;
mod validate;

// ============================================================================
// Public API
// ============================================================================

/// The main JPEG encoder.
///
/// Use the builder methods to configure it, then call
/// [`compress()`](Encoder::compress) or
/// [`compress_into()`](Encoder::compress_into) for each frame.
///
/// # Example
///
/// ```no_run
/// use camjpeg::{Encoder, PixelFormat, SourceImage, Subsampling};
///
/// # fn main() -> Result<(), camjpeg::Error> {
/// let pixels: Vec<u8> = vec![0; 640 * 480 * 2];
/// let image = SourceImage::new(&pixels, 640, 480, PixelFormat::Yuv422);
///
/// let mut encoder = Encoder::new()
///     .quality(85)
///     .subsampling(Subsampling::S422)
///     .restart_interval(40);
/// let jpeg = encoder.compress(&image)?;
/// # Ok(())
/// # }
/// ```
pub use encode::Encoder;

/// Encode a frame with explicit parameters.
pub use encode::compress;

/// Error type for encoding and validation.
///
/// # Example
///
/// ```no_run
/// use camjpeg::{Encoder, Error, PixelFormat, SourceImage};
///
/// # fn example() {
/// let image = SourceImage::new(&[], 0, 0, PixelFormat::Grayscale);
/// match Encoder::new().compress(&image) {
///     Ok(data) => println!("Encoded {} bytes", data.len()),
///     Err(Error::InvalidDimensions { width, height }) => {
///         eprintln!("Invalid dimensions: {}x{}", width, height);
///     }
///     Err(e) => eprintln!("Encoding failed: {}", e),
/// }
/// # }
/// ```
pub use error::Error;

/// Result type alias for encoding operations.
///
/// Equivalent to `std::result::Result<T, camjpeg::Error>`.
pub use error::Result;

/// Chroma subsampling mode.
///
/// | Mode | Ratio | Luma sampling byte |
/// |------|-------|--------------------|
/// | [`S444`](Subsampling::S444) | 4:4:4 | 0x11 |
/// | [`S422`](Subsampling::S422) | 4:2:2 | 0x21 |
/// | [`S440`](Subsampling::S440) | 4:4:0 | 0x12 |
/// | [`S420`](Subsampling::S420) | 4:2:0 | 0x22 |
/// | [`Auto`](Subsampling::Auto) | by quality | |
///
/// Grayscale and bitmap sources always use 0x11.
pub use types::Subsampling;

/// A borrowed raw frame and its layout.
pub use types::SourceImage;

/// Raw pixel layouts accepted by the encoder.
pub use types::PixelFormat;

/// Bayer color filter array layouts.
pub use types::BayerPattern;

/// Pixel density for JFIF metadata.
///
/// # Example
///
/// ```no_run
/// use camjpeg::{Encoder, PixelDensity};
///
/// // 300 DPI for print
/// let encoder = Encoder::new().pixel_density(PixelDensity::dpi(300, 300));
/// ```
pub use types::PixelDensity;

/// Density unit for JFIF metadata.
pub use types::DensityUnit;

/// Resource limits checked before any output is written.
///
/// # Example
///
/// ```no_run
/// use camjpeg::{Encoder, Limits};
///
/// let limits = Limits::default()
///     .max_width(4096)
///     .max_height(4096)
///     .max_alloc_bytes(8 * 1024 * 1024);
/// let encoder = Encoder::new().limits(limits);
/// ```
pub use types::Limits;

/// What a successful encode produced.
pub use types::EncodeSummary;

/// An up-to-8x8 rectangle of source pixels.
pub use types::Tile;

/// Luma and chroma quantization tables for one quality.
pub use quant::EncoderTables;

/// Demosaicing for Bayer sources.
pub use debayer::{BayerFrame, BilinearDemosaic, Demosaic};

/// Structural checks on finished streams.
pub use validate::{clean_trailing_bytes, is_valid, validate};
