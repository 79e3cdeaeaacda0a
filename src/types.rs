//! Core type definitions for the camera JPEG encoder.
//!
//! Source images arrive in one of a handful of raw sensor/framebuffer
//! layouts described by [`PixelFormat`]; everything downstream of the
//! extractor works on centered 8x8 sample blocks.

use crate::consts::DCTSIZE2;
use crate::error::{Error, Result};

// =============================================================================
// Pixel Formats
// =============================================================================

/// Color filter array layout of a Bayer sensor, named by the top-left 2x2 cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayerPattern {
    /// R G / G B
    Rggb,
    /// B G / G R
    Bggr,
    /// G R / B G
    Grbg,
    /// G B / R G
    Gbrg,
}

/// Color channel recorded by a single CFA site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfaChannel {
    /// Red
    Red,
    /// Green
    Green,
    /// Blue
    Blue,
}

impl BayerPattern {
    /// Channel sampled at pixel `(x, y)`.
    #[inline]
    pub const fn channel_at(self, x: usize, y: usize) -> CfaChannel {
        let odd_x = x & 1 == 1;
        let odd_y = y & 1 == 1;
        // Normalize every pattern to RGGB by shifting the origin.
        let (odd_x, odd_y) = match self {
            BayerPattern::Rggb => (odd_x, odd_y),
            BayerPattern::Bggr => (!odd_x, !odd_y),
            BayerPattern::Grbg => (!odd_x, odd_y),
            BayerPattern::Gbrg => (odd_x, !odd_y),
        };
        match (odd_x, odd_y) {
            (false, false) => CfaChannel::Red,
            (true, true) => CfaChannel::Blue,
            _ => CfaChannel::Green,
        }
    }
}

/// Layout of the raw pixel data handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 bit per pixel, rows padded to 32-bit little-endian words.
    /// Bit `x % 32` of word `x / 32` is pixel `x`; set bits are white.
    Binary,
    /// 8-bit luminance.
    Grayscale,
    /// 16-bit little-endian RGB565.
    Rgb565,
    /// Packed 4:2:2, `Y0 U Y1 V` per pixel pair.
    Yuv422,
    /// Packed 4:2:2, `Y0 V Y1 U` per pixel pair.
    Yvu422,
    /// 8-bit Bayer color filter array raw.
    Bayer(BayerPattern),
    /// Data is already a JPEG stream and is copied through unchanged.
    Jpeg,
}

impl PixelFormat {
    /// Returns true if the format carries chroma.
    pub const fn is_color(self) -> bool {
        matches!(
            self,
            PixelFormat::Rgb565 | PixelFormat::Yuv422 | PixelFormat::Yvu422 | PixelFormat::Bayer(_)
        )
    }

    /// Returns true if the data is an already-encoded JPEG.
    pub const fn is_compressed(self) -> bool {
        matches!(self, PixelFormat::Jpeg)
    }

    /// Number of components in the encoded frame.
    pub const fn num_components(self) -> usize {
        if self.is_color() {
            3
        } else {
            1
        }
    }

    /// Bytes per source row, or `None` for compressed data or on overflow.
    pub fn row_stride(self, width: usize) -> Option<usize> {
        match self {
            PixelFormat::Binary => width.checked_add(31).map(|w| (w / 32) * 4),
            PixelFormat::Grayscale | PixelFormat::Bayer(_) => Some(width),
            PixelFormat::Rgb565 | PixelFormat::Yuv422 | PixelFormat::Yvu422 => {
                width.checked_mul(2)
            }
            PixelFormat::Jpeg => None,
        }
    }
}

/// An up-to-8x8 rectangle of source pixels feeding one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Left edge in pixels
    pub x: usize,
    /// Top edge in pixels
    pub y: usize,
    /// Width in pixels (1-8)
    pub width: usize,
    /// Height in pixels (1-8)
    pub height: usize,
}

// =============================================================================
// Source Image
// =============================================================================

/// A borrowed raw frame.
#[derive(Debug, Clone, Copy)]
pub struct SourceImage<'a> {
    /// Pixel data in `format` layout, rows tightly packed at [`PixelFormat::row_stride`]
    pub data: &'a [u8],
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: PixelFormat,
}

impl<'a> SourceImage<'a> {
    /// Describe a raw frame.
    pub const fn new(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Wrap an already-encoded JPEG stream.
    pub const fn jpeg(data: &'a [u8]) -> Self {
        Self {
            data,
            width: 0,
            height: 0,
            format: PixelFormat::Jpeg,
        }
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.format.row_stride(self.width as usize).unwrap_or(0)
    }

    /// Number of bytes the raw frame must contain.
    pub fn expected_len(&self) -> Result<usize> {
        if self.format.is_compressed() {
            return Ok(self.data.len());
        }
        self.format
            .row_stride(self.width as usize)
            .and_then(|stride| stride.checked_mul(self.height as usize))
            .ok_or(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
    }

    /// Check geometry, buffer size and limits before any output is written.
    pub fn check(&self, limits: &Limits) -> Result<()> {
        if self.format.is_compressed() {
            if self.data.is_empty() {
                return Err(Error::BufferSizeMismatch {
                    expected: 2,
                    actual: 0,
                });
            }
            return limits.check_alloc(self.data.len());
        }

        // SOF0 stores dimensions as u16
        if self.width == 0
            || self.height == 0
            || self.width > u16::MAX as u32
            || self.height > u16::MAX as u32
        {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        limits.check_dimensions(self.width, self.height)?;

        let expected = self.expected_len()?;
        if self.data.len() < expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Sampling Factor / Subsampling
// =============================================================================

/// Chroma subsampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subsampling {
    /// 4:4:4 - No subsampling
    S444,
    /// 4:2:2 - Horizontal subsampling
    S422,
    /// 4:2:0 - Horizontal and vertical subsampling
    S420,
    /// 4:4:0 - Vertical subsampling only
    S440,
    /// Pick from the quality: 4:2:0 up to 35, 4:2:2 below 60, else 4:4:4
    #[default]
    Auto,
}

impl Subsampling {
    /// Resolve `Auto` and collapse everything to 4:4:4 for single-component sources.
    pub const fn resolve(self, quality: u8, is_color: bool) -> Subsampling {
        if !is_color {
            return Subsampling::S444;
        }
        match self {
            Subsampling::Auto => {
                if quality <= 35 {
                    Subsampling::S420
                } else if quality < 60 {
                    Subsampling::S422
                } else {
                    Subsampling::S444
                }
            }
            other => other,
        }
    }

    /// Returns (h_samp_factor, v_samp_factor) for the luminance component.
    ///
    /// `Auto` reports 1x1; resolve it first.
    pub const fn luma_factors(self) -> (u8, u8) {
        match self {
            Subsampling::S444 | Subsampling::Auto => (1, 1),
            Subsampling::S422 => (2, 1),
            Subsampling::S420 => (2, 2),
            Subsampling::S440 => (1, 2),
        }
    }

    /// SOF0 sampling byte for the luminance component (`h << 4 | v`).
    pub const fn luma_sampling_byte(self) -> u8 {
        let (h, v) = self.luma_factors();
        (h << 4) | v
    }

    /// MCU size in pixels (width, height).
    pub const fn mcu_size(self) -> (usize, usize) {
        let (h, v) = self.luma_factors();
        (h as usize * 8, v as usize * 8)
    }

    /// Luma blocks per MCU.
    pub const fn luma_blocks(self) -> usize {
        let (h, v) = self.luma_factors();
        h as usize * v as usize
    }
}

// =============================================================================
// Component Info
// =============================================================================

/// Frame/scan parameters of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Component identifier (1=Y, 2=Cb, 3=Cr)
    pub component_id: u8,
    /// Horizontal sampling factor
    pub h_samp_factor: u8,
    /// Vertical sampling factor
    pub v_samp_factor: u8,
    /// Quantization table index (0 luma, 1 chroma)
    pub quant_tbl_no: u8,
    /// DC Huffman table index
    pub dc_tbl_no: u8,
    /// AC Huffman table index
    pub ac_tbl_no: u8,
}

impl ComponentInfo {
    /// Component list for a frame: Y only, or Y/Cb/Cr with chroma at 1x1.
    pub fn for_frame(subsampling: Subsampling, is_color: bool) -> Vec<ComponentInfo> {
        let (h, v) = subsampling.luma_factors();
        let luma = ComponentInfo {
            component_id: 1,
            h_samp_factor: h,
            v_samp_factor: v,
            quant_tbl_no: 0,
            dc_tbl_no: 0,
            ac_tbl_no: 0,
        };
        if !is_color {
            return vec![luma];
        }
        let chroma = |id| ComponentInfo {
            component_id: id,
            h_samp_factor: 1,
            v_samp_factor: 1,
            quant_tbl_no: 1,
            dc_tbl_no: 1,
            ac_tbl_no: 1,
        };
        vec![luma, chroma(2), chroma(3)]
    }

    /// SOF0 sampling byte (`h << 4 | v`).
    pub const fn sampling_byte(&self) -> u8 {
        (self.h_samp_factor << 4) | self.v_samp_factor
    }
}

// =============================================================================
// JFIF Density
// =============================================================================

/// Unit of the JFIF density fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DensityUnit {
    /// Aspect ratio only
    #[default]
    None = 0,
    /// Dots per inch
    PerInch = 1,
    /// Dots per centimeter
    PerCm = 2,
}

/// Pixel density written to the APP0 segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelDensity {
    /// Unit of `x` and `y`
    pub unit: DensityUnit,
    /// Horizontal density
    pub x: u16,
    /// Vertical density
    pub y: u16,
}

impl Default for PixelDensity {
    fn default() -> Self {
        Self::aspect_ratio(1, 1)
    }
}

impl PixelDensity {
    /// Dots per inch.
    pub const fn dpi(x: u16, y: u16) -> Self {
        Self {
            unit: DensityUnit::PerInch,
            x,
            y,
        }
    }

    /// Dots per centimeter.
    pub const fn dpcm(x: u16, y: u16) -> Self {
        Self {
            unit: DensityUnit::PerCm,
            x,
            y,
        }
    }

    /// Pixel aspect ratio without physical units.
    pub const fn aspect_ratio(x: u16, y: u16) -> Self {
        Self {
            unit: DensityUnit::None,
            x,
            y,
        }
    }
}

// =============================================================================
// Limits
// =============================================================================

/// Resource limits checked before encoding. A value of 0 disables the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    /// Maximum image width in pixels
    pub max_width: u32,
    /// Maximum image height in pixels
    pub max_height: u32,
    /// Maximum width x height
    pub max_pixel_count: u64,
    /// Maximum size the destination buffer may reach
    pub max_alloc_bytes: usize,
}

impl Limits {
    /// Set the maximum width.
    pub fn max_width(mut self, width: u32) -> Self {
        self.max_width = width;
        self
    }

    /// Set the maximum height.
    pub fn max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    /// Set the maximum pixel count.
    pub fn max_pixel_count(mut self, count: u64) -> Self {
        self.max_pixel_count = count;
        self
    }

    /// Set the maximum destination buffer size.
    pub fn max_alloc_bytes(mut self, bytes: usize) -> Self {
        self.max_alloc_bytes = bytes;
        self
    }

    fn check_one(what: &'static str, value: u64, limit: u64) -> Result<()> {
        if limit != 0 && value > limit {
            Err(Error::LimitExceeded { what, value, limit })
        } else {
            Ok(())
        }
    }

    /// Check image dimensions against the limits.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        Self::check_one("width", width as u64, self.max_width as u64)?;
        Self::check_one("height", height as u64, self.max_height as u64)?;
        Self::check_one(
            "pixel count",
            width as u64 * height as u64,
            self.max_pixel_count,
        )
    }

    /// Check a buffer size against `max_alloc_bytes`.
    pub fn check_alloc(&self, bytes: usize) -> Result<()> {
        Self::check_one("allocation", bytes as u64, self.max_alloc_bytes as u64)
    }
}

// =============================================================================
// Encode Summary
// =============================================================================

/// What an encode produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Length of the stream in bytes
    pub bytes_written: usize,
    /// Subsampling after resolving `Auto` and single-component sources
    pub subsampling: Subsampling,
    /// Components in the frame (1 or 3; 0 for pass-through)
    pub num_components: usize,
    /// MCUs coded (0 for pass-through)
    pub mcu_count: usize,
}

// =============================================================================
// Block Types
// =============================================================================

/// A single 8x8 block of centered samples (-128..=127).
pub type SampleBlock = [i8; DCTSIZE2];

/// A single 8x8 block of quantized coefficients in zig-zag order.
pub type CoeffBlock = [i16; DCTSIZE2];

/// A single 8x8 block of floating-point values.
pub type FloatBlock = [f32; DCTSIZE2];
