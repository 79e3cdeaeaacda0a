//! MCU extraction: raw pixel layouts to centered 8x8 sample blocks.
//!
//! Each call fills one [`TileSamples`] from a tile of up to 8x8 pixels.
//! Blocks are zero-filled first, so the parts of an edge block that fall
//! outside the image read as mid-gray.
//!
//! Chroma downsampling for 4:2:2, 4:4:0 and 4:2:0 MCUs is done on these
//! blocks by [`average_h`], [`average_v`] and [`average_2x2`].

use crate::color::{center, rgb565_to_rgb, rgb_to_ycbcr};
use crate::consts::{DCTSIZE, DCTSIZE2};
use crate::debayer::{BayerFrame, Demosaic};
use crate::types::{BayerPattern, PixelFormat, SampleBlock, SourceImage, Tile};

/// Samples of one tile: luma, plus chroma for color sources.
#[derive(Debug, Clone)]
pub struct TileSamples {
    /// Luminance
    pub y: SampleBlock,
    /// Blue-difference chroma (zero for single-component sources)
    pub cb: SampleBlock,
    /// Red-difference chroma (zero for single-component sources)
    pub cr: SampleBlock,
}

impl Default for TileSamples {
    fn default() -> Self {
        Self {
            y: [0; DCTSIZE2],
            cb: [0; DCTSIZE2],
            cr: [0; DCTSIZE2],
        }
    }
}

impl TileSamples {
    fn clear(&mut self) {
        self.y = [0; DCTSIZE2];
        self.cb = [0; DCTSIZE2];
        self.cr = [0; DCTSIZE2];
    }
}

/// Reads tiles from a raw frame.
pub struct Extractor<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
    demosaic: &'a dyn Demosaic,
}

impl<'a> Extractor<'a> {
    /// Create an extractor for a validated, uncompressed image.
    pub fn new(image: &SourceImage<'a>, demosaic: &'a dyn Demosaic) -> Self {
        Self {
            data: image.data,
            width: image.width as usize,
            height: image.height as usize,
            stride: image.stride(),
            format: image.format,
            demosaic,
        }
    }

    /// Clip the 8x8 tile at `(x, y)` to the image; empty if fully outside.
    pub fn tile_at(&self, x: usize, y: usize) -> Tile {
        Tile {
            x,
            y,
            width: self.width.saturating_sub(x).min(DCTSIZE),
            height: self.height.saturating_sub(y).min(DCTSIZE),
        }
    }

    /// Fill `out` with the samples of `tile`.
    pub fn extract(&self, tile: Tile, out: &mut TileSamples) {
        out.clear();
        if tile.width == 0 || tile.height == 0 {
            return;
        }
        match self.format {
            PixelFormat::Binary => self.extract_binary(tile, out),
            PixelFormat::Grayscale => self.extract_gray(tile, out),
            PixelFormat::Rgb565 => self.extract_rgb565(tile, out),
            PixelFormat::Yuv422 => self.extract_yuv(tile, out, false),
            PixelFormat::Yvu422 => self.extract_yuv(tile, out, true),
            PixelFormat::Bayer(pattern) => self.extract_bayer(tile, out, pattern),
            // Copied through by the encoder, never tiled
            PixelFormat::Jpeg => {}
        }
    }

    #[inline]
    fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.stride]
    }

    fn extract_binary(&self, tile: Tile, out: &mut TileSamples) {
        for ty in 0..tile.height {
            let row = self.row(tile.y + ty);
            for tx in 0..tile.width {
                let x = tile.x + tx;
                // Bit x%32 of little-endian word x/32 is bit x%8 of byte x/8
                let set = (row[x >> 3] >> (x & 7)) & 1 != 0;
                out.y[ty * DCTSIZE + tx] = if set { 127 } else { -128 };
            }
        }
    }

    fn extract_gray(&self, tile: Tile, out: &mut TileSamples) {
        for ty in 0..tile.height {
            let row = &self.row(tile.y + ty)[tile.x..tile.x + tile.width];
            for (tx, &v) in row.iter().enumerate() {
                out.y[ty * DCTSIZE + tx] = center(v);
            }
        }
    }

    fn extract_rgb565(&self, tile: Tile, out: &mut TileSamples) {
        for ty in 0..tile.height {
            let row = self.row(tile.y + ty);
            for tx in 0..tile.width {
                let i = (tile.x + tx) * 2;
                let (r, g, b) = rgb565_to_rgb(row[i], row[i + 1]);
                let (y, cb, cr) = rgb_to_ycbcr(r, g, b);
                let k = ty * DCTSIZE + tx;
                out.y[k] = y;
                out.cb[k] = cb;
                out.cr[k] = cr;
            }
        }
    }

    fn extract_yuv(&self, tile: Tile, out: &mut TileSamples, swapped: bool) {
        for ty in 0..tile.height {
            let row = self.row(tile.y + ty);
            for tx in 0..tile.width {
                let x = tile.x + tx;
                let pair = x & !1;
                let first = row[pair * 2 + 1];
                // An odd width leaves the last pair without its second chroma byte
                let second = if pair + 1 < self.width {
                    row[pair * 2 + 3]
                } else {
                    128
                };
                let (u, v) = if swapped {
                    (second, first)
                } else {
                    (first, second)
                };
                let k = ty * DCTSIZE + tx;
                out.y[k] = center(row[x * 2]);
                out.cb[k] = center(u);
                out.cr[k] = center(v);
            }
        }
    }

    fn extract_bayer(&self, tile: Tile, out: &mut TileSamples, pattern: BayerPattern) {
        let frame = BayerFrame {
            data: self.data,
            width: self.width,
            height: self.height,
            pattern,
        };
        let mut rgb = [[0u8; 3]; DCTSIZE2];
        self.demosaic.demosaic_tile(&frame, tile, &mut rgb);
        for ty in 0..tile.height {
            for tx in 0..tile.width {
                let k = ty * DCTSIZE + tx;
                let [r, g, b] = rgb[k];
                let (y, cb, cr) = rgb_to_ycbcr(r, g, b);
                out.y[k] = y;
                out.cb[k] = cb;
                out.cr[k] = cr;
            }
        }
    }
}

/// Downsample two horizontally adjacent blocks into one (2x1 means, floor).
pub fn average_h(left: &SampleBlock, right: &SampleBlock, out: &mut SampleBlock) {
    for row in 0..DCTSIZE {
        for col in 0..DCTSIZE {
            let src = if col < 4 { left } else { right };
            let sx = (col % 4) * 2;
            let a = src[row * DCTSIZE + sx] as i16;
            let b = src[row * DCTSIZE + sx + 1] as i16;
            out[row * DCTSIZE + col] = ((a + b) >> 1) as i8;
        }
    }
}

/// Downsample two vertically adjacent blocks into one (1x2 means, floor).
pub fn average_v(top: &SampleBlock, bottom: &SampleBlock, out: &mut SampleBlock) {
    for row in 0..DCTSIZE {
        let src = if row < 4 { top } else { bottom };
        let sy = (row % 4) * 2;
        for col in 0..DCTSIZE {
            let a = src[sy * DCTSIZE + col] as i16;
            let b = src[(sy + 1) * DCTSIZE + col] as i16;
            out[row * DCTSIZE + col] = ((a + b) >> 1) as i8;
        }
    }
}

/// Downsample a 2x2 group of blocks into one (2x2 means, floor).
///
/// `blocks` is `[top_left, top_right, bottom_left, bottom_right]`.
pub fn average_2x2(blocks: [&SampleBlock; 4], out: &mut SampleBlock) {
    for row in 0..DCTSIZE {
        for col in 0..DCTSIZE {
            let src = blocks[(row / 4) * 2 + col / 4];
            let sy = (row % 4) * 2;
            let sx = (col % 4) * 2;
            let sum = src[sy * DCTSIZE + sx] as i16
                + src[sy * DCTSIZE + sx + 1] as i16
                + src[(sy + 1) * DCTSIZE + sx] as i16
                + src[(sy + 1) * DCTSIZE + sx + 1] as i16;
            out[row * DCTSIZE + col] = (sum >> 2) as i8;
        }
    }
}
