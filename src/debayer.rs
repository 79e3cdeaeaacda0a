//! Demosaicing of Bayer CFA raw frames.
//!
//! The extractor asks a [`Demosaic`] implementation for full RGB over one
//! tile at a time and converts the result like any other RGB source.
//! [`BilinearDemosaic`] is the built-in implementation.

use std::fmt;

use crate::consts::DCTSIZE;
use crate::types::{BayerPattern, CfaChannel, Tile};

/// Borrowed view of a Bayer raw frame (one byte per site, tightly packed rows).
#[derive(Debug, Clone, Copy)]
pub struct BayerFrame<'a> {
    /// Raw CFA samples
    pub data: &'a [u8],
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// CFA layout
    pub pattern: BayerPattern,
}

impl BayerFrame<'_> {
    #[inline]
    fn site(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Reconstructs RGB from CFA samples.
pub trait Demosaic: Send + Sync + fmt::Debug {
    /// Write RGB for every pixel of `tile` into `rgb` (row stride 8).
    ///
    /// Entries outside the tile are left untouched.
    fn demosaic_tile(&self, frame: &BayerFrame<'_>, tile: Tile, rgb: &mut [[u8; 3]; 64]);
}

/// Bilinear interpolation over the 3x3 neighborhood.
///
/// A missing channel is the rounded mean of the same-channel sites among the
/// eight neighbors that lie inside the frame. Sites of a pixel's own channel
/// are passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearDemosaic;

impl BilinearDemosaic {
    fn interpolate(frame: &BayerFrame<'_>, x: usize, y: usize) -> [u8; 3] {
        let own = frame.pattern.channel_at(x, y);
        let mut sum = [0u32; 3];
        let mut count = [0u32; 3];

        let x_lo = x.saturating_sub(1);
        let y_lo = y.saturating_sub(1);
        let x_hi = (x + 1).min(frame.width - 1);
        let y_hi = (y + 1).min(frame.height - 1);
        for ny in y_lo..=y_hi {
            for nx in x_lo..=x_hi {
                if nx == x && ny == y {
                    continue;
                }
                let c = channel_index(frame.pattern.channel_at(nx, ny));
                sum[c] += frame.site(nx, ny) as u32;
                count[c] += 1;
            }
        }

        let value = frame.site(x, y);
        let own_idx = channel_index(own);
        let mut out = [0u8; 3];
        for c in 0..3 {
            out[c] = if c == own_idx || count[c] == 0 {
                // Degenerate frames (1 pixel wide or tall) fall back to the site value
                value
            } else {
                ((sum[c] + count[c] / 2) / count[c]) as u8
            };
        }
        out
    }
}

#[inline]
fn channel_index(c: CfaChannel) -> usize {
    match c {
        CfaChannel::Red => 0,
        CfaChannel::Green => 1,
        CfaChannel::Blue => 2,
    }
}

impl Demosaic for BilinearDemosaic {
    fn demosaic_tile(&self, frame: &BayerFrame<'_>, tile: Tile, rgb: &mut [[u8; 3]; 64]) {
        for ty in 0..tile.height {
            for tx in 0..tile.width {
                rgb[ty * DCTSIZE + tx] = Self::interpolate(frame, tile.x + tx, tile.y + ty);
            }
        }
    }
}
