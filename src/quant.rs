//! Quantization table construction and scaling.
//!
//! This module provides:
//! - Quality to scale factor conversion (the IJG formula)
//! - Wire tables in zig-zag order, clamped for baseline
//! - Reciprocal tables that fold the AAN output scaling into quantization
//!
//! [`EncoderTables`] caches both for a quality; it is rebuilt only when the
//! quality changes, so callers encoding many frames at one quality pay for
//! table construction once.

use log::trace;

use crate::consts::{
    AAN_SCALE_FACTORS, DCTSIZE, DCTSIZE2, JPEG_NATURAL_ORDER, STD_CHROMINANCE_QUANT_TBL,
    STD_LUMINANCE_QUANT_TBL,
};
use crate::types::FloatBlock;

/// Convert a quality value (1-100) to a scaling percentage.
///
/// - Quality 50 → 100 (use table as-is)
/// - Quality 100 → 0 (all values become 1)
/// - Quality 1 → 5000
/// - Quality < 50 → 5000 / quality
/// - Quality ≥ 50 → 200 - 2 * quality
pub fn quality_scaling(quality: u8) -> u32 {
    let q = quality.clamp(1, 100) as u32;
    if q < 50 {
        5000 / q
    } else {
        200 - q * 2
    }
}

/// One component class's quantization state.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantTable {
    /// DQT payload, zig-zag order
    pub wire: [u8; DCTSIZE2],
    /// `1 / (q * aan[row] * aan[col] * 8)`, natural order
    pub recip: FloatBlock,
}

impl QuantTable {
    /// Scale an Annex K base table (natural order) by `scale` percent.
    pub fn scaled(base: &[u16; DCTSIZE2], scale: u32) -> Self {
        let mut natural = [0u8; DCTSIZE2];
        for (dst, &b) in natural.iter_mut().zip(base.iter()) {
            let temp = (b as u32 * scale + 50) / 100;
            *dst = temp.clamp(1, 255) as u8;
        }

        let mut wire = [0u8; DCTSIZE2];
        for (zz, dst) in wire.iter_mut().enumerate() {
            *dst = natural[JPEG_NATURAL_ORDER[zz]];
        }

        let mut recip = [0.0f32; DCTSIZE2];
        for row in 0..DCTSIZE {
            for col in 0..DCTSIZE {
                let i = row * DCTSIZE + col;
                recip[i] = 1.0
                    / (natural[i] as f32
                        * AAN_SCALE_FACTORS[row]
                        * AAN_SCALE_FACTORS[col]
                        * 8.0);
            }
        }

        Self { wire, recip }
    }
}

/// Luma and chroma tables for one quality.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderTables {
    quality: u8,
    luma: QuantTable,
    chroma: QuantTable,
}

impl EncoderTables {
    /// Build the tables for `quality` (clamped to 1-100).
    pub fn new(quality: u8) -> Self {
        let quality = quality.clamp(1, 100);
        let scale = quality_scaling(quality);
        Self {
            quality,
            luma: QuantTable::scaled(&STD_LUMINANCE_QUANT_TBL, scale),
            chroma: QuantTable::scaled(&STD_CHROMINANCE_QUANT_TBL, scale),
        }
    }

    /// Rebuild for `quality` unless the tables already match it.
    ///
    /// Returns true if the tables were rebuilt.
    pub fn rebuild_if_needed(&mut self, quality: u8) -> bool {
        let quality = quality.clamp(1, 100);
        if quality == self.quality {
            return false;
        }
        trace!("rebuilding quantization tables: q{} -> q{}", self.quality, quality);
        *self = Self::new(quality);
        true
    }

    /// Quality these tables were built for.
    #[inline]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Luminance table.
    #[inline]
    pub fn luma(&self) -> &QuantTable {
        &self.luma
    }

    /// Chrominance table.
    #[inline]
    pub fn chroma(&self) -> &QuantTable {
        &self.chroma
    }
}

impl Default for EncoderTables {
    fn default() -> Self {
        Self::new(75)
    }
}
