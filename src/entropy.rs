//! Huffman entropy encoder for baseline JPEG.
//!
//! This module implements:
//! - DC coefficient encoding with differential coding
//! - AC coefficient encoding with run-length coding
//! - EOB (End of Block) and ZRL (Zero Run Length) symbols
//! - Restart markers
//!
//! Reference: ITU-T T.81 Section F.1.2

use crate::bitstream::BitSink;
use crate::consts::{DCTSIZE2, JPEG_RST0, MAX_COMPONENTS};
use crate::huffman::DerivedTable;
use crate::types::CoeffBlock;

/// EOB (End of Block) symbol - encodes as run=0, size=0
const EOB: u8 = 0x00;

/// ZRL (Zero Run Length 16) symbol - encodes 16 consecutive zeros
const ZRL: u8 = 0xF0;

/// Calculate the number of bits needed to represent a value.
///
/// This is the "category" in JPEG terminology:
/// - 0 → 0 bits (value must be 0)
/// - 1 → 1 bit (values -1, 1)
/// - 2 → 2 bits (values -3..-2, 2..3)
/// - etc.
#[inline]
pub fn jpeg_nbits(value: i16) -> u8 {
    if value == 0 {
        return 0;
    }
    16 - value.unsigned_abs().leading_zeros() as u8
}

/// Category and magnitude bits of a coefficient or DC difference.
///
/// Negative values are sent as `value - 1` truncated to `nbits` bits.
#[inline]
fn magnitude(value: i16) -> (u8, u32) {
    let nbits = jpeg_nbits(value);
    let bits = if value < 0 {
        (value as i32 - 1) as u32 & ((1u32 << nbits) - 1)
    } else {
        value as u32
    };
    (nbits, bits)
}

/// Entropy encoder state for a single scan.
pub struct EntropyEncoder<'a> {
    /// Output sink
    sink: &'a mut BitSink,
    /// Last DC value for each component (for differential coding)
    last_dc_val: [i16; MAX_COMPONENTS],
}

impl<'a> EntropyEncoder<'a> {
    /// Create a new entropy encoder with all predictors at zero.
    pub fn new(sink: &'a mut BitSink) -> Self {
        Self {
            sink,
            last_dc_val: [0; MAX_COMPONENTS],
        }
    }

    /// Reset DC predictions (called at restart markers).
    pub fn reset_dc(&mut self) {
        self.last_dc_val = [0; MAX_COMPONENTS];
    }

    /// Emit a restart marker and reset DC predictions.
    ///
    /// Pads the pending bits with 1s to a byte boundary, writes
    /// 0xFF 0xD0+n and resets the predictors.
    ///
    /// # Arguments
    /// * `restart_num` - Restart marker number (masked to 0-7)
    pub fn emit_restart(&mut self, restart_num: u8) {
        self.sink.pad_to_byte();
        self.sink.put_bytes(&[0xFF, JPEG_RST0 + (restart_num & 0x07)]);
        self.reset_dc();
    }

    /// Get the last DC value for a component.
    pub fn last_dc(&self, component: usize) -> i16 {
        self.last_dc_val[component]
    }

    /// Access the underlying sink.
    pub fn sink(&mut self) -> &mut BitSink {
        self.sink
    }

    /// Encode one block of quantized coefficients.
    ///
    /// # Arguments
    /// * `block` - 64 quantized coefficients in zig-zag order
    /// * `last_nonzero` - Zig-zag index of the last non-zero AC coefficient (0 if none)
    /// * `component` - Component index (for DC prediction tracking)
    /// * `dc_table` - Derived Huffman table for DC coefficients
    /// * `ac_table` - Derived Huffman table for AC coefficients
    pub fn encode_block(
        &mut self,
        block: &CoeffBlock,
        last_nonzero: usize,
        component: usize,
        dc_table: &DerivedTable,
        ac_table: &DerivedTable,
    ) {
        self.encode_dc(block[0], component, dc_table);
        self.encode_ac(block, last_nonzero, ac_table);
    }

    fn encode_dc(&mut self, dc: i16, component: usize, dc_table: &DerivedTable) {
        let diff = dc.wrapping_sub(self.last_dc_val[component]);
        self.last_dc_val[component] = dc;

        let (nbits, value) = magnitude(diff);
        let (code, size) = dc_table.get_code(nbits);
        // Code and magnitude go out separately to keep the accumulator under 32 bits
        self.sink.write_bits(code, size);
        self.sink.write_bits(value, nbits);
    }

    fn encode_ac(&mut self, block: &CoeffBlock, last_nonzero: usize, ac_table: &DerivedTable) {
        debug_assert!(last_nonzero < DCTSIZE2);
        let mut run = 0u8;

        for &coef in &block[1..=last_nonzero] {
            if coef == 0 {
                run += 1;
                continue;
            }

            while run >= 16 {
                let (code, size) = ac_table.get_code(ZRL);
                self.sink.write_bits(code, size);
                run -= 16;
            }

            let (nbits, value) = magnitude(coef);
            let (code, size) = ac_table.get_code((run << 4) | nbits);
            self.sink.write_bits(code, size);
            self.sink.write_bits(value, nbits);
            run = 0;
        }

        if last_nonzero < DCTSIZE2 - 1 {
            let (code, size) = ac_table.get_code(EOB);
            self.sink.write_bits(code, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::StandardTables;

    fn encode(blocks: &[(CoeffBlock, usize)]) -> Vec<u8> {
        let tables = StandardTables::new();
        let mut sink = BitSink::with_capacity(256, false).unwrap();
        let mut enc = EntropyEncoder::new(&mut sink);
        for (block, last) in blocks {
            enc.encode_block(block, *last, 0, &tables.dc_luma, &tables.ac_luma);
        }
        sink.end_scan();
        sink.finish().unwrap()
    }

    #[test]
    fn test_jpeg_nbits() {
        assert_eq!(jpeg_nbits(0), 0);
        assert_eq!(jpeg_nbits(1), 1);
        assert_eq!(jpeg_nbits(-1), 1);
        assert_eq!(jpeg_nbits(2), 2);
        assert_eq!(jpeg_nbits(-3), 2);
        assert_eq!(jpeg_nbits(4), 3);
        assert_eq!(jpeg_nbits(8), 4);
        assert_eq!(jpeg_nbits(255), 8);
        assert_eq!(jpeg_nbits(-255), 8);
        assert_eq!(jpeg_nbits(1023), 10);
        assert_eq!(jpeg_nbits(-2047), 11);
    }

    #[test]
    fn test_magnitude_bits() {
        assert_eq!(magnitude(5), (3, 0b101));
        assert_eq!(magnitude(-5), (3, 0b010));
        assert_eq!(magnitude(-1), (1, 0));
        assert_eq!(magnitude(0), (0, 0));
    }

    #[test]
    fn test_encode_zero_block() {
        // DC "00" + EOB "1010" + padding 11 = 0x2B
        assert_eq!(encode(&[([0; DCTSIZE2], 0)]), vec![0x2B]);
    }

    #[test]
    fn test_encode_dc_positive() {
        let mut block = [0i16; DCTSIZE2];
        block[0] = 5;
        // "100" "101" "1010" then padding
        assert_eq!(encode(&[(block, 0)]), vec![0x96, 0xBF]);
    }

    #[test]
    fn test_encode_dc_negative() {
        let mut block = [0i16; DCTSIZE2];
        block[0] = -3;
        // "011" "00" "1010" then padding
        assert_eq!(encode(&[(block, 0)]), vec![0x65, 0x7F]);
    }

    #[test]
    fn test_encode_first_ac() {
        let mut block = [0i16; DCTSIZE2];
        block[1] = 1;
        // DC "00", 0x01 "00" "1", EOB "1010"
        assert_eq!(encode(&[(block, 1)]), vec![0x0D, 0x7F]);
    }

    #[test]
    fn test_encode_zrl() {
        let mut block = [0i16; DCTSIZE2];
        block[17] = 1;
        // DC "00", ZRL "11111111001", 0x01 "00" "1", EOB "1010"
        assert_eq!(encode(&[(block, 17)]), vec![0x3F, 0xC9, 0xAF]);
    }

    #[test]
    fn test_encode_dc_differential() {
        let tables = StandardTables::new();
        let mut sink = BitSink::with_capacity(64, false).unwrap();
        let mut enc = EntropyEncoder::new(&mut sink);
        let mut block = [0i16; DCTSIZE2];
        for dc in [100, 105, 95] {
            block[0] = dc;
            enc.encode_block(&block, 0, 0, &tables.dc_luma, &tables.ac_luma);
        }
        assert_eq!(enc.last_dc(0), 95);
        assert_eq!(enc.last_dc(1), 0);

        // Repeating the same DC costs only the zero-difference code
        let mut a = BitSink::with_capacity(64, false).unwrap();
        let mut b = BitSink::with_capacity(64, false).unwrap();
        block[0] = 40;
        {
            let mut ea = EntropyEncoder::new(&mut a);
            ea.encode_block(&block, 0, 0, &tables.dc_luma, &tables.ac_luma);
            ea.encode_block(&block, 0, 0, &tables.dc_luma, &tables.ac_luma);
        }
        {
            let mut eb = EntropyEncoder::new(&mut b);
            eb.encode_block(&block, 0, 0, &tables.dc_luma, &tables.ac_luma);
            eb.encode_block(&block, 0, 1, &tables.dc_luma, &tables.ac_luma);
        }
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_restart_resets_predictors() {
        let tables = StandardTables::new();
        let mut sink = BitSink::with_capacity(64, false).unwrap();
        let mut enc = EntropyEncoder::new(&mut sink);
        let block = [0i16; DCTSIZE2];
        enc.encode_block(&block, 0, 0, &tables.dc_luma, &tables.ac_luma);
        enc.emit_restart(9);
        assert_eq!(enc.last_dc(0), 0);
        // "001010" padded with "11", then RST1
        assert_eq!(sink.as_bytes(), &[0x2B, 0xFF, 0xD1]);
    }
}
