//! Static Huffman tables for baseline encoding.
//!
//! Only the Annex K tables are used, so derivation cannot fail; the derived
//! format stores code and length indexed by symbol value for O(1) lookup.

use std::sync::OnceLock;

use crate::consts::{
    AC_CHROMINANCE_BITS, AC_CHROMINANCE_VALUES, AC_LUMINANCE_BITS, AC_LUMINANCE_VALUES,
    DC_CHROMINANCE_BITS, DC_CHROMINANCE_VALUES, DC_LUMINANCE_BITS, DC_LUMINANCE_VALUES,
};

/// Maximum code length allowed by JPEG (16 bits)
pub const MAX_CODE_LENGTH: usize = 16;

/// A Huffman table in the raw format written to DHT (bits + values).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HuffTable {
    /// Number of codes of each length (`bits[0]` is unused, `bits[1-16]` are counts)
    pub bits: &'static [u8; 17],
    /// Symbol values in order of increasing code length
    pub values: &'static [u8],
}

impl HuffTable {
    /// Standard DC luminance table.
    pub const DC_LUMA: HuffTable = HuffTable {
        bits: &DC_LUMINANCE_BITS,
        values: &DC_LUMINANCE_VALUES,
    };
    /// Standard AC luminance table.
    pub const AC_LUMA: HuffTable = HuffTable {
        bits: &AC_LUMINANCE_BITS,
        values: &AC_LUMINANCE_VALUES,
    };
    /// Standard DC chrominance table.
    pub const DC_CHROMA: HuffTable = HuffTable {
        bits: &DC_CHROMINANCE_BITS,
        values: &DC_CHROMINANCE_VALUES,
    };
    /// Standard AC chrominance table.
    pub const AC_CHROMA: HuffTable = HuffTable {
        bits: &AC_CHROMINANCE_BITS,
        values: &AC_CHROMINANCE_VALUES,
    };

    /// Returns the total number of symbols in this table.
    pub fn num_symbols(&self) -> usize {
        self.bits[1..].iter().map(|&b| b as usize).sum()
    }
}

/// Derived Huffman table optimized for encoding.
#[derive(Clone, Debug)]
pub struct DerivedTable {
    /// Huffman code for each symbol (indexed by symbol value)
    pub ehufco: [u32; 256],
    /// Code length for each symbol (0 means no code assigned)
    pub ehufsi: [u8; 256],
}

impl DerivedTable {
    /// Build a derived table (Figures C.1-C.3 of T.81).
    pub fn from_huff_table(htbl: &HuffTable) -> Self {
        let mut ehufco = [0u32; 256];
        let mut ehufsi = [0u8; 256];

        // Code lengths in symbol order
        let mut huffsize = [0u8; 256];
        let mut lastp = 0usize;
        for (len, &count) in htbl.bits.iter().enumerate().skip(1) {
            for _ in 0..count {
                huffsize[lastp] = len as u8;
                lastp += 1;
            }
        }
        debug_assert_eq!(lastp, htbl.values.len());

        // Canonical codes: consecutive within a length, shifted left between lengths
        let mut code = 0u32;
        let mut si = huffsize[0];
        for p in 0..lastp {
            while huffsize[p] > si {
                code <<= 1;
                si += 1;
            }
            let symbol = htbl.values[p] as usize;
            ehufco[symbol] = code;
            ehufsi[symbol] = si;
            code += 1;
        }

        Self { ehufco, ehufsi }
    }

    /// Get the code and length for a symbol.
    ///
    /// # Returns
    /// (code, length) tuple, or (0, 0) if symbol has no code.
    #[inline]
    pub fn get_code(&self, symbol: u8) -> (u32, u8) {
        let idx = symbol as usize;
        (self.ehufco[idx], self.ehufsi[idx])
    }
}

/// The four derived Annex K tables.
#[derive(Clone, Debug)]
pub struct StandardTables {
    /// DC luminance
    pub dc_luma: DerivedTable,
    /// AC luminance
    pub ac_luma: DerivedTable,
    /// DC chrominance
    pub dc_chroma: DerivedTable,
    /// AC chrominance
    pub ac_chroma: DerivedTable,
}

impl StandardTables {
    /// Derive all four tables.
    pub fn new() -> Self {
        Self {
            dc_luma: DerivedTable::from_huff_table(&HuffTable::DC_LUMA),
            ac_luma: DerivedTable::from_huff_table(&HuffTable::AC_LUMA),
            dc_chroma: DerivedTable::from_huff_table(&HuffTable::DC_CHROMA),
            ac_chroma: DerivedTable::from_huff_table(&HuffTable::AC_CHROMA),
        }
    }

    /// (DC, AC) tables for a component class.
    #[inline]
    pub fn for_component(&self, is_chroma: bool) -> (&DerivedTable, &DerivedTable) {
        if is_chroma {
            (&self.dc_chroma, &self.ac_chroma)
        } else {
            (&self.dc_luma, &self.ac_luma)
        }
    }
}

impl Default for StandardTables {
    fn default() -> Self {
        Self::new()
    }
}

/// The derived Annex K tables, built on first use and shared by every encode.
pub fn standard_tables() -> &'static StandardTables {
    static TABLES: OnceLock<StandardTables> = OnceLock::new();
    TABLES.get_or_init(StandardTables::new)
}
