//! JPEG marker emission for encoding.
//!
//! This module handles writing JPEG file format markers:
//! - SOI (Start of Image)
//! - APP0 (JFIF header)
//! - DQT (Define Quantization Table)
//! - SOF0 (Start of Frame, baseline)
//! - DHT (Define Huffman Table)
//! - DRI (Define Restart Interval)
//! - SOS (Start of Scan)
//! - EOI (End of Image)
//!
//! All segment lengths are computed from their payloads. Writes go through
//! the [`BitSink`] capacity check, so a header that does not fit latches the
//! sink's overflow flag like any other write.
//!
//! Reference: ITU-T T.81 Section B

use crate::bitstream::BitSink;
use crate::consts::{
    DCTSIZE2, JPEG_APP0, JPEG_DHT, JPEG_DQT, JPEG_DRI, JPEG_EOI, JPEG_SOF0, JPEG_SOI, JPEG_SOS,
};
use crate::huffman::HuffTable;
use crate::quant::EncoderTables;
use crate::types::{ComponentInfo, PixelDensity};

/// JFIF version string
const JFIF_ID: [u8; 5] = *b"JFIF\0";

/// JFIF version 1.01
const JFIF_VERSION: [u8; 2] = [1, 1];

/// Marker writer over a [`BitSink`].
pub struct MarkerWriter<'a> {
    sink: &'a mut BitSink,
}

impl<'a> MarkerWriter<'a> {
    /// Create a new marker writer.
    pub fn new(sink: &'a mut BitSink) -> Self {
        Self { sink }
    }

    #[inline]
    fn emit_byte(&mut self, byte: u8) {
        self.sink.put_byte(byte);
    }

    #[inline]
    fn emit_2bytes(&mut self, value: u16) {
        self.sink.put_u16(value);
    }

    /// Write a marker (0xFF followed by marker code).
    #[inline]
    fn emit_marker(&mut self, marker: u8) {
        self.sink.put_bytes(&[0xFF, marker]);
    }

    /// Write Start of Image marker.
    pub fn write_soi(&mut self) {
        self.emit_marker(JPEG_SOI);
    }

    /// Write End of Image marker.
    pub fn write_eoi(&mut self) {
        self.emit_marker(JPEG_EOI);
    }

    /// Write APP0 (JFIF 1.01) without a thumbnail.
    pub fn write_jfif_app0(&mut self, density: &PixelDensity) {
        self.emit_marker(JPEG_APP0);

        // Length: 2 (length) + 5 (identifier) + 2 (version) + 1 (units) +
        //         2 (x_density) + 2 (y_density) + 1 (thumbnail_width) +
        //         1 (thumbnail_height) = 16
        self.emit_2bytes(16);
        self.sink.put_bytes(&JFIF_ID);
        self.sink.put_bytes(&JFIF_VERSION);

        self.emit_byte(density.unit as u8);
        self.emit_2bytes(density.x);
        self.emit_2bytes(density.y);

        // No thumbnail
        self.emit_byte(0);
        self.emit_byte(0);
    }

    /// Write one DQT segment holding several 8-bit tables.
    ///
    /// # Arguments
    /// * `tables` - Slice of (table_index, 64 values in zig-zag order)
    pub fn write_dqt_multiple(&mut self, tables: &[(u8, &[u8; DCTSIZE2])]) {
        if tables.is_empty() {
            return;
        }

        // Length field + (Pq/Tq + 64 values) per table
        let total_len = 2 + tables.len() as u16 * (1 + DCTSIZE2 as u16);
        self.emit_marker(JPEG_DQT);
        self.emit_2bytes(total_len);

        for (table_index, table) in tables {
            // Pq = 0 (8-bit precision) in the high nibble
            self.emit_byte(*table_index & 0x0F);
            self.sink.put_bytes(&table[..]);
        }
    }

    /// Write the SOF0 (baseline, 8-bit) frame header.
    pub fn write_sof0(&mut self, height: u16, width: u16, components: &[ComponentInfo]) {
        self.emit_marker(JPEG_SOF0);

        // Length: 2 (length) + 1 (precision) + 2 (height) + 2 (width) +
        //         1 (num_components) + 3 * num_components
        let num_components = components.len() as u16;
        self.emit_2bytes(8 + 3 * num_components);

        self.emit_byte(8);
        self.emit_2bytes(height);
        self.emit_2bytes(width);
        self.emit_byte(num_components as u8);

        for comp in components {
            self.emit_byte(comp.component_id);
            self.emit_byte(comp.sampling_byte());
            self.emit_byte(comp.quant_tbl_no);
        }
    }

    /// Write one DHT segment holding several tables.
    ///
    /// # Arguments
    /// * `tables` - Slice of (table_index, is_ac, table)
    pub fn write_dht_multiple(&mut self, tables: &[(u8, bool, &HuffTable)]) {
        if tables.is_empty() {
            return;
        }

        let mut total_len = 2u16;
        for (_, _, table) in tables {
            total_len += 1 + 16 + table.num_symbols() as u16;
        }

        self.emit_marker(JPEG_DHT);
        self.emit_2bytes(total_len);

        for (table_index, is_ac, table) in tables {
            // Tc (table class) in high nibble, Th (table index) in low nibble
            let tc_th = if *is_ac {
                0x10 | (*table_index & 0x0F)
            } else {
                *table_index & 0x0F
            };
            self.emit_byte(tc_th);
            self.sink.put_bytes(&table.bits[1..=16]);
            self.sink.put_bytes(table.values);
        }
    }

    /// Write Define Restart Interval marker.
    ///
    /// # Arguments
    /// * `interval` - Number of MCUs between restart markers (0 writes nothing)
    pub fn write_dri(&mut self, interval: u16) {
        if interval == 0 {
            return;
        }
        self.emit_marker(JPEG_DRI);
        self.emit_2bytes(4);
        self.emit_2bytes(interval);
    }

    /// Write the single baseline SOS covering every component.
    pub fn write_sos(&mut self, components: &[ComponentInfo]) {
        self.emit_marker(JPEG_SOS);

        // Length: 2 (length) + 1 (Ns) + 2*Ns (component specs) + 3 (Ss, Se, Ah/Al)
        let ns = components.len() as u16;
        self.emit_2bytes(6 + 2 * ns);
        self.emit_byte(ns as u8);

        for comp in components {
            self.emit_byte(comp.component_id);
            // DC table in high nibble, AC table in low nibble
            self.emit_byte((comp.dc_tbl_no << 4) | comp.ac_tbl_no);
        }

        // Full spectrum, no successive approximation
        self.sink.put_bytes(&[0x00, 0x3F, 0x00]);
    }
}

/// Everything the header needs to describe a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameHeader<'a> {
    /// Image width
    pub width: u16,
    /// Image height
    pub height: u16,
    /// Frame components (1 or 3)
    pub components: &'a [ComponentInfo],
    /// Quantization tables
    pub tables: &'a EncoderTables,
    /// JFIF density
    pub density: PixelDensity,
    /// MCUs per restart interval (0 = none)
    pub restart_interval: u16,
}

/// Write SOI through SOS for a baseline frame.
pub fn write_headers(sink: &mut BitSink, header: &FrameHeader<'_>) {
    let is_color = header.components.len() > 1;
    let mut w = MarkerWriter::new(sink);

    w.write_soi();
    w.write_jfif_app0(&header.density);

    if is_color {
        w.write_dqt_multiple(&[
            (0, &header.tables.luma().wire),
            (1, &header.tables.chroma().wire),
        ]);
    } else {
        w.write_dqt_multiple(&[(0, &header.tables.luma().wire)]);
    }

    w.write_sof0(header.height, header.width, header.components);

    w.write_dht_multiple(&[(0, false, &HuffTable::DC_LUMA), (0, true, &HuffTable::AC_LUMA)]);
    if is_color {
        w.write_dht_multiple(&[
            (1, false, &HuffTable::DC_CHROMA),
            (1, true, &HuffTable::AC_CHROMA),
        ]);
    }

    w.write_dri(header.restart_interval);
    w.write_sos(header.components);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subsampling;

    fn sink() -> BitSink {
        BitSink::with_capacity(1024, false).unwrap()
    }

    #[test]
    fn test_write_soi_eoi() {
        let mut s = sink();
        let mut writer = MarkerWriter::new(&mut s);
        writer.write_soi();
        writer.write_eoi();
        assert_eq!(s.as_bytes(), &[0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_write_jfif_app0() {
        let mut s = sink();
        MarkerWriter::new(&mut s).write_jfif_app0(&PixelDensity::dpi(72, 300));
        assert_eq!(
            s.as_bytes(),
            &[
                0xFF, 0xE0, 0x00, 16, b'J', b'F', b'I', b'F', 0, 1, 1, 1, 0, 72, 0x01, 0x2C, 0, 0
            ]
        );
    }

    #[test]
    fn test_write_dqt() {
        let mut s = sink();
        let luma = [16u8; DCTSIZE2];
        let chroma = [17u8; DCTSIZE2];
        MarkerWriter::new(&mut s).write_dqt_multiple(&[(0, &luma), (1, &chroma)]);
        let out = s.as_bytes();
        assert_eq!(&out[..4], &[0xFF, 0xDB, 0x00, 132]);
        assert_eq!(out[4], 0x00);
        assert_eq!(out[5], 16);
        assert_eq!(out[4 + 65], 0x01);
        assert_eq!(out[4 + 66], 17);
        assert_eq!(out.len(), 2 + 132);
    }

    #[test]
    fn test_write_sof0() {
        let mut s = sink();
        let comps = ComponentInfo::for_frame(Subsampling::S420, true);
        MarkerWriter::new(&mut s).write_sof0(480, 640, &comps);
        assert_eq!(
            s.as_bytes(),
            &[
                0xFF, 0xC0, 0x00, 17, 8, 0x01, 0xE0, 0x02, 0x80, 3, //
                1, 0x22, 0, //
                2, 0x11, 1, //
                3, 0x11, 1
            ]
        );
    }

    #[test]
    fn test_write_dht() {
        let mut s = sink();
        MarkerWriter::new(&mut s)
            .write_dht_multiple(&[(0, false, &HuffTable::DC_LUMA), (0, true, &HuffTable::AC_LUMA)]);
        let out = s.as_bytes();
        // 2 + (17 + 12) + (17 + 162) = 210
        assert_eq!(&out[..4], &[0xFF, 0xC4, 0x00, 210]);
        assert_eq!(out[4], 0x00);
        assert_eq!(out[4 + 1 + 16 + 12], 0x10);
        assert_eq!(out.len(), 2 + 210);
    }

    #[test]
    fn test_write_dri() {
        let mut s = sink();
        let mut w = MarkerWriter::new(&mut s);
        w.write_dri(0);
        w.write_dri(0x0102);
        assert_eq!(s.as_bytes(), &[0xFF, 0xDD, 0x00, 0x04, 0x01, 0x02]);
    }

    #[test]
    fn test_write_sos() {
        let mut s = sink();
        let comps = ComponentInfo::for_frame(Subsampling::S444, true);
        MarkerWriter::new(&mut s).write_sos(&comps);
        assert_eq!(
            s.as_bytes(),
            &[0xFF, 0xDA, 0x00, 12, 3, 1, 0x00, 2, 0x11, 3, 0x11, 0x00, 0x3F, 0x00]
        );
    }

    #[test]
    fn test_headers_gray_layout() {
        let mut s = sink();
        let comps = ComponentInfo::for_frame(Subsampling::S444, false);
        let tables = EncoderTables::new(75);
        write_headers(
            &mut s,
            &FrameHeader {
                width: 8,
                height: 8,
                components: &comps,
                tables: &tables,
                density: PixelDensity::default(),
                restart_interval: 0,
            },
        );
        let out = s.as_bytes();
        // SOI 2 + APP0 18 + DQT 69 + SOF0 13 + DHT 212 + SOS 10
        assert_eq!(out.len(), 2 + 18 + 69 + 13 + 212 + 10);
        assert_eq!(&out[20..22], &[0xFF, 0xDB]);
        assert_eq!(&out[89..91], &[0xFF, 0xC0]);
        assert_eq!(&out[out.len() - 10..out.len() - 8], &[0xFF, 0xDA]);
    }

    #[test]
    fn test_header_overflow_latches() {
        let mut s = BitSink::with_capacity(10, false).unwrap();
        let comps = ComponentInfo::for_frame(Subsampling::S444, false);
        let tables = EncoderTables::default();
        write_headers(
            &mut s,
            &FrameHeader {
                width: 8,
                height: 8,
                components: &comps,
                tables: &tables,
                density: PixelDensity::default(),
                restart_interval: 0,
            },
        );
        assert!(s.overflowed());
        assert!(s.len() <= 10);
    }
}
