//! Structural checks on finished JPEG streams.
//!
//! [`validate`] walks marker segments from SOI up to the first SOS and
//! accepts only baseline Huffman frames; it does not decode entropy data.
//! [`clean_trailing_bytes`] finds where the stream really ends when a buffer
//! carries garbage after EOI (sector padding, stale bytes from a reused
//! buffer).

use crate::consts::{JPEG_DAC, JPEG_EOI, JPEG_RST0, JPEG_SOF0, JPEG_SOI, JPEG_SOS, JPEG_TEM};
use crate::error::{Error, Result};

fn invalid(reason: &'static str) -> Error {
    Error::InvalidStream { reason }
}

/// Markers with no length field.
#[inline]
fn is_standalone(marker: u8) -> bool {
    marker == JPEG_TEM || (JPEG_RST0..=JPEG_EOI).contains(&marker)
}

/// Start-of-frame markers other than SOF0 (C4 is DHT, C8 is reserved, CC is DAC).
#[inline]
fn is_unsupported_sof(marker: u8) -> bool {
    matches!(marker, 0xC1..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
}

/// Check that `buf` is a baseline JPEG up to its first scan.
///
/// Requirements:
/// - starts with SOI
/// - every segment before SOS has a length >= 2 that fits the buffer
/// - the frame is SOF0; progressive, lossless, extended and arithmetic
///   frames (and DAC) are rejected
/// - an SOS is reached after the SOF0
///
/// This is stricter than a plain marker walk: an EOI before the first SOS,
/// or an SOS with no preceding SOF0, is rejected even though every segment
/// is well formed.
pub fn validate(buf: &[u8]) -> Result<()> {
    if buf.len() < 2 || buf[0] != 0xFF || buf[1] != JPEG_SOI {
        return Err(invalid("missing SOI"));
    }

    let mut pos = 2usize;
    let mut seen_sof0 = false;

    loop {
        if pos >= buf.len() {
            return Err(invalid("truncated before SOS"));
        }
        if buf[pos] != 0xFF {
            return Err(invalid("expected marker"));
        }
        // Any number of 0xFF fill bytes may precede a marker code
        while pos < buf.len() && buf[pos] == 0xFF {
            pos += 1;
        }
        let Some(&marker) = buf.get(pos) else {
            return Err(invalid("truncated before SOS"));
        };
        pos += 1;

        if is_standalone(marker) {
            if marker == JPEG_EOI {
                return Err(invalid("EOI before SOS"));
            }
            continue;
        }
        if marker == 0x00 {
            return Err(invalid("stuffed byte outside scan"));
        }
        if is_unsupported_sof(marker) {
            return Err(invalid("not a baseline frame"));
        }
        if marker == JPEG_DAC {
            return Err(invalid("arithmetic coding"));
        }
        if marker == JPEG_SOS {
            return if seen_sof0 {
                Ok(())
            } else {
                Err(invalid("SOS without SOF0"))
            };
        }
        if marker == JPEG_SOF0 {
            seen_sof0 = true;
        }

        if pos + 2 > buf.len() {
            return Err(invalid("truncated segment length"));
        }
        let len = u16::from_be_bytes([buf[pos], buf[pos + 1]]) as usize;
        if len < 2 {
            return Err(invalid("segment length below 2"));
        }
        if pos + len > buf.len() {
            return Err(invalid("segment overruns buffer"));
        }
        pos += len;
    }
}

/// Returns true if [`validate`] accepts `buf`.
pub fn is_valid(buf: &[u8]) -> bool {
    validate(buf).is_ok()
}

/// Length of `buf` up to and including its last EOI marker.
///
/// A buffer without an EOI is left at its full length.
pub fn clean_trailing_bytes(buf: &[u8]) -> usize {
    buf.windows(2)
        .rposition(|w| w[0] == 0xFF && w[1] == JPEG_EOI)
        .map_or(buf.len(), |i| i + 2)
}
