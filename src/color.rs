//! Color space conversion routines.
//!
//! RGB to YCbCr follows CCIR 601-1 (BT.601) in 8-bit fixed point, producing
//! samples already centered on zero for the DCT:
//! ```text
//! Y  = ((  77 R + 150 G +  29 B + 128) >> 8) - 128
//! Cb =  ( -43 R -  85 G + 128 B + 128) >> 8
//! Cr =  ( 128 R - 107 G -  21 B + 128) >> 8
//! ```
//! Each result is clamped to -128..=127. Shifts are arithmetic (floor).

/// Fixed-point precision bits
const SCALEBITS: i32 = 8;

/// Half unit for rounding during right shift
const ONE_HALF: i32 = 1 << (SCALEBITS - 1);

// 0.299, 0.587, 0.114 scaled by 256
const Y_R: i32 = 77;
const Y_G: i32 = 150;
const Y_B: i32 = 29;
// -0.16874, -0.33126, 0.5
const CB_R: i32 = -43;
const CB_G: i32 = -85;
const CB_B: i32 = 128;
// 0.5, -0.41869, -0.08131
const CR_R: i32 = 128;
const CR_G: i32 = -107;
const CR_B: i32 = -21;

#[inline]
fn clamp_i8(v: i32) -> i8 {
    v.clamp(-128, 127) as i8
}

/// Center an unsigned 8-bit sample on zero.
#[inline]
pub fn center(v: u8) -> i8 {
    (v as i16 - 128) as i8
}

/// Convert a single RGB pixel to centered YCbCr.
#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (i8, i8, i8) {
    let r = r as i32;
    let g = g as i32;
    let b = b as i32;

    let y = ((Y_R * r + Y_G * g + Y_B * b + ONE_HALF) >> SCALEBITS) - 128;
    let cb = (CB_R * r + CB_G * g + CB_B * b + ONE_HALF) >> SCALEBITS;
    let cr = (CR_R * r + CR_G * g + CR_B * b + ONE_HALF) >> SCALEBITS;

    (clamp_i8(y), clamp_i8(cb), clamp_i8(cr))
}

/// Expand a little-endian RGB565 pixel to 8 bits per channel by bit replication.
#[inline]
pub fn rgb565_to_rgb(lo: u8, hi: u8) -> (u8, u8, u8) {
    let v = u16::from_le_bytes([lo, hi]);
    let r5 = ((v >> 11) & 0x1F) as u8;
    let g6 = ((v >> 5) & 0x3F) as u8;
    let b5 = (v & 0x1F) as u8;
    ((r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_ycbcr_black() {
        assert_eq!(rgb_to_ycbcr(0, 0, 0), (-128, 0, 0));
    }

    #[test]
    fn test_rgb_to_ycbcr_white() {
        assert_eq!(rgb_to_ycbcr(255, 255, 255), (127, 0, 0));
    }

    #[test]
    fn test_rgb_to_ycbcr_gray() {
        assert_eq!(rgb_to_ycbcr(128, 128, 128), (0, 0, 0));
    }

    #[test]
    fn test_rgb_to_ycbcr_primaries() {
        // Red: Cr saturates at the top of the i8 range
        assert_eq!(rgb_to_ycbcr(255, 0, 0), (-51, -43, 127));
        assert_eq!(rgb_to_ycbcr(0, 255, 0), (21, -85, -107));
        assert_eq!(rgb_to_ycbcr(0, 0, 255), (-99, 127, -21));
    }

    #[test]
    fn test_rgb565_expansion() {
        assert_eq!(rgb565_to_rgb(0xFF, 0xFF), (255, 255, 255));
        assert_eq!(rgb565_to_rgb(0x00, 0x00), (0, 0, 0));
        assert_eq!(rgb565_to_rgb(0x00, 0xF8), (255, 0, 0));
        assert_eq!(rgb565_to_rgb(0xE0, 0x07), (0, 255, 0));
        assert_eq!(rgb565_to_rgb(0x1F, 0x00), (0, 0, 255));
        // 0b10000 -> 0b10000100
        assert_eq!(rgb565_to_rgb(0x10, 0x00), (0, 0, 0x84));
    }

    #[test]
    fn test_center() {
        assert_eq!(center(0), -128);
        assert_eq!(center(128), 0);
        assert_eq!(center(255), 127);
    }
}
