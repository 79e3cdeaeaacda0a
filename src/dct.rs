//! Forward DCT (Discrete Cosine Transform) and quantization.
//!
//! This implements the Arai-Agui-Nakajima scaled DCT in single precision:
//! 5 multiplies and 29 adds per 1-D pass, rows first then columns. The AAN
//! output is scaled per coefficient by `aan[row] * aan[col] * 8`; that factor
//! is folded into the reciprocal quantization table (see [`crate::quant`]), so
//! quantization is one multiply per coefficient.
//!
//! Two entry points compute identical results:
//! - [`forward_dct_8x8`] is the scalar reference.
//! - [`forward_dct_8x8_multiversion`] is the same code compiled for several
//!   targets via `multiversion`, with runtime selection.
//!
//! Reference: Y. Arai, T. Agui and M. Nakajima, "A fast DCT-SQ scheme for
//! images", Trans. IEICE E-71(11):1095, and figure 4-8 of Pennebaker & Mitchell.

use crate::consts::{DCTSIZE, DCTSIZE2, JPEG_ZIGZAG_ORDER};
use crate::types::{CoeffBlock, FloatBlock, SampleBlock};
use multiversion::multiversion;

const C4: f32 = 0.707_106_78; // cos(4*pi/16)
const C6: f32 = 0.382_683_43; // cos(6*pi/16)
const C2_MINUS_C6: f32 = 0.541_196_1;
const C2_PLUS_C6: f32 = 1.306_563;

/// One 1-D AAN pass over eight values `stride` apart starting at `base`.
#[inline(always)]
fn aan_1d(data: &mut FloatBlock, base: usize, stride: usize) {
    let at = |k: usize| base + k * stride;

    let tmp0 = data[at(0)] + data[at(7)];
    let tmp7 = data[at(0)] - data[at(7)];
    let tmp1 = data[at(1)] + data[at(6)];
    let tmp6 = data[at(1)] - data[at(6)];
    let tmp2 = data[at(2)] + data[at(5)];
    let tmp5 = data[at(2)] - data[at(5)];
    let tmp3 = data[at(3)] + data[at(4)];
    let tmp4 = data[at(3)] - data[at(4)];

    // Even part
    let tmp10 = tmp0 + tmp3;
    let tmp13 = tmp0 - tmp3;
    let tmp11 = tmp1 + tmp2;
    let tmp12 = tmp1 - tmp2;

    data[at(0)] = tmp10 + tmp11;
    data[at(4)] = tmp10 - tmp11;

    let z1 = (tmp12 + tmp13) * C4;
    data[at(2)] = tmp13 + z1;
    data[at(6)] = tmp13 - z1;

    // Odd part
    let tmp10 = tmp4 + tmp5;
    let tmp11 = tmp5 + tmp6;
    let tmp12 = tmp6 + tmp7;

    // Rotator arranged to avoid extra negations
    let z5 = (tmp10 - tmp12) * C6;
    let z2 = C2_MINUS_C6 * tmp10 + z5;
    let z4 = C2_PLUS_C6 * tmp12 + z5;
    let z3 = tmp11 * C4;

    let z11 = tmp7 + z3;
    let z13 = tmp7 - z3;

    data[at(5)] = z13 + z2;
    data[at(3)] = z13 - z2;
    data[at(1)] = z11 + z4;
    data[at(7)] = z11 - z4;
}

/// Perform the scaled forward DCT in place on one 8x8 block.
///
/// Input: 64 centered samples in row-major order.
/// Output: 64 AAN-scaled coefficients in row-major order.
pub fn forward_dct_8x8(data: &mut FloatBlock) {
    for row in 0..DCTSIZE {
        aan_1d(data, row * DCTSIZE, 1);
    }
    for col in 0..DCTSIZE {
        aan_1d(data, col, DCTSIZE);
    }
}

/// [`forward_dct_8x8`] compiled for multiple targets.
///
/// No fused multiply-add is introduced, so results match the scalar
/// reference bit for bit.
#[multiversion(targets(
    "x86_64+avx2",
    "x86_64+sse4.1",
    "x86+avx2",
    "x86+sse4.1",
    "aarch64+neon",
))]
pub fn forward_dct_8x8_multiversion(data: &mut FloatBlock) {
    for row in 0..DCTSIZE {
        aan_1d(data, row * DCTSIZE, 1);
    }
    for col in 0..DCTSIZE {
        aan_1d(data, col, DCTSIZE);
    }
}

/// Widen a sample block for the DCT.
#[inline]
pub fn load_samples(samples: &SampleBlock, data: &mut FloatBlock) {
    for (dst, &s) in data.iter_mut().zip(samples.iter()) {
        *dst = s as f32;
    }
}

/// Quantize AAN-scaled coefficients and reorder them to zig-zag.
///
/// Each coefficient is multiplied by its reciprocal and rounded to nearest
/// (`floor(v + 0.5)`).
///
/// # Returns
/// Zig-zag index of the last non-zero AC coefficient, or 0 if all AC
/// coefficients are zero.
pub fn quantize_block(
    coeffs: &FloatBlock,
    recip: &FloatBlock,
    output: &mut CoeffBlock,
) -> usize {
    let mut last_nonzero = 0usize;
    for i in 0..DCTSIZE2 {
        let q = (coeffs[i] * recip[i] + 0.5).floor() as i16;
        let zz = JPEG_ZIGZAG_ORDER[i];
        output[zz] = q;
        if q != 0 && zz > last_nonzero {
            last_nonzero = zz;
        }
    }
    last_nonzero
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::AAN_SCALE_FACTORS;

    /// Textbook DCT-II, scaled by 8 like the AAN output before de-scaling.
    fn reference_dct(input: &FloatBlock) -> [f64; DCTSIZE2] {
        let mut out = [0.0f64; DCTSIZE2];
        let pi = std::f64::consts::PI;
        for v in 0..8 {
            for u in 0..8 {
                let cu = if u == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
                let cv = if v == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
                let mut sum = 0.0;
                for y in 0..8 {
                    for x in 0..8 {
                        sum += input[y * 8 + x] as f64
                            * (((2 * x + 1) as f64 * u as f64 * pi) / 16.0).cos()
                            * (((2 * y + 1) as f64 * v as f64 * pi) / 16.0).cos();
                    }
                }
                out[v * 8 + u] = 0.25 * cu * cv * sum;
            }
        }
        out
    }

    #[test]
    fn test_dc_coefficient() {
        // A flat block gives DC = 64 * value before AAN de-scaling
        let mut data = [100.0f32; DCTSIZE2];
        forward_dct_8x8(&mut data);
        assert!((data[0] - 6400.0).abs() < 0.01, "DC = {}", data[0]);
        for i in 1..DCTSIZE2 {
            assert!(data[i].abs() < 0.01, "AC[{}] = {}", i, data[i]);
        }
    }

    #[test]
    fn test_zero_block() {
        let mut data = [0.0f32; DCTSIZE2];
        forward_dct_8x8(&mut data);
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_matches_textbook_dct() {
        let mut input = [0.0f32; DCTSIZE2];
        for (i, v) in input.iter_mut().enumerate() {
            *v = ((i * 37 + 11) % 256) as f32 - 128.0;
        }
        let expected = reference_dct(&input);

        let mut data = input;
        forward_dct_8x8(&mut data);
        for i in 0..DCTSIZE2 {
            let scale = AAN_SCALE_FACTORS[i / 8] as f64 * AAN_SCALE_FACTORS[i % 8] as f64 * 8.0;
            let descaled = data[i] as f64 / scale;
            assert!(
                (descaled - expected[i]).abs() < 0.05,
                "coef {}: {} vs {}",
                i,
                descaled,
                expected[i]
            );
        }
    }

    #[test]
    fn test_multiversion_matches_scalar() {
        let mut seed = 12345u32;
        for _ in 0..50 {
            let mut a = [0.0f32; DCTSIZE2];
            for v in a.iter_mut() {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                *v = ((seed >> 16) % 256) as f32 - 128.0;
            }
            let mut b = a;
            forward_dct_8x8(&mut a);
            forward_dct_8x8_multiversion(&mut b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_alternating_rows() {
        let mut data = [0.0f32; DCTSIZE2];
        for row in 0..DCTSIZE {
            let val = if row % 2 == 0 { 100.0 } else { -100.0 };
            for col in 0..DCTSIZE {
                data[row * DCTSIZE + col] = val;
            }
        }
        forward_dct_8x8(&mut data);
        assert!(data[0].abs() < 0.01);
        // Energy only in column 0
        assert!(data[7 * DCTSIZE].abs() > 50.0);
        for row in 0..DCTSIZE {
            for col in 1..DCTSIZE {
                assert!(data[row * DCTSIZE + col].abs() < 0.01);
            }
        }
    }

    #[test]
    fn test_quantize_rounding_and_order() {
        let mut coeffs = [0.0f32; DCTSIZE2];
        let recip = [1.0f32; DCTSIZE2];
        coeffs[0] = 2.5; // floor(3.0) = 3
        coeffs[1] = -2.5; // floor(-2.0) = -2
        coeffs[8] = -0.6; // floor(-0.1) = -1
        let mut out = [0i16; DCTSIZE2];
        let last = quantize_block(&coeffs, &recip, &mut out);
        assert_eq!(out[0], 3);
        assert_eq!(out[1], -2); // natural 1 -> zig-zag 1
        assert_eq!(out[2], -1); // natural 8 -> zig-zag 2
        assert_eq!(last, 2);
    }

    #[test]
    fn test_quantize_dc_only() {
        let mut coeffs = [0.0f32; DCTSIZE2];
        coeffs[0] = 800.0;
        let recip = [1.0 / 8.0; DCTSIZE2];
        let mut out = [7i16; DCTSIZE2];
        assert_eq!(quantize_block(&coeffs, &recip, &mut out), 0);
        assert_eq!(out[0], 100);
        assert!(out[1..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_quantize_last_position() {
        let mut coeffs = [0.0f32; DCTSIZE2];
        coeffs[63] = 10.0;
        let mut out = [0i16; DCTSIZE2];
        assert_eq!(quantize_block(&coeffs, &[1.0; DCTSIZE2], &mut out), 63);
        assert_eq!(out[63], 10);
    }

    #[test]
    fn test_load_samples() {
        let mut samples = [0i8; DCTSIZE2];
        samples[0] = -128;
        samples[63] = 127;
        let mut data = [1.0f32; DCTSIZE2];
        load_samples(&samples, &mut data);
        assert_eq!(data[0], -128.0);
        assert_eq!(data[1], 0.0);
        assert_eq!(data[63], 127.0);
    }
}
