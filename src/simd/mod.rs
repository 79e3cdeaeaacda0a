//! Runtime dispatch for the block transform.
//!
//! CPU capabilities are detected once and the chosen implementations are
//! stored as function pointers, so there is no per-block dispatch cost.
//!
//! 1. **Scalar reference**: [`SimdOps::scalar`] uses the plain DCT and is the
//!    baseline every other variant must match exactly.
//!
//! 2. **Autovectorized**: [`SimdOps::detect`] uses the `multiversion` build of
//!    the same DCT, which picks AVX2/SSE4.1/NEON codegen at runtime.

use crate::dct;
use crate::types::{CoeffBlock, FloatBlock};

/// Function pointer type for the in-place forward DCT.
pub type ForwardDctFn = fn(&mut FloatBlock);

/// Function pointer type for quantize + zig-zag.
///
/// Signature: (coeffs, recip, output) -> last non-zero zig-zag index.
pub type QuantizeFn = fn(&FloatBlock, &FloatBlock, &mut CoeffBlock) -> usize;

/// Transform dispatch table. Create once and reuse.
#[derive(Clone, Copy)]
pub struct SimdOps {
    /// Forward DCT function
    pub forward_dct: ForwardDctFn,
    /// Quantization function
    pub quantize: QuantizeFn,
    variant: &'static str,
}

impl SimdOps {
    /// Select the best available implementations for the current CPU.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            forward_dct: dct::forward_dct_8x8_multiversion,
            quantize: dct::quantize_block,
            variant: "multiversion",
        }
    }

    /// Get the scalar reference implementations.
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            forward_dct: dct::forward_dct_8x8,
            quantize: dct::quantize_block,
            variant: "scalar",
        }
    }

    /// Transform one block of widened samples and quantize it into `output`.
    ///
    /// `data` is used as scratch and holds the unquantized coefficients afterwards.
    #[inline]
    pub fn transform(
        &self,
        data: &mut FloatBlock,
        recip: &FloatBlock,
        output: &mut CoeffBlock,
    ) -> usize {
        (self.forward_dct)(data);
        (self.quantize)(data, recip, output)
    }
}

impl Default for SimdOps {
    fn default() -> Self {
        Self::detect()
    }
}

impl std::fmt::Debug for SimdOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Fn pointers would print as addresses
        f.debug_struct("SimdOps")
            .field("variant", &self.variant)
            .finish()
    }
}
