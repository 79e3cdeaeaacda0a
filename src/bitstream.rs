//! Bounded output sink for JPEG encoding.
//!
//! [`BitSink`] owns the destination buffer for the duration of an encode and
//! provides:
//! - 32-bit bit accumulation for entropy-coded data
//! - Automatic 0xFF byte stuffing (0xFF -> 0xFF 0x00)
//! - Raw byte writes for marker segments
//! - A capacity check before every write that either grows the buffer in
//!   fixed increments or latches an overflow flag
//!
//! Once the overflow flag is set every further write is dropped. The encoder
//! polls [`BitSink::status`] at MCU-row granularity and aborts on the first
//! failure, so no partially-written stream is ever reported as a success.

use log::{debug, warn};

use crate::error::{Error, Result};

/// Size of the bit accumulator in bits
const BIT_BUF_SIZE: u32 = 32;

/// Buffers grow in whole multiples of this many bytes.
pub const GROWTH_INCREMENT: usize = 4096;

/// Output sink with bit packing, byte stuffing and capacity management.
#[derive(Debug)]
pub struct BitSink {
    /// Output destination
    output: Vec<u8>,
    /// Logical capacity; writes beyond it need growth
    capacity: usize,
    /// Upper bound for growth (0 = unbounded)
    max_capacity: usize,
    /// Whether the buffer may be grown
    allow_growth: bool,
    /// Bit accumulation buffer (left-aligned)
    put_buffer: u32,
    /// Number of valid bits in the accumulator
    bit_count: u32,
    /// Latched once a write did not fit
    overflow: bool,
    /// Latched when growth was attempted but memory could not be obtained
    alloc_failed: bool,
}

impl BitSink {
    /// Wrap an existing buffer.
    ///
    /// The buffer is cleared; its current capacity becomes the sink's
    /// capacity. With `allow_growth == false` that capacity is a hard bound.
    pub fn new(mut output: Vec<u8>, allow_growth: bool) -> Self {
        output.clear();
        let capacity = output.capacity();
        Self {
            output,
            capacity,
            max_capacity: 0,
            allow_growth,
            put_buffer: 0,
            bit_count: 0,
            overflow: false,
            alloc_failed: false,
        }
    }

    /// Allocate a fresh buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize, allow_growth: bool) -> Result<Self> {
        let mut output = Vec::new();
        output.try_reserve_exact(capacity)?;
        let mut sink = Self::new(output, allow_growth);
        sink.capacity = capacity;
        Ok(sink)
    }

    /// Bound how far the buffer may grow (0 = unbounded).
    pub fn max_capacity(mut self, limit: usize) -> Self {
        self.max_capacity = limit;
        self
    }

    /// Make sure `additional` more bytes fit, growing the buffer if allowed.
    ///
    /// Returns false (and latches the overflow flag) if they do not.
    #[inline]
    pub fn check_highwater(&mut self, additional: usize) -> bool {
        if self.overflow {
            return false;
        }
        match self.output.len().checked_add(additional) {
            Some(needed) if needed <= self.capacity => true,
            Some(needed) => self.grow(needed),
            None => {
                self.alloc_failed = true;
                self.overflow = true;
                false
            }
        }
    }

    /// Grow ahead of a burst of writes without latching overflow.
    ///
    /// Fixed buffers are left alone, and growth stops at `max_capacity`;
    /// the per-byte checks still catch a write that really does not fit.
    pub fn reserve_ahead(&mut self, additional: usize) {
        if !self.allow_growth || self.overflow {
            return;
        }
        let mut needed = self.output.len().saturating_add(additional);
        if self.max_capacity != 0 {
            needed = needed.min(self.max_capacity);
        }
        if needed > self.capacity {
            self.grow(needed);
        }
    }

    #[cold]
    fn grow(&mut self, needed: usize) -> bool {
        if !self.allow_growth {
            warn!(
                "output buffer full: {} bytes needed, capacity {}",
                needed, self.capacity
            );
            self.overflow = true;
            return false;
        }

        let shortfall = needed - self.capacity;
        let steps = (shortfall + GROWTH_INCREMENT - 1) / GROWTH_INCREMENT;
        let mut new_capacity = self.capacity.saturating_add(steps * GROWTH_INCREMENT);
        if self.max_capacity != 0 && new_capacity > self.max_capacity {
            if needed > self.max_capacity {
                warn!(
                    "output buffer growth to {} bytes exceeds limit {}",
                    needed, self.max_capacity
                );
                self.alloc_failed = true;
                self.overflow = true;
                return false;
            }
            new_capacity = self.max_capacity;
        }

        let additional = new_capacity - self.output.len();
        if self.output.try_reserve_exact(additional).is_err() {
            warn!("failed to grow output buffer to {} bytes", new_capacity);
            self.alloc_failed = true;
            self.overflow = true;
            return false;
        }

        debug!(
            "grew output buffer from {} to {} bytes",
            self.capacity, new_capacity
        );
        self.capacity = new_capacity;
        true
    }

    /// Emit one entropy-coded byte, stuffing 0x00 after 0xFF.
    #[inline]
    fn emit_byte_stuffed(&mut self, byte: u8) {
        if byte == 0xFF {
            if self.check_highwater(2) {
                self.output.push(0xFF);
                self.output.push(0x00);
            }
        } else if self.check_highwater(1) {
            self.output.push(byte);
        }
    }

    /// Write bits to the entropy-coded stream.
    ///
    /// # Arguments
    /// * `code` - The bits to write (right-aligned)
    /// * `size` - Number of bits to write (0-16)
    #[inline]
    pub fn write_bits(&mut self, code: u32, size: u8) {
        debug_assert!(size <= 16, "Size must be <= 16 bits");
        debug_assert!(
            size == 0 || code < (1u32 << size),
            "Code exceeds size bits"
        );

        if size == 0 || self.overflow {
            return;
        }

        self.bit_count += size as u32;
        self.put_buffer |= code << (BIT_BUF_SIZE - self.bit_count);

        while self.bit_count >= 8 {
            let byte = (self.put_buffer >> 24) as u8;
            self.emit_byte_stuffed(byte);
            self.put_buffer <<= 8;
            self.bit_count -= 8;
        }
    }

    /// Pad the pending bits with 1s up to the next byte boundary.
    ///
    /// Used before restart markers, where the scan has to be byte aligned.
    pub fn pad_to_byte(&mut self) {
        if self.bit_count > 0 {
            let padding = (8 - self.bit_count) as u8;
            self.write_bits((1u32 << padding) - 1, padding);
        }
    }

    /// Terminate the entropy-coded segment.
    ///
    /// Writes seven 1-bits, which pushes out any partial byte padded with 1s,
    /// then discards whatever remains in the accumulator.
    pub fn end_scan(&mut self) {
        self.write_bits(0x7F, 7);
        self.put_buffer = 0;
        self.bit_count = 0;
    }

    /// Write a raw byte (not stuffed).
    #[inline]
    pub fn put_byte(&mut self, byte: u8) {
        debug_assert!(self.bit_count == 0, "Bits pending before raw write");
        if self.check_highwater(1) {
            self.output.push(byte);
        }
    }

    /// Write a big-endian 16-bit value (not stuffed).
    #[inline]
    pub fn put_u16(&mut self, value: u16) {
        self.put_bytes(&value.to_be_bytes());
    }

    /// Write raw bytes (not stuffed).
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(self.bit_count == 0, "Bits pending before raw write");
        if self.check_highwater(bytes.len()) {
            self.output.extend_from_slice(bytes);
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// Check if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Current logical capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once a write has been dropped.
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    /// Ok while every write so far has been stored.
    pub fn status(&self) -> Result<()> {
        if self.alloc_failed {
            Err(Error::AllocationFailed)
        } else if self.overflow {
            Err(Error::BufferOverflow {
                capacity: self.capacity,
            })
        } else {
            Ok(())
        }
    }

    /// Get a reference to the bytes written so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Consume the sink and return the buffer, whatever its state.
    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    /// Consume the sink, returning the buffer only if nothing overflowed.
    pub fn finish(self) -> Result<Vec<u8>> {
        self.status()?;
        Ok(self.output)
    }
}
