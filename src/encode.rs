//! Encoder API and the MCU orchestration loop.
//!
//! The encoder walks the frame in MCU raster order. For every MCU it extracts
//! the 8x8 tiles it covers, transforms and entropy codes each luma block, then
//! folds the chroma of those tiles into a single Cb and a single Cr block.
//!
//! # Example
//!
//! ```no_run
//! use camjpeg::{Encoder, PixelFormat, SourceImage, Subsampling};
//!
//! let pixels = vec![128u8; 640 * 480 * 2];
//! let image = SourceImage::new(&pixels, 640, 480, PixelFormat::Yuv422);
//!
//! let mut encoder = Encoder::new()
//!     .quality(85)
//!     .subsampling(Subsampling::S422);
//! let jpeg = encoder.compress(&image)?;
//! # Ok::<(), camjpeg::Error>(())
//! ```

use std::io::Write;
use std::sync::Arc;

use log::{debug, warn};

use crate::bitstream::{BitSink, GROWTH_INCREMENT};
use crate::consts::{DCTSIZE, DCTSIZE2};
use crate::dct::load_samples;
use crate::debayer::{BilinearDemosaic, Demosaic};
use crate::entropy::EntropyEncoder;
use crate::error::{Error, Result};
use crate::huffman::{standard_tables, DerivedTable, StandardTables};
use crate::marker::{write_headers, FrameHeader, MarkerWriter};
use crate::quant::EncoderTables;
use crate::sample::{average_2x2, average_h, average_v, Extractor, TileSamples};
use crate::simd::SimdOps;
use crate::types::{
    ComponentInfo, CoeffBlock, EncodeSummary, FloatBlock, Limits, PixelDensity, SampleBlock,
    SourceImage, Subsampling,
};

/// Upper bound on marker bytes (SOI through SOS, plus EOI) for any frame.
const HEADER_BYTES: usize = 1024;

/// Worst-case entropy-coded size of one block, stuffing included.
///
/// DC: 11-bit chroma code + 11 magnitude bits. AC: 63 x (16-bit code +
/// 10 magnitude bits). Every byte may be doubled by stuffing.
const MAX_BLOCK_BYTES: usize = 2 * ((22 + 63 * 26 + 7) / 8);

/// Encode settings shared by [`Encoder`] and the free [`compress`].
#[derive(Debug, Clone, Copy)]
struct Settings {
    /// Chroma subsampling mode
    subsampling: Subsampling,
    /// Grow the destination when it fills up instead of failing
    allow_growth: bool,
    /// Destination size to allocate up front (0 = derive from geometry)
    initial_capacity: usize,
    /// MCUs per restart interval (0 = none)
    restart_interval: u16,
    /// JFIF density written to APP0
    pixel_density: PixelDensity,
    /// Resource limits
    limits: Limits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            subsampling: Subsampling::Auto,
            allow_growth: true,
            initial_capacity: 0,
            restart_interval: 0,
            pixel_density: PixelDensity::default(),
            limits: Limits::default(),
        }
    }
}

/// Baseline JPEG encoder for raw camera frames.
///
/// Create with [`Encoder::new`], configure with the builder methods and call
/// [`compress`](Encoder::compress) or [`compress_into`](Encoder::compress_into)
/// as often as needed. Quantization tables are cached in the encoder and only
/// rebuilt when the quality changes.
#[derive(Debug, Clone)]
pub struct Encoder {
    /// Quality level (1-100)
    quality: u8,
    settings: Settings,
    /// Transform dispatch
    simd: SimdOps,
    /// Demosaicer for Bayer sources
    demosaic: Arc<dyn Demosaic>,
    /// Cached quantization tables
    tables: EncoderTables,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Create an encoder with default settings.
    ///
    /// Quality 75, automatic subsampling, growable output, no restart markers.
    pub fn new() -> Self {
        Self {
            quality: 75,
            settings: Settings::default(),
            simd: SimdOps::detect(),
            demosaic: Arc::new(BilinearDemosaic),
            tables: EncoderTables::default(),
        }
    }

    /// Set quality level (1-100, clamped).
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Set chroma subsampling mode.
    ///
    /// Ignored for single-component sources, which are always coded 1x1.
    pub fn subsampling(mut self, mode: Subsampling) -> Self {
        self.settings.subsampling = mode;
        self
    }

    /// Allow the destination to grow in fixed increments.
    ///
    /// With growth disabled the destination's capacity is a hard bound and
    /// running out of it fails with [`Error::BufferOverflow`].
    pub fn allow_growth(mut self, allow: bool) -> Self {
        self.settings.allow_growth = allow;
        self
    }

    /// Size of the destination allocated when the caller supplies none.
    ///
    /// 0 picks a size from the frame geometry: a typical compressed size when
    /// growth is allowed, [`estimate_capacity`](Self::estimate_capacity)
    /// otherwise.
    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.settings.initial_capacity = bytes;
        self
    }

    /// Set restart interval in MCUs (0 = disabled).
    pub fn restart_interval(mut self, interval: u16) -> Self {
        self.settings.restart_interval = interval;
        self
    }

    /// Set the pixel density written to the JFIF header.
    ///
    /// # Example
    /// ```no_run
    /// use camjpeg::{Encoder, PixelDensity};
    ///
    /// let encoder = Encoder::new().pixel_density(PixelDensity::dpi(300, 300));
    /// ```
    pub fn pixel_density(mut self, density: PixelDensity) -> Self {
        self.settings.pixel_density = density;
        self
    }

    /// Set resource limits.
    ///
    /// `max_alloc_bytes` also bounds how far the destination may grow.
    pub fn limits(mut self, limits: Limits) -> Self {
        self.settings.limits = limits;
        self
    }

    /// Use a custom demosaicer for Bayer sources.
    pub fn demosaic(mut self, demosaic: Arc<dyn Demosaic>) -> Self {
        self.demosaic = demosaic;
        self
    }

    /// Force the scalar transform instead of the runtime-detected one.
    pub fn force_scalar(mut self, force: bool) -> Self {
        self.simd = if force {
            SimdOps::scalar()
        } else {
            SimdOps::detect()
        };
        self
    }

    /// Destination size that always holds the encoded frame.
    ///
    /// The bound covers every subsampling mode, quality and restart setting,
    /// so it is safe for fixed-buffer encoding.
    pub fn estimate_capacity(width: u32, height: u32) -> usize {
        // Padding to 16x16 covers the largest MCU; 3 blocks per 8x8 tile
        // covers every mode.
        let areas_x = (width as usize + 15) / 16;
        let areas_y = (height as usize + 15) / 16;
        let tiles = areas_x.saturating_mul(areas_y).saturating_mul(4);
        tiles
            .saturating_mul(3 * MAX_BLOCK_BYTES + 4)
            .saturating_add(HEADER_BYTES)
    }

    /// Encode a frame into a newly allocated buffer.
    pub fn compress(&mut self, image: &SourceImage<'_>) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.compress_into(image, &mut output)?;
        Ok(output)
    }

    /// Encode a frame into `output`, reusing its allocation.
    ///
    /// `output` is cleared first. Its capacity is the initial destination
    /// size; an empty, unallocated `Vec` gets one sized as for
    /// [`compress`](Self::compress). On error `output` is left empty but keeps
    /// whatever it grew to.
    pub fn compress_into(
        &mut self,
        image: &SourceImage<'_>,
        output: &mut Vec<u8>,
    ) -> Result<EncodeSummary> {
        self.tables.rebuild_if_needed(self.quality);
        let frame = FrameEncoder {
            settings: &self.settings,
            simd: &self.simd,
            demosaic: self.demosaic.as_ref(),
            huffman: standard_tables(),
        };
        let buffer = std::mem::take(output);
        let (buffer, result) = frame.encode(image, buffer, &self.tables);
        *output = buffer;
        result
    }

    /// Encode a frame and write the stream to `output`.
    pub fn compress_to_writer<W: Write>(
        &mut self,
        image: &SourceImage<'_>,
        mut output: W,
    ) -> Result<EncodeSummary> {
        let mut buffer = Vec::new();
        let summary = self.compress_into(image, &mut buffer)?;
        output.write_all(&buffer)?;
        output.flush()?;
        Ok(summary)
    }
}

/// One encode call: settings and collaborators borrowed from the caller.
struct FrameEncoder<'a> {
    settings: &'a Settings,
    simd: &'a SimdOps,
    demosaic: &'a dyn Demosaic,
    huffman: &'static StandardTables,
}

impl FrameEncoder<'_> {
    /// Destination size to allocate when the caller gave none.
    fn initial_capacity_for(&self, image: &SourceImage<'_>) -> usize {
        let settings = self.settings;
        let capacity = if image.format.is_compressed() {
            image.data.len()
        } else if settings.initial_capacity != 0 {
            settings.initial_capacity
        } else if settings.allow_growth {
            // About 2 bits per pixel, rounded to whole growth steps
            let pixels = image.width as usize * image.height as usize;
            let guess = HEADER_BYTES + pixels / 4;
            (guess + GROWTH_INCREMENT - 1) / GROWTH_INCREMENT * GROWTH_INCREMENT
        } else {
            Encoder::estimate_capacity(image.width, image.height)
        };
        match settings.limits.max_alloc_bytes {
            0 => capacity,
            limit => capacity.min(limit),
        }
    }

    /// Run one encode, handing the buffer back whatever happens.
    ///
    /// The buffer is cleared before anything else, so on error it is empty and
    /// partial output is never mistaken for a stream.
    fn encode(
        &self,
        image: &SourceImage<'_>,
        mut buffer: Vec<u8>,
        tables: &EncoderTables,
    ) -> (Vec<u8>, Result<EncodeSummary>) {
        buffer.clear();
        if let Err(e) = image.check(&self.settings.limits) {
            return (buffer, Err(e));
        }

        if buffer.capacity() == 0 {
            let capacity = self.initial_capacity_for(image);
            if let Err(e) = buffer.try_reserve_exact(capacity) {
                warn!("could not allocate {} byte destination", capacity);
                return (buffer, Err(e.into()));
            }
        }

        let mut sink = BitSink::new(buffer, self.settings.allow_growth)
            .max_capacity(self.settings.limits.max_alloc_bytes);
        let result = if image.format.is_compressed() {
            copy_compressed(image, &mut sink)
        } else {
            self.encode_frame(image, &mut sink, tables)
        };

        let mut buffer = sink.into_bytes();
        if result.is_err() {
            buffer.clear();
        }
        (buffer, result)
    }

    /// Headers, scan and EOI for an uncompressed frame.
    fn encode_frame(
        &self,
        image: &SourceImage<'_>,
        sink: &mut BitSink,
        tables: &EncoderTables,
    ) -> Result<EncodeSummary> {
        let is_color = image.format.is_color();
        let subsampling = self.settings.subsampling.resolve(tables.quality(), is_color);
        let components = ComponentInfo::for_frame(subsampling, is_color);
        let restart_interval = self.settings.restart_interval;

        debug!(
            "encoding {}x{} {:?} at q{} ({:?}, {} components)",
            image.width,
            image.height,
            image.format,
            tables.quality(),
            subsampling,
            components.len()
        );

        // SourceImage::check has bounded both dimensions to u16
        let header = FrameHeader {
            width: image.width as u16,
            height: image.height as u16,
            components: &components,
            tables,
            density: self.settings.pixel_density,
            restart_interval,
        };
        write_headers(sink, &header);
        sink.status().map_err(|e| abort(e, 0))?;

        let extractor = Extractor::new(image, self.demosaic);
        let mut scan = ScanState::new(sink, self.simd, self.huffman, tables);
        let mcu_count = scan.run(&extractor, image, subsampling, is_color, restart_interval)?;

        sink.end_scan();
        MarkerWriter::new(sink).write_eoi();
        sink.status().map_err(|e| abort(e, mcu_count))?;

        debug!("encoded {} MCUs into {} bytes", mcu_count, sink.len());
        Ok(EncodeSummary {
            bytes_written: sink.len(),
            subsampling,
            num_components: components.len(),
            mcu_count,
        })
    }
}

/// Log an aborted encode and pass the error through.
fn abort(error: Error, mcus_done: usize) -> Error {
    warn!("encode aborted after {} MCUs: {}", mcus_done, error);
    error
}

/// Copy an already-compressed stream through the sink's capacity checks.
fn copy_compressed(image: &SourceImage<'_>, sink: &mut BitSink) -> Result<EncodeSummary> {
    debug!("passing through {} bytes of compressed data", image.data.len());
    sink.put_bytes(image.data);
    sink.status().map_err(|e| abort(e, 0))?;
    Ok(EncodeSummary {
        bytes_written: sink.len(),
        subsampling: Subsampling::S444,
        num_components: 0,
        mcu_count: 0,
    })
}

fn cb_plane(t: &TileSamples) -> &SampleBlock {
    &t.cb
}

fn cr_plane(t: &TileSamples) -> &SampleBlock {
    &t.cr
}

/// Per-scan working state: entropy coder plus reusable block buffers.
struct ScanState<'a> {
    entropy: EntropyEncoder<'a>,
    simd: &'a SimdOps,
    huffman: &'a StandardTables,
    tables: &'a EncoderTables,
    tiles: [TileSamples; 4],
    chroma: SampleBlock,
    scratch: FloatBlock,
    coeffs: CoeffBlock,
}

impl<'a> ScanState<'a> {
    fn new(
        sink: &'a mut BitSink,
        simd: &'a SimdOps,
        huffman: &'a StandardTables,
        tables: &'a EncoderTables,
    ) -> Self {
        Self {
            entropy: EntropyEncoder::new(sink),
            simd,
            huffman,
            tables,
            tiles: Default::default(),
            chroma: [0; DCTSIZE2],
            scratch: [0.0; DCTSIZE2],
            coeffs: [0; DCTSIZE2],
        }
    }

    /// Code every MCU of the frame. Returns the number of MCUs coded.
    fn run(
        &mut self,
        extractor: &Extractor<'_>,
        image: &SourceImage<'_>,
        subsampling: Subsampling,
        is_color: bool,
        restart_interval: u16,
    ) -> Result<usize> {
        let (mcu_w, mcu_h) = subsampling.mcu_size();
        let (h_samp, v_samp) = subsampling.luma_factors();
        let (h_samp, v_samp) = (h_samp as usize, v_samp as usize);
        let mcus_x = (image.width as usize + mcu_w - 1) / mcu_w;
        let mcus_y = (image.height as usize + mcu_h - 1) / mcu_h;
        let chroma_blocks = if is_color { 2 } else { 0 };
        // Restart padding and marker on top of the blocks
        let mcu_bytes = (subsampling.luma_blocks() + chroma_blocks) * MAX_BLOCK_BYTES + 4;

        let mut mcu_count = 0usize;
        let mut next_restart = 0u8;

        for mcu_y in 0..mcus_y {
            for mcu_x in 0..mcus_x {
                self.entropy.sink().reserve_ahead(mcu_bytes);
                if restart_interval != 0
                    && mcu_count != 0
                    && mcu_count % restart_interval as usize == 0
                {
                    self.entropy.emit_restart(next_restart);
                    next_restart = next_restart.wrapping_add(1);
                }

                // Luma blocks in MCU order: left to right, then top to bottom
                for by in 0..v_samp {
                    for bx in 0..h_samp {
                        let tile = extractor
                            .tile_at(mcu_x * mcu_w + bx * DCTSIZE, mcu_y * mcu_h + by * DCTSIZE);
                        let idx = by * h_samp + bx;
                        extractor.extract(tile, &mut self.tiles[idx]);
                        let y = self.tiles[idx].y;
                        self.encode_block(&y, 0);
                    }
                }

                if is_color {
                    self.downsample(subsampling, cb_plane);
                    let cb = self.chroma;
                    self.encode_block(&cb, 1);
                    self.downsample(subsampling, cr_plane);
                    let cr = self.chroma;
                    self.encode_block(&cr, 2);
                }
                mcu_count += 1;
            }

            self.entropy
                .sink()
                .status()
                .map_err(|e| abort(e, mcu_count))?;
        }

        Ok(mcu_count)
    }

    /// Fold one chroma plane of the buffered tiles into `self.chroma`.
    fn downsample(&mut self, subsampling: Subsampling, plane: fn(&TileSamples) -> &SampleBlock) {
        let t = &self.tiles;
        match subsampling {
            Subsampling::S444 | Subsampling::Auto => self.chroma = *plane(&t[0]),
            Subsampling::S422 => average_h(plane(&t[0]), plane(&t[1]), &mut self.chroma),
            Subsampling::S440 => average_v(plane(&t[0]), plane(&t[1]), &mut self.chroma),
            Subsampling::S420 => average_2x2(
                [plane(&t[0]), plane(&t[1]), plane(&t[2]), plane(&t[3])],
                &mut self.chroma,
            ),
        }
    }

    /// DCT, quantize and entropy code one block of `component` (0 = Y).
    fn encode_block(&mut self, samples: &SampleBlock, component: usize) {
        let is_chroma = component != 0;
        let recip = if is_chroma {
            &self.tables.chroma().recip
        } else {
            &self.tables.luma().recip
        };
        let (dc, ac): (&DerivedTable, &DerivedTable) = self.huffman.for_component(is_chroma);

        load_samples(samples, &mut self.scratch);
        let last_nonzero = self.simd.transform(&mut self.scratch, recip, &mut self.coeffs);
        self.entropy
            .encode_block(&self.coeffs, last_nonzero, component, dc, ac);
    }
}

/// Encode a frame with explicit parameters and caller-owned tables.
///
/// `destination` is reused when given (its capacity is the initial size, or
/// the hard bound when `allow_growth` is false); otherwise one is allocated.
/// `tables` is rebuilt only if `quality` differs from its last build.
///
/// # Errors
/// [`Error::InvalidQuality`] for quality 0 or above 100, the validation
/// errors of [`SourceImage`], and [`Error::BufferOverflow`] /
/// [`Error::AllocationFailed`] when the stream does not fit.
pub fn compress(
    image: &SourceImage<'_>,
    destination: Option<Vec<u8>>,
    quality: u8,
    allow_growth: bool,
    subsampling: Subsampling,
    tables: &mut EncoderTables,
) -> Result<Vec<u8>> {
    if quality == 0 || quality > 100 {
        return Err(Error::InvalidQuality(quality));
    }
    tables.rebuild_if_needed(quality);

    let settings = Settings {
        subsampling,
        allow_growth,
        ..Settings::default()
    };
    let simd = SimdOps::detect();
    let frame = FrameEncoder {
        settings: &settings,
        simd: &simd,
        demosaic: &BilinearDemosaic,
        huffman: standard_tables(),
    };
    let (buffer, result) = frame.encode(image, destination.unwrap_or_default(), tables);
    result.map(|_| buffer)
}
