//! Contains the scanline error diffusion engine and its carry buffers.

use crate::{DiffusionKernel, ErrorFraction, ErrorTerm, Quantizer};
use num_traits::Zero;
use std::array;

/// Guard cells on each side of a carry buffer. Kernels reach a few columns
/// past either image edge; deposits land in the guard cells and are discarded.
const MARGIN: usize = 16;

/// One row of carried error, indexable a little outside `[0, width)`.
///
/// This hides the padded-buffer offset arithmetic behind a signed index:
/// columns `-MARGIN..width + MARGIN` are valid, the guard cells soak up
/// edge spill and are re-zeroed as rows are recycled.
#[derive(Debug, Clone)]
struct ErrorRow<T> {
    /// `width + 2 * MARGIN` cells, the first `MARGIN` of which sit left of column 0.
    cells: Vec<T>,
}

impl<T: ErrorTerm> ErrorRow<T> {
    /// Creates a zeroed row for images `width` pixels wide.
    fn new(width: u32) -> Self {
        Self {
            cells: vec![T::zero(); width as usize + 2 * MARGIN],
        }
    }

    /// Maps a signed column to a cell index. A column outside the guard cells
    /// wraps and panics on the slice access, which is a caller bug.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn index(x: i64) -> usize {
        (x + MARGIN as i64) as usize
    }

    /// Reads the carry at column `x`.
    fn get(&self, x: i64) -> T {
        self.cells[Self::index(x)]
    }

    /// Overwrites the carry at column `x`.
    fn set(&mut self, x: i64, value: T) {
        self.cells[Self::index(x)] = value;
    }

    /// Accumulates into the carry at column `x`.
    fn add(&mut self, x: i64, value: T) {
        let index = Self::index(x);
        self.cells[index] += value;
    }

    /// Zeroes every cell, guard cells included.
    fn clear(&mut self) {
        self.cells.fill(T::zero());
    }
}

/// The direction a scanline is walked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Left to right.
    Forward,
    /// Right to left.
    Reverse,
}

impl ScanDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            ScanDirection::Forward => ScanDirection::Reverse,
            ScanDirection::Reverse => ScanDirection::Forward,
        }
    }

    /// The cursor step: `+1` forward, `-1` reverse.
    const fn delta(self) -> i64 {
        match self {
            ScanDirection::Forward => 1,
            ScanDirection::Reverse => -1,
        }
    }
}

/// Options controlling an [`ErrorDiffusionEngine`].
///
/// # Examples
/// ```
/// # use palettize::{DiffusionOptions, ErrorFraction};
/// let options = DiffusionOptions::new()
///     .error_fraction(ErrorFraction::from_clamped(768))
///     .serpentine(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusionOptions {
    /// How much of the quantization error to diffuse.
    error_fraction: ErrorFraction,
    /// Whether to alternate the scan direction while descending the image.
    serpentine: bool,
    /// How many scanlines to process before each direction flip.
    serpentine_period: u32,
}

impl DiffusionOptions {
    /// The default number of scanlines between serpentine direction flips.
    pub const DEFAULT_SERPENTINE_PERIOD: u32 = 15;

    /// Creates a new [`DiffusionOptions`] with default values:
    /// full error diffusion and a fixed forward scan.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            error_fraction: ErrorFraction::MAX,
            serpentine: false,
            serpentine_period: Self::DEFAULT_SERPENTINE_PERIOD,
        }
    }

    /// Sets the fraction of the quantization error that gets diffused.
    ///
    /// The default is [`ErrorFraction::MAX`], diffusing all of it.
    #[must_use]
    pub const fn error_fraction(mut self, fraction: ErrorFraction) -> Self {
        self.error_fraction = fraction;
        self
    }

    /// Enables or disables serpentine scanning.
    ///
    /// When enabled, the scan direction flips every
    /// [serpentine period](Self::serpentine_period) scanlines, which breaks up
    /// the directional worm artifacts of a fixed scan. Disabled by default.
    #[must_use]
    pub const fn serpentine(mut self, enabled: bool) -> Self {
        self.serpentine = enabled;
        self
    }

    /// Sets the number of scanlines between serpentine direction flips.
    ///
    /// A period of `0` is treated as `1` (flip on every scanline).
    /// The default is [`DiffusionOptions::DEFAULT_SERPENTINE_PERIOD`].
    #[must_use]
    pub const fn serpentine_period(mut self, period: u32) -> Self {
        self.serpentine_period = if period == 0 { 1 } else { period };
        self
    }
}

impl Default for DiffusionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A stateful scanline processor that drives a [`DiffusionKernel`] across an
/// image in raster order, carrying quantization error into later pixels.
///
/// The engine is generic over the carried value: `i32` for a single color
/// channel, [`Fixed3`](crate::Fixed3) for a whole color. Create one engine per
/// image (or per channel within one image) and discard it after the last row;
/// carry state never outlives an image.
///
/// The caller walks each row in the engine's current [`direction`](Self::direction),
/// feeding every pixel of the row to [`diffuse`](Self::diffuse) and then calling
/// [`end_of_row`](Self::end_of_row) once. Rows have a strict top-to-bottom
/// dependency and pixels within a row a strict scan-order dependency, so a
/// single engine cannot be fed out of order or in parallel.
#[derive(Debug, Clone)]
pub struct ErrorDiffusionEngine<T> {
    /// The weight layout driven across the image.
    kernel: DiffusionKernel,
    /// Carried error: the current row and three lookahead rows.
    rows: [ErrorRow<T>; 4],
    /// The image width in pixels.
    width: u32,
    /// The current scan column.
    x: i64,
    /// The current scan direction.
    direction: ScanDirection,
    /// Whether the direction alternates while descending the image.
    serpentine: bool,
    /// Scanlines between direction flips.
    serpentine_period: u32,
    /// Scanlines completed since the last flip.
    rows_since_flip: u32,
    /// The diffused share of the error, in units of `1/1024`.
    error_fraction: i32,
}

impl<T: ErrorTerm> ErrorDiffusionEngine<T> {
    /// Creates an engine for images `width` pixels wide.
    ///
    /// The guard cells must cover the kernel reach; all preset kernels fit
    /// with plenty of room.
    #[must_use]
    pub fn new(kernel: DiffusionKernel, width: u32, options: DiffusionOptions) -> Self {
        assert!(kernel.row0().len() < MARGIN);
        assert!(kernel.row1().len() <= MARGIN && kernel.offset() <= MARGIN);
        Self {
            kernel,
            rows: array::from_fn(|_| ErrorRow::new(width)),
            width,
            x: 0,
            direction: ScanDirection::Forward,
            serpentine: options.serpentine,
            serpentine_period: options.serpentine_period,
            rows_since_flip: 0,
            error_fraction: i32::from(options.error_fraction.into_inner()),
        }
    }

    /// The direction the current row is being scanned in. The caller must feed
    /// [`diffuse`](Self::diffuse) the row's pixels in this order.
    #[must_use]
    pub const fn direction(&self) -> ScanDirection {
        self.direction
    }

    /// Restarts scanning left-to-right from the left edge.
    pub fn forward(&mut self) {
        self.direction = ScanDirection::Forward;
        self.rows_since_flip = 0;
        self.x = 0;
    }

    /// Restarts scanning right-to-left from the right edge.
    pub fn reverse(&mut self) {
        self.direction = ScanDirection::Reverse;
        self.rows_since_flip = 0;
        self.x = i64::from(self.width) - 1;
    }

    /// Quantizes one pixel and spreads its error to the neighbors.
    ///
    /// The carried error for the current column is subtracted from `input`
    /// before handing it to `quantizer`; the quantization error (relative to
    /// the unadjusted `input`) is scaled by the error fraction and deposited
    /// into the carry rows per the kernel weights, mirrored horizontally when
    /// scanning in reverse. The cursor then advances one column.
    pub fn diffuse<Q: Quantizer<T>>(&mut self, input: T, quantizer: &mut Q) -> T {
        let x = self.x;
        let kernel = self.kernel;
        let delta = self.direction.delta();

        let carried = self.rows[0].get(x) >> kernel.shift();
        let output = quantizer.quantize(input - carried);
        let err = (output - input) * self.error_fraction >> ErrorFraction::BITS;

        // the row two ahead starts its pass with no stale carry
        self.rows[3].set(x, T::zero());

        for (i, &weight) in kernel.row0().iter().enumerate() {
            self.rows[0].add(x + delta * (i as i64 + 1), err * weight);
        }
        let offset = kernel.offset() as i64;
        for (i, &weight) in kernel.row1().iter().enumerate() {
            self.rows[1].add(x + delta * (i as i64 - offset), err * weight);
        }
        for (i, &weight) in kernel.row2().iter().enumerate() {
            self.rows[2].add(x + delta * (i as i64 - offset), err * weight);
        }

        self.x += delta;
        output
    }

    /// Finishes the current scanline.
    ///
    /// Rotates the carry rows (the finished row is recycled as the new
    /// two-ahead row), flips the scan direction when the serpentine period is
    /// reached, and resets the cursor to the edge matching the direction.
    pub fn end_of_row(&mut self) {
        self.rows.rotate_left(1);
        // the recycled row starts over empty; this also drops the edge spill
        // its guard cells collected four rows ago
        self.rows[3].clear();

        if self.serpentine {
            self.rows_since_flip += 1;
            if self.rows_since_flip >= self.serpentine_period {
                self.rows_since_flip = 0;
                self.direction = self.direction.flipped();
            }
        }

        self.x = match self.direction {
            ScanDirection::Forward => 0,
            ScanDirection::Reverse => i64::from(self.width) - 1,
        };
    }
}
