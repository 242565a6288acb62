//! Contains the error diffusion kernel presets.

/// The scale applied to the Jarvis–Judice–Ninke weights so that, at a shift of
/// `13`, the total diffused error comes out near unity (`170 * 48 / 8192 ≈ 0.996`).
const JJN_SCALE: i32 = 8192 / 48;

/// A description of how quantization error spreads to not-yet-processed pixels.
///
/// A kernel is three rows of integer weights in a fixed-point scale of
/// `2^-shift`:
/// - `row0` holds the weights for the remaining pixels of the current row,
///   nearest neighbor first;
/// - `row1` and `row2` hold the weights for the next and next-next rows, with
///   `offset` marking which column of those rows sits under the current pixel.
///   `row2` is empty for kernels that only reach one row ahead.
///
/// For a sane kernel the weights sum to roughly `2^shift`, so that all of the
/// error is conserved. This is not validated at runtime: a kernel that breaks
/// it visibly under- or over-diffuses, which is a content bug in the kernel
/// constants rather than a runtime fault.
///
/// Use the provided preset constants, or [`DiffusionKernel::new`] to experiment
/// with custom weight layouts:
/// ```
/// # use palettize::DiffusionKernel;
/// // Atkinson: diffuses only 6/8 of the error on purpose.
/// static ATKINSON: DiffusionKernel =
///     DiffusionKernel::new(&[1, 1], &[1, 1, 1], &[0, 1, 0], 1, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusionKernel {
    /// Weights for the pixels right of the current one, nearest first.
    row0: &'static [i32],
    /// Weights for the next row.
    row1: &'static [i32],
    /// Weights for the row after next; empty when the kernel spans two rows.
    row2: &'static [i32],
    /// The column of `row1`/`row2` that sits under the current pixel.
    offset: usize,
    /// The number of fractional bits in the weights.
    shift: u32,
}

impl DiffusionKernel {
    /// The classic Floyd–Steinberg kernel (weights summing to 16).
    ///
    /// ```text
    ///     X 7
    ///   3 5 1
    /// ```
    pub const FLOYD_STEINBERG: Self = Self::new(&[7], &[3, 5, 1], &[], 1, 4);

    /// The Jarvis–Judice–Ninke kernel: a five-wide, three-row spread for
    /// smoother gradients at more work per pixel.
    ///
    /// ```text
    ///       X 7 5
    ///   3 5 7 5 3
    ///   1 3 5 3 1
    /// ```
    pub const JARVIS_JUDICE_NINKE: Self = Self::new(
        &[7 * JJN_SCALE, 5 * JJN_SCALE],
        &[
            3 * JJN_SCALE,
            5 * JJN_SCALE,
            7 * JJN_SCALE,
            5 * JJN_SCALE,
            3 * JJN_SCALE,
        ],
        &[JJN_SCALE, 3 * JJN_SCALE, 5 * JJN_SCALE, 3 * JJN_SCALE, JJN_SCALE],
        3,
        13,
    );

    /// The full three-row Sierra kernel (weights summing to 32).
    ///
    /// ```text
    ///       X 5 3
    ///   2 4 5 4 2
    ///   0 2 3 2 0
    /// ```
    pub const SIERRA3: Self = Self::new(&[5, 3], &[2, 4, 5, 4, 2], &[0, 2, 3, 2, 0], 3, 5);

    /// The two-row Sierra kernel (weights summing to 16).
    ///
    /// ```text
    ///       X 4 3
    ///   1 2 3 2 1
    /// ```
    pub const SIERRA2: Self = Self::new(&[4, 3], &[1, 2, 3, 2, 1], &[], 3, 4);

    /// Sierra Lite: the smallest useful kernel (weights summing to 4).
    ///
    /// ```text
    ///   X 2
    /// 1 1
    /// ```
    pub const SIERRA_LITE: Self = Self::new(&[2], &[1, 1], &[], 1, 2);

    /// Creates a kernel from its weight rows, current-pixel column, and
    /// fixed-point shift. Pass an empty `row2` for a two-row kernel.
    #[must_use]
    pub const fn new(
        row0: &'static [i32],
        row1: &'static [i32],
        row2: &'static [i32],
        offset: usize,
        shift: u32,
    ) -> Self {
        assert!(offset < row1.len());
        assert!(row2.is_empty() || row2.len() == row1.len());
        Self { row0, row1, row2, offset, shift }
    }

    /// The current-row forward weights, nearest neighbor first.
    #[must_use]
    pub const fn row0(&self) -> &'static [i32] {
        self.row0
    }

    /// The next-row weights.
    #[must_use]
    pub const fn row1(&self) -> &'static [i32] {
        self.row1
    }

    /// The next-next-row weights; empty for two-row kernels.
    #[must_use]
    pub const fn row2(&self) -> &'static [i32] {
        self.row2
    }

    /// The column of [`row1`](Self::row1) that sits under the current pixel.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// The number of fractional bits in the weights.
    #[must_use]
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// The sum of every weight in the kernel.
    #[must_use]
    pub fn weight_sum(&self) -> i64 {
        [self.row0, self.row1, self.row2]
            .iter()
            .flat_map(|row| row.iter())
            .map(|&w| i64::from(w))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::cast_precision_loss)]
mod tests {
    use super::*;

    const PRESETS: [(&str, DiffusionKernel); 5] = [
        ("floyd-steinberg", DiffusionKernel::FLOYD_STEINBERG),
        ("jarvis-judice-ninke", DiffusionKernel::JARVIS_JUDICE_NINKE),
        ("sierra3", DiffusionKernel::SIERRA3),
        ("sierra2", DiffusionKernel::SIERRA2),
        ("sierra lite", DiffusionKernel::SIERRA_LITE),
    ];

    #[test]
    fn presets_conserve_error() {
        for (name, kernel) in PRESETS {
            let total = kernel.weight_sum() as f64 / f64::from(1 << kernel.shift());
            assert!(
                (total - 1.0).abs() < 0.01,
                "{name} diffuses {total} of the error"
            );
        }
    }

    #[test]
    fn presets_are_structurally_sound() {
        for (name, kernel) in PRESETS {
            assert!(kernel.offset() < kernel.row1().len(), "{name}");
            assert!(
                kernel.row2().is_empty() || kernel.row2().len() == kernel.row1().len(),
                "{name}"
            );
            assert!(!kernel.row0().is_empty(), "{name}");
        }
    }

    #[test]
    fn floyd_steinberg_matches_folklore() {
        let kernel = DiffusionKernel::FLOYD_STEINBERG;
        assert_eq!(kernel.row0(), &[7]);
        assert_eq!(kernel.row1(), &[3, 5, 1]);
        assert!(kernel.row2().is_empty());
        assert_eq!(kernel.weight_sum(), 16);
        assert_eq!(kernel.shift(), 4);
    }
}
