//! Contains the sRGB transfer function lookup tables.

use crate::{Fixed3, FIXED_MAX, FIXED_RANGE};

/// The standard sRGB decoding curve over `[0, 1]`.
fn srgb_to_linear(c: f32) -> f32 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

/// The standard sRGB encoding curve over `[0, 1]`, the algebraic inverse of
/// [`srgb_to_linear`].
fn linear_to_srgb(c: f32) -> f32 {
    if c > 0.003_130_8 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        c * 12.92
    }
}

/// Precomputed sRGB ⇄ linear conversion tables over the 15-bit fixed-point domain.
///
/// Both directions are pure table lookups; inputs are masked into the table
/// domain rather than bounds checked, so any `i32` is accepted.
/// Construct one [`GammaLut`] at startup and pass it by reference to the
/// palette store and pipeline.
///
/// The tables are each other's approximate inverses. The dark segment of the
/// curve compresses display codes roughly 13:1, so a display → linear → display
/// round trip can move a value by up to the local slope of the curve, one
/// linear-domain step; everywhere else the round trip is within a step or two.
#[derive(Debug, Clone)]
pub struct GammaLut {
    /// Gamma decoding table, display to linear.
    to_linear: Box<[i32]>,
    /// Gamma encoding table, linear to display.
    to_display: Box<[i32]>,
}

impl GammaLut {
    /// Builds both tables by sampling the continuous transfer curve at
    /// `32768` equally spaced points over `[0, 1)`.
    ///
    /// This is a one-time cost; construction asserts that every entry stays
    /// inside the fixed-point domain (a violation would be a table-generation
    /// defect, not a runtime condition).
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn new() -> Self {
        let scale = FIXED_RANGE as f32;
        let mut to_linear = vec![0i32; FIXED_RANGE];
        let mut to_display = vec![0i32; FIXED_RANGE];

        for i in 0..FIXED_RANGE {
            let f = i as f32 / scale;
            let linear = (srgb_to_linear(f) * scale) as i32;
            let display = (linear_to_srgb(f) * scale) as i32;
            assert!(linear >= 0 && linear <= FIXED_MAX);
            assert!(display >= 0 && display <= FIXED_MAX);
            to_linear[i] = linear;
            to_display[i] = display;
        }

        Self {
            to_linear: to_linear.into_boxed_slice(),
            to_display: to_display.into_boxed_slice(),
        }
    }

    /// Converts a display channel value to linear light.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn to_linear(&self, c: i32) -> i32 {
        self.to_linear[(c & FIXED_MAX) as usize]
    }

    /// Converts a linear channel value back to the display domain.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn to_display(&self, c: i32) -> i32 {
        self.to_display[(c & FIXED_MAX) as usize]
    }

    /// Converts all three channels of a display color to linear light.
    #[must_use]
    pub fn to_linear_color(&self, color: Fixed3) -> Fixed3 {
        color.map(|c| self.to_linear(c))
    }

    /// Converts all three channels of a linear color back to the display domain.
    #[must_use]
    pub fn to_display_color(&self, color: Fixed3) -> Fixed3 {
        color.map(|c| self.to_display(c))
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}
