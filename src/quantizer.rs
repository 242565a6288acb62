//! Contains the quantization strategies handed to the diffusion engine.

use crate::{Fixed3, PaletteStore, FIXED_HALF, FIXED_MAX};
#[cfg(feature = "random")]
use {
    rand::{Rng, SeedableRng},
    rand_xoshiro::Xoroshiro128PlusPlus,
};

/// The quantization step applied to each (error-corrected) color value.
///
/// Implementations snap a linear color to the nearest representable output
/// value: a palette entry, a per-channel two-level step, or the value itself.
/// The [`ErrorDiffusionEngine`](crate::ErrorDiffusionEngine) calls this once
/// per pixel; implementations may keep state between calls (e.g. the RNG
/// stream of [`RandomOffset`]).
pub trait Quantizer<T> {
    /// Returns the quantized form of `color`.
    fn quantize(&mut self, color: T) -> T;
}

/// Adapts a closure into a [`Quantizer`].
#[derive(Debug, Clone, Copy)]
pub struct QuantizeFn<F>(pub F);

impl<T, F: FnMut(T) -> T> Quantizer<T> for QuantizeFn<F> {
    fn quantize(&mut self, color: T) -> T {
        (self.0)(color)
    }
}

/// Passes values through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> Quantizer<T> for Identity {
    fn quantize(&mut self, color: T) -> T {
        color
    }
}

/// A per-channel two-level step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    /// Values below the edge quantize to `lo`, values at or above it to `hi`.
    edge: i32,
    /// The "off" output level.
    lo: i32,
    /// The "on" output level.
    hi: i32,
}

impl Threshold {
    /// Creates a step at the linear-domain midpoint, producing `0` or
    /// [`FIXED_MAX`](crate::FIXED_MAX). This is the clip quantizer for
    /// palette-less modes.
    #[must_use]
    pub const fn linear_midpoint() -> Self {
        Self::new(FIXED_HALF, 0, FIXED_MAX)
    }

    /// Creates a step at an arbitrary edge with arbitrary output levels.
    #[must_use]
    pub const fn new(edge: i32, lo: i32, hi: i32) -> Self {
        Self { edge, lo, hi }
    }
}

impl Quantizer<i32> for Threshold {
    fn quantize(&mut self, color: i32) -> i32 {
        if color < self.edge {
            self.lo
        } else {
            self.hi
        }
    }
}

impl Quantizer<Fixed3> for Threshold {
    fn quantize(&mut self, color: Fixed3) -> Fixed3 {
        color.step(self.edge, self.lo, self.hi)
    }
}

/// Snaps a linear color to the nearest palette entry.
///
/// The index of the most recently chosen entry is kept so that callers can
/// write the exact display form of the entry instead of round-tripping the
/// linear result through the gamma tables.
///
/// With an empty palette there is nothing to snap to and values pass through
/// unchanged (and [`NearestPalette::last_index`] stays at its previous value).
#[derive(Debug, Clone, Copy)]
pub struct NearestPalette<'a> {
    /// The palette searched on every call.
    palette: &'a PaletteStore,
    /// The index chosen by the most recent `quantize` call.
    last_index: u8,
}

impl<'a> NearestPalette<'a> {
    /// Creates a quantizer over the given palette.
    #[must_use]
    pub const fn new(palette: &'a PaletteStore) -> Self {
        Self { palette, last_index: 0 }
    }

    /// The palette index chosen by the most recent [`Quantizer::quantize`] call.
    #[must_use]
    pub const fn last_index(&self) -> u8 {
        self.last_index
    }
}

impl Quantizer<Fixed3> for NearestPalette<'_> {
    fn quantize(&mut self, color: Fixed3) -> Fixed3 {
        match self.palette.nearest(color) {
            Some(index) => {
                self.last_index = index;
                self.palette.linear_colors()[usize::from(index)]
            }
            None => color,
        }
    }
}

/// Perturbs each value with seeded uniform noise before delegating to the
/// inner quantizer.
///
/// This is the legacy random dither mode: the offset is drawn per pixel and
/// per channel from `[-0x3FFF, 0x3FFF]` and no state other than the RNG stream
/// carries between pixels.
#[cfg(feature = "random")]
#[derive(Debug, Clone)]
pub struct RandomOffset<Q> {
    /// The quantizer applied after the perturbation.
    inner: Q,
    /// The seeded noise source.
    rng: Xoroshiro128PlusPlus,
}

#[cfg(feature = "random")]
impl<Q> RandomOffset<Q> {
    /// Creates a noisy wrapper around `inner` with the given RNG seed.
    #[must_use]
    pub fn new(inner: Q, seed: u64) -> Self {
        Self {
            inner,
            rng: Xoroshiro128PlusPlus::seed_from_u64(seed),
        }
    }

    /// A reference to the wrapped quantizer.
    #[must_use]
    pub const fn inner(&self) -> &Q {
        &self.inner
    }

    /// Draws a uniform offset in `[-0x3FFF, 0x3FFF]`.
    fn offset(&mut self) -> i32 {
        (FIXED_HALF - 1) - i32::from(self.rng.gen::<u16>() & 0x7FFE)
    }
}

#[cfg(feature = "random")]
impl<Q: Quantizer<i32>> Quantizer<i32> for RandomOffset<Q> {
    fn quantize(&mut self, color: i32) -> i32 {
        let offset = self.offset();
        self.inner.quantize(color + offset)
    }
}

#[cfg(feature = "random")]
impl<Q: Quantizer<Fixed3>> Quantizer<Fixed3> for RandomOffset<Q> {
    fn quantize(&mut self, color: Fixed3) -> Fixed3 {
        let offset = Fixed3::new(self.offset(), self.offset(), self.offset());
        self.inner.quantize(color + offset)
    }
}
