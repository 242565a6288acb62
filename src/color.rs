//! Contains the fixed-point color vector and the raster packing boundary.

use palette::{Srgb, Srgba};
use std::ops::{Add, AddAssign, Mul, Shr, Sub};

/// The number of bits of channel resolution used for all internal color math.
pub const FIXED_BITS: u32 = 15;

/// The largest representable channel value, `0x7FFF`.
pub const FIXED_MAX: i32 = (1 << FIXED_BITS) - 1;

/// The linear-domain midpoint, i.e. 50% light intensity.
pub const FIXED_HALF: i32 = 1 << (FIXED_BITS - 1);

/// The size of the fixed-point domain (and of the gamma lookup tables).
pub(crate) const FIXED_RANGE: usize = 1 << FIXED_BITS;

/// A three-channel color with integer channel values in the 15-bit fixed-point domain.
///
/// The same type is used for gamma-encoded (display) and linear colors;
/// the [`GammaLut`](crate::GammaLut) method names mark the conversion direction.
/// All distance and diffusion math must happen on linear values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fixed3(pub [i32; 3]);

impl Fixed3 {
    /// Creates a color from its three channel values.
    #[must_use]
    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self([r, g, b])
    }

    /// Creates a color with all three channels set to `value`.
    #[must_use]
    pub const fn splat(value: i32) -> Self {
        Self([value; 3])
    }

    /// Applies `f` to each channel.
    #[must_use]
    pub fn map(self, f: impl Fn(i32) -> i32) -> Self {
        Self(self.0.map(f))
    }

    /// Per-channel step function: `lo` below `edge`, `hi` at or above it.
    #[must_use]
    pub fn step(self, edge: i32, lo: i32, hi: i32) -> Self {
        self.map(|c| if c < edge { lo } else { hi })
    }

    /// The squared Euclidean length, widened to `i64` so that three squared
    /// 15-bit channels cannot overflow.
    #[must_use]
    pub fn length_squared(self) -> i64 {
        let [r, g, b] = self.0;
        i64::from(r) * i64::from(r) + i64::from(g) * i64::from(g) + i64::from(b) * i64::from(b)
    }

    /// The squared Euclidean distance to `other`.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        (self - other).length_squared()
    }

    /// Clamps every channel into the fixed-point domain.
    #[must_use]
    pub fn clamp_domain(self) -> Self {
        self.map(|c| c.clamp(0, FIXED_MAX))
    }

    /// Widens an 8-bit color to the fixed-point domain by bit replication,
    /// so that `255` maps exactly to [`FIXED_MAX`]. Used at the palette edit boundary.
    #[must_use]
    pub fn from_srgb(color: Srgb<u8>) -> Self {
        let widen = |c: u8| (i32::from(c) * 0x101) >> 1;
        Self([widen(color.red), widen(color.green), widen(color.blue)])
    }

    /// Narrows a display color back to 8 bits, inverting [`Fixed3::from_srgb`] exactly
    /// for values produced by it.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn into_srgb(self) -> Srgb<u8> {
        let narrow = |c: i32| ((2 * c.clamp(0, FIXED_MAX) + 1) / 0x101) as u8;
        Srgb::new(narrow(self.0[0]), narrow(self.0[1]), narrow(self.0[2]))
    }

    /// Unpacks a raster pixel into a display color and its untouched alpha.
    ///
    /// Raster channels widen by a plain shift, matching the fixed-point layout
    /// the gamma tables are built for.
    #[must_use]
    pub fn from_raster(pixel: Srgba<u8>) -> (Self, u8) {
        let widen = |c: u8| i32::from(c) << (FIXED_BITS - 8);
        let color = Self([
            widen(pixel.color.red),
            widen(pixel.color.green),
            widen(pixel.color.blue),
        ]);
        (color, pixel.alpha)
    }

    /// Packs a display color and alpha back into a raster pixel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn into_raster(self, alpha: u8) -> Srgba<u8> {
        let narrow = |c: i32| (c.clamp(0, FIXED_MAX) >> (FIXED_BITS - 8)) as u8;
        Srgba::new(narrow(self.0[0]), narrow(self.0[1]), narrow(self.0[2]), alpha)
    }
}

impl Add for Fixed3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl AddAssign for Fixed3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
        ])
    }
}

impl Mul<i32> for Fixed3 {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        self.map(|c| c * rhs)
    }
}

impl Shr<u32> for Fixed3 {
    type Output = Self;

    fn shr(self, rhs: u32) -> Self {
        self.map(|c| c >> rhs)
    }
}

impl num_traits::Zero for Fixed3 {
    fn zero() -> Self {
        Self::default()
    }

    fn is_zero(&self) -> bool {
        self.0 == [0; 3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_widening_round_trips() {
        for c in 0..=255u8 {
            let widened = Fixed3::from_srgb(Srgb::new(c, c, c));
            assert!(widened.0[0] <= FIXED_MAX);
            assert_eq!(widened.into_srgb(), Srgb::new(c, c, c));
        }
        assert_eq!(Fixed3::from_srgb(Srgb::new(255, 255, 255)).0, [FIXED_MAX; 3]);
    }

    #[test]
    fn raster_packing_round_trips() {
        for c in 0..=255u8 {
            let (color, alpha) = Fixed3::from_raster(Srgba::new(c, c, c, 7));
            assert_eq!(color.into_raster(alpha), Srgba::new(c, c, c, 7));
        }
    }

    #[test]
    fn packing_clamps_out_of_domain_values() {
        let hot = Fixed3::new(FIXED_MAX + 100, -50, FIXED_MAX);
        assert_eq!(hot.into_raster(255), Srgba::new(255, 0, 255, 255));
    }

    #[test]
    fn step_is_per_channel() {
        let color = Fixed3::new(0, FIXED_HALF, FIXED_MAX);
        assert_eq!(
            color.step(FIXED_HALF, 0, FIXED_MAX),
            Fixed3::new(0, FIXED_MAX, FIXED_MAX)
        );
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Fixed3::new(1000, 2000, 3000);
        let b = Fixed3::new(3000, 2000, 1000);
        assert_eq!(a.distance_squared(b), b.distance_squared(a));
        assert_eq!(a.distance_squared(a), 0);
    }
}
