//! Contains various types needed across the crate.

use crate::MAX_PIXELS;
use palette::Srgba;
use std::{
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
};
#[cfg(feature = "image")]
use {image::RgbaImage, palette::cast::ComponentsAs};

/// An error type for when the length of an input (e.g., `Vec` or slice)
/// is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// A simple new type wrapper around `&'a [Srgba<u8>]` with the invariant that the length of the
/// inner slice must not be greater than [`MAX_PIXELS`](crate::MAX_PIXELS).
///
/// The pixels are gamma-encoded display values in row-major raster order.
///
/// # Examples
/// Use `try_into` or [`RasterSlice::from_truncated`] to create [`RasterSlice`]s.
///
/// From a raw pixel slice:
/// ```
/// # use palettize::{RasterSlice, AboveMaxLen};
/// # use palette::Srgba;
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// let pixels = vec![Srgba::new(0u8, 0, 0, 255)];
/// let raster: RasterSlice = pixels.as_slice().try_into()?;
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use palettize::RasterSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let raster = RasterSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct RasterSlice<'a>(&'a [Srgba<u8>]);

impl<'a> Clone for RasterSlice<'a> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a> Copy for RasterSlice<'a> {}

impl<'a> RasterSlice<'a> {
    /// Creates a [`RasterSlice`] without ensuring that its length
    /// is less than or equal to [`MAX_PIXELS`](crate::MAX_PIXELS).
    #[allow(unused)]
    pub(crate) const fn new_unchecked(pixels: &'a [Srgba<u8>]) -> Self {
        Self(pixels)
    }

    /// Creates a new [`RasterSlice`] by truncating the input slice to a max length of
    /// [`MAX_PIXELS`](crate::MAX_PIXELS).
    pub fn from_truncated(pixels: &'a [Srgba<u8>]) -> Self {
        Self(&pixels[..pixels.len().min(MAX_PIXELS as usize)])
    }

    /// Returns the length of the slice as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_pixels(&self) -> u32 {
        self.0.len() as u32
    }
}

impl<'a> AsRef<[Srgba<u8>]> for RasterSlice<'a> {
    fn as_ref(&self) -> &[Srgba<u8>] {
        self
    }
}

impl<'a> Deref for RasterSlice<'a> {
    type Target = [Srgba<u8>];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a> From<RasterSlice<'a>> for &'a [Srgba<u8>] {
    fn from(val: RasterSlice<'a>) -> Self {
        val.0
    }
}

impl<'a> TryFrom<&'a [Srgba<u8>]> for RasterSlice<'a> {
    type Error = AboveMaxLen<u32>;

    fn try_from(slice: &'a [Srgba<u8>]) -> Result<Self, Self::Error> {
        if slice.len() <= MAX_PIXELS as usize {
            Ok(Self(slice))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for RasterSlice<'a> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        if pixels <= MAX_PIXELS as usize {
            let buf = &image.as_raw()[..(pixels * 4)];
            Ok(Self(buf.components_as()))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

/// The fraction of quantization error that the diffusion engine distributes to
/// neighboring pixels, in units of `1/1024`.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// less than or equal to [`ErrorFraction::MAX`].
/// The default of `1024` diffuses all of the error;
/// smaller values tame color bleeding at the cost of more visible banding.
///
/// # Examples
/// Use `into` to create [`ErrorFraction`]s from `u8`s.
/// For `u16`s, use `try_into` or [`ErrorFraction::from_clamped`].
/// ```
/// # use palettize::{ErrorFraction, AboveMaxLen};
/// # fn main() -> Result<(), AboveMaxLen<u16>> {
/// let fraction = ErrorFraction::try_from(768u16)?;
/// let fraction: ErrorFraction = 768u16.try_into()?;
/// let fraction = ErrorFraction::from_clamped(4096);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ErrorFraction(u16);

impl ErrorFraction {
    /// The number of fractional bits (`1024 = 2^10`).
    pub const BITS: u32 = 10;

    /// The maximum fraction value, diffusing all of the error (`1024/1024`).
    pub const MAX: Self = Self(1 << Self::BITS);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// Creates an [`ErrorFraction`] by clamping the given `u16` to be less than or equal to
    /// [`ErrorFraction::MAX`].
    #[must_use]
    pub const fn from_clamped(value: u16) -> Self {
        if value <= Self::MAX.0 {
            Self(value)
        } else {
            Self::MAX
        }
    }
}

impl Default for ErrorFraction {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<ErrorFraction> for u16 {
    fn from(val: ErrorFraction) -> Self {
        val.into_inner()
    }
}

impl From<u8> for ErrorFraction {
    fn from(value: u8) -> Self {
        Self(value.into())
    }
}

impl TryFrom<u16> for ErrorFraction {
    type Error = AboveMaxLen<u16>;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(AboveMaxLen(Self::MAX.0))
        }
    }
}

impl Display for ErrorFraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_fraction_clamps() {
        assert_eq!(ErrorFraction::from_clamped(4096), ErrorFraction::MAX);
        assert_eq!(ErrorFraction::from_clamped(512).into_inner(), 512);
        assert!(ErrorFraction::try_from(1025u16).is_err());
        assert_eq!(ErrorFraction::default(), ErrorFraction::MAX);
    }

    #[test]
    fn raster_slice_truncates() {
        let pixels = vec![Srgba::new(1u8, 2, 3, 4); 10];
        let raster = RasterSlice::from_truncated(&pixels);
        assert_eq!(raster.num_pixels(), 10);
    }
}
