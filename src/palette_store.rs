//! Contains the editable, size-bounded color palette.

use crate::{Fixed3, GammaLut, MAX_K};
use ordered_float::OrderedFloat;
use palette::{Hsl, IntoColor, Srgb};
use std::{error::Error, fmt::Display};

/// An error type for palette edit operations.
///
/// Edits never partially apply: a failed operation leaves the palette untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteError {
    /// The palette already holds [`MAX_COLORS`](crate::MAX_COLORS) entries.
    Full,
    /// The index does not refer to an existing entry.
    InvalidIndex(usize),
}

impl Display for PaletteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaletteError::Full => write!(f, "the palette is full"),
            PaletteError::InvalidIndex(index) => write!(f, "no palette entry at index {index}"),
        }
    }
}

impl Error for PaletteError {}

/// An ordered collection of up to [`MAX_COLORS`](crate::MAX_COLORS) colors,
/// kept in both display and linear form.
///
/// Every mutation re-derives the linear form in the same call, so
/// `linear_colors()[i]` always equals the gamma-decoded `display_colors()[i]`.
/// The mutating operations take the [`GammaLut`] by reference for that reason.
///
/// The store is the quantization side of the palette: the editing UI calls
/// [`set_color`](Self::set_color) / [`add_color`](Self::add_color) /
/// [`delete_color`](Self::delete_color) / [`sort`](Self::sort) between
/// quantization passes, and the pipeline reads it during a pass. The two are
/// expected not to overlap in time; clone the store per pass if they must.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteStore {
    /// The gamma-encoded palette entries.
    display: Vec<Fixed3>,
    /// The linear form of each entry, index for index.
    linear: Vec<Fixed3>,
}

impl PaletteStore {
    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a palette from a slice of colors.
    ///
    /// # Errors
    /// Returns [`PaletteError::Full`] if more than
    /// [`MAX_COLORS`](crate::MAX_COLORS) colors are given.
    pub fn from_colors(lut: &GammaLut, colors: &[Srgb<u8>]) -> Result<Self, PaletteError> {
        let mut store = Self::new();
        for &color in colors {
            store.add_color(lut, color)?;
        }
        Ok(store)
    }

    /// The number of colors currently in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.display.len()
    }

    /// Whether the palette holds no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }

    /// The gamma-encoded palette entries, in order.
    #[must_use]
    pub fn display_colors(&self) -> &[Fixed3] {
        &self.display
    }

    /// The linear form of the palette entries, index for index.
    #[must_use]
    pub fn linear_colors(&self) -> &[Fixed3] {
        &self.linear
    }

    /// The entry at `index` as an 8-bit color for the editing boundary.
    #[must_use]
    pub fn srgb(&self, index: usize) -> Option<Srgb<u8>> {
        self.display.get(index).map(|&color| color.into_srgb())
    }

    /// Replaces the entry at `index`.
    ///
    /// # Errors
    /// Returns [`PaletteError::InvalidIndex`] if `index` is not an existing
    /// entry; the palette is left unchanged.
    pub fn set_color(
        &mut self,
        lut: &GammaLut,
        index: usize,
        color: Srgb<u8>,
    ) -> Result<(), PaletteError> {
        if index >= self.len() {
            return Err(PaletteError::InvalidIndex(index));
        }
        let display = Fixed3::from_srgb(color);
        self.display[index] = display;
        self.linear[index] = lut.to_linear_color(display);
        Ok(())
    }

    /// Appends a color and returns its index.
    ///
    /// # Errors
    /// Returns [`PaletteError::Full`] once the palette holds
    /// [`MAX_COLORS`](crate::MAX_COLORS) entries.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_color(&mut self, lut: &GammaLut, color: Srgb<u8>) -> Result<u8, PaletteError> {
        if self.len() >= MAX_K {
            return Err(PaletteError::Full);
        }
        let index = self.len() as u8;
        let display = Fixed3::from_srgb(color);
        self.display.push(display);
        self.linear.push(lut.to_linear_color(display));
        Ok(index)
    }

    /// Removes the entry at `index`, shifting every later entry down by one.
    ///
    /// # Errors
    /// Returns [`PaletteError::InvalidIndex`] if `index` is not an existing
    /// entry; the palette is left unchanged.
    pub fn delete_color(&mut self, index: usize) -> Result<(), PaletteError> {
        if index >= self.len() {
            return Err(PaletteError::InvalidIndex(index));
        }
        self.display.remove(index);
        self.linear.remove(index);
        Ok(())
    }

    /// Reorders the palette by a perceptual key: hue first, lightness second.
    ///
    /// The sort is stable, so equal-key entries keep their relative order.
    /// Linear forms are re-derived after the reorder.
    pub fn sort(&mut self, lut: &GammaLut) {
        self.display.sort_by_key(|&color| perceptual_key(color));
        self.linear = self
            .display
            .iter()
            .map(|&color| lut.to_linear_color(color))
            .collect();
    }

    /// Finds the palette entry nearest to the given linear color by squared
    /// Euclidean distance in the linear domain.
    ///
    /// Equal distances resolve to the lowest index (only a strictly smaller
    /// distance displaces an earlier candidate). Returns `None` for an empty
    /// palette; callers treat that as "no palette".
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn nearest(&self, linear: Fixed3) -> Option<u8> {
        let mut best: Option<(u8, i64)> = None;
        for (index, &candidate) in self.linear.iter().enumerate() {
            let distance = linear.distance_squared(candidate);
            if best.map_or(true, |(_, smallest)| distance < smallest) {
                best = Some((index as u8, distance));
            }
        }
        best.map(|(index, _)| index)
    }
}

/// The sort key for [`PaletteStore::sort`]: positive hue degrees, then lightness.
fn perceptual_key(display: Fixed3) -> (OrderedFloat<f32>, OrderedFloat<f32>) {
    let srgb: Srgb<f32> = display.into_srgb().into_format();
    let hsl: Hsl = srgb.into_color();
    (
        OrderedFloat(hsl.hue.into_positive_degrees()),
        OrderedFloat(hsl.lightness),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;

    fn assert_linear_derived(store: &PaletteStore, lut: &GammaLut) {
        for (&display, &linear) in store.display_colors().iter().zip(store.linear_colors()) {
            assert_eq!(linear, lut.to_linear_color(display));
        }
    }

    #[test]
    fn add_reports_indices_and_full() {
        let lut = GammaLut::new();
        let mut store = PaletteStore::new();
        for (i, &color) in test_colors_256().iter().enumerate() {
            assert_eq!(store.add_color(&lut, color).unwrap(), i as u8);
        }
        assert_eq!(store.len(), 256);
        assert_eq!(
            store.add_color(&lut, Srgb::new(1, 2, 3)),
            Err(PaletteError::Full)
        );
        assert_eq!(store.len(), 256);
        assert_linear_derived(&store, &lut);
    }

    #[test]
    fn add_then_delete_restores_the_palette() {
        let lut = GammaLut::new();
        let store =
            PaletteStore::from_colors(&lut, &test_colors_256()[..7]).unwrap();

        let mut edited = store.clone();
        let index = edited.add_color(&lut, Srgb::new(12, 34, 56)).unwrap();
        edited.delete_color(usize::from(index)).unwrap();
        assert_eq!(edited, store);
    }

    #[test]
    fn delete_shifts_later_entries_down() {
        let lut = GammaLut::new();
        let colors = [
            Srgb::new(10u8, 0, 0),
            Srgb::new(0, 20, 0),
            Srgb::new(0, 0, 30),
        ];
        let mut store = PaletteStore::from_colors(&lut, &colors).unwrap();
        store.delete_color(1).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.srgb(0).unwrap(), colors[0]);
        assert_eq!(store.srgb(1).unwrap(), colors[2]);
        assert_linear_derived(&store, &lut);
    }

    #[test]
    fn out_of_range_edits_are_rejected() {
        let lut = GammaLut::new();
        let mut store = PaletteStore::from_colors(&lut, &[Srgb::new(1, 2, 3)]).unwrap();
        let untouched = store.clone();

        assert_eq!(
            store.set_color(&lut, 1, Srgb::new(9, 9, 9)),
            Err(PaletteError::InvalidIndex(1))
        );
        assert_eq!(store.delete_color(5), Err(PaletteError::InvalidIndex(5)));
        assert_eq!(store, untouched);
    }

    #[test]
    fn set_color_rederives_the_linear_form() {
        let lut = GammaLut::new();
        let mut store = PaletteStore::from_colors(&lut, &[Srgb::new(0, 0, 0)]).unwrap();
        store.set_color(&lut, 0, Srgb::new(200, 100, 50)).unwrap();
        assert_eq!(store.srgb(0).unwrap(), Srgb::new(200, 100, 50));
        assert_linear_derived(&store, &lut);
    }

    #[test]
    fn nearest_prefers_the_lowest_index_on_ties() {
        let lut = GammaLut::new();
        // two identical entries at 1 and 2: the probe is equidistant from both
        let colors = [
            Srgb::new(255u8, 255, 255),
            Srgb::new(100, 100, 100),
            Srgb::new(100, 100, 100),
        ];
        let store = PaletteStore::from_colors(&lut, &colors).unwrap();
        let probe = store.linear_colors()[1];
        assert_eq!(store.nearest(probe), Some(1));
    }

    #[test]
    fn nearest_finds_exact_matches_at_distance_zero() {
        let lut = GammaLut::new();
        let store =
            PaletteStore::from_colors(&lut, &test_colors_256()[..16]).unwrap();
        for (i, &linear) in store.linear_colors().iter().enumerate() {
            let found = store.nearest(linear).unwrap();
            // an earlier duplicate may shadow the entry, but always at distance 0
            assert!(usize::from(found) <= i);
            assert_eq!(store.linear_colors()[usize::from(found)], linear);
        }
    }

    #[test]
    fn nearest_agrees_with_a_brute_force_oracle() {
        let lut = GammaLut::new();
        let store =
            PaletteStore::from_colors(&lut, &test_colors_256()[..32]).unwrap();
        for probe in [
            Fixed3::splat(0),
            Fixed3::splat(crate::FIXED_MAX),
            Fixed3::new(1000, 20000, 5000),
            Fixed3::new(16384, 16384, 16384),
        ] {
            let expected = store
                .linear_colors()
                .iter()
                .enumerate()
                .min_by_key(|&(i, &c)| (probe.distance_squared(c), i))
                .map(|(i, _)| i as u8);
            assert_eq!(store.nearest(probe), expected);
        }
    }

    #[test]
    fn nearest_on_an_empty_palette_is_none() {
        let store = PaletteStore::new();
        assert_eq!(store.nearest(Fixed3::splat(0)), None);
    }

    #[test]
    fn sort_orders_by_hue_then_lightness() {
        let lut = GammaLut::new();
        let colors = [
            Srgb::new(0u8, 0, 255),  // blue, hue 240
            Srgb::new(255, 0, 0),    // red, hue 0, lightness 0.50
            Srgb::new(0, 255, 0),    // green, hue 120
            Srgb::new(128, 0, 0),    // dark red, hue 0, lightness 0.25
        ];
        let mut store = PaletteStore::from_colors(&lut, &colors).unwrap();
        store.sort(&lut);

        assert_eq!(store.srgb(0).unwrap(), Srgb::new(128, 0, 0));
        assert_eq!(store.srgb(1).unwrap(), Srgb::new(255, 0, 0));
        assert_eq!(store.srgb(2).unwrap(), Srgb::new(0, 255, 0));
        assert_eq!(store.srgb(3).unwrap(), Srgb::new(0, 0, 255));
        assert_linear_derived(&store, &lut);
    }
}
