//! A library for gamma-correct color quantization and error diffusion dithering.
//!
//! `palettize` reduces full-color images to small palettes (or to two levels per
//! channel) while minimizing visible banding. All color distance and error
//! diffusion math happens in linear light; gamma-encoded pixels are converted
//! through precomputed lookup tables at the raster boundaries only.
//!
//! # Features
//! To reduce dependencies and compile times, `palettize` has several `cargo` features
//! that can be turned off or on:
//! - `pipelines`: exposes the [`QuantizePipeline`] builder struct that serves as the high-level API.
//! - `threads`: exposes parallel versions of the quantization modes via [`rayon`].
//! - `image`: enables integration with the [`image`] crate.
//! - `random`: adds the legacy random-offset dither mode and its RNG dependencies.
//!
//! # High-Level API
//! To get started with the high-level API, see [`QuantizePipeline`].
//! Here is a quick example that snaps a tiny gray image to a black/white palette
//! with Floyd–Steinberg dithering:
//! ```
//! # use palettize::{
//! #     AboveMaxLen, DiffusionKernel, DitherMethod, GammaLut, PaletteStore, QuantizePipeline,
//! # };
//! # use palette::{Srgb, Srgba};
//! # fn main() -> Result<(), AboveMaxLen<u32>> {
//! let lut = GammaLut::new();
//!
//! let mut palette = PaletteStore::new();
//! let _ = palette.add_color(&lut, Srgb::new(0, 0, 0));
//! let _ = palette.add_color(&lut, Srgb::new(255, 255, 255));
//!
//! let pixels = vec![Srgba::new(128, 128, 128, 255); 16];
//! let mut pipeline = QuantizePipeline::new(&lut, pixels.as_slice().try_into()?, 4, 4)
//!     .expect("dimensions match the pixel count");
//!
//! let quantized = pipeline
//!     .palette(&palette)
//!     .dither_method(DitherMethod::Diffusion(DiffusionKernel::FLOYD_STEINBERG))
//!     .quantized();
//! # assert_eq!(quantized.len(), 16);
//! # Ok(())
//! # }
//! ```
//!
//! Note that some of the options and functions above require certain features to be enabled.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod color;
mod diffuse;
mod gamma;
mod kernel;
mod palette_store;
mod quantizer;
mod traits;
mod types;

#[cfg(feature = "pipelines")]
mod api;

pub use color::*;
pub use diffuse::*;
pub use gamma::*;
pub use kernel::*;
pub use palette_store::*;
pub use quantizer::*;
pub use traits::*;
pub use types::*;

#[cfg(feature = "pipelines")]
pub use api::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of palette colors is `256`.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

/// `MAX_COLORS` as a `usize` for array and `Vec` lengths.
pub(crate) const MAX_K: usize = MAX_COLORS as usize;

#[cfg(test)]
mod tests {
    use palette::{Srgb, Srgba};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    pub fn test_colors_256() -> Vec<Srgb<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(42);
        (0..256)
            .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
            .collect()
    }

    pub fn test_raster(width: u32, height: u32) -> Vec<Srgba<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(123);
        (0..(width as usize * height as usize))
            .map(|_| Srgba::new(rng.gen(), rng.gen(), rng.gen(), 255))
            .collect()
    }

    pub fn flat_raster(width: u32, height: u32, gray: u8) -> Vec<Srgba<u8>> {
        vec![Srgba::new(gray, gray, gray, 255); width as usize * height as usize]
    }
}
