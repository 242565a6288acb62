//! Contains the types and functions for the high level pipeline builder API.

mod pipeline;

pub use pipeline::QuantizePipeline;

use crate::DiffusionKernel;

/// The set of supported dither methods.
///
/// If the `random` feature is enabled, then support will be added for the
/// legacy random-offset mode. See the descriptions on each enum variant for
/// more information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DitherMethod {
    /// Plain per-pixel quantization with no dithering.
    ///
    /// Each pixel snaps to the nearest palette entry, or each channel to the
    /// nearer of the two output levels when no palette is set. Fast, but flat
    /// regions band visibly.
    Clip,
    /// The legacy random mode: each pixel is perturbed with seeded uniform
    /// noise before the same snapping step as [`DitherMethod::Clip`].
    ///
    /// No state carries between pixels, so there are no diffusion artifacts,
    /// at the price of a noisier result.
    #[cfg(feature = "random")]
    Random,
    /// Error diffusion with the given kernel: each pixel's quantization error
    /// is carried into the not-yet-processed neighbors.
    ///
    /// This gives the smoothest gradients; see [`DiffusionKernel`] for the
    /// available presets.
    Diffusion(DiffusionKernel),
}

impl Default for DitherMethod {
    fn default() -> Self {
        Self::Diffusion(DiffusionKernel::FLOYD_STEINBERG)
    }
}

impl From<DiffusionKernel> for DitherMethod {
    fn from(kernel: DiffusionKernel) -> Self {
        Self::Diffusion(kernel)
    }
}
