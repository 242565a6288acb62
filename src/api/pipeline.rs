//! Contains the [`QuantizePipeline`] builder struct for the high level API.

use crate::{
    DiffusionKernel, DiffusionOptions, DitherMethod, ErrorDiffusionEngine, ErrorFraction, Fixed3,
    GammaLut, NearestPalette, PaletteStore, Quantizer, RasterSlice, ScanDirection, Threshold,
    FIXED_HALF, FIXED_MAX,
};
use palette::Srgba;
#[cfg(feature = "random")]
use crate::RandomOffset;
#[cfg(feature = "threads")]
use rayon::prelude::*;
#[cfg(feature = "image")]
use {crate::AboveMaxLen, image::RgbaImage, palette::cast::IntoComponents};

/// A builder struct to specify options to quantize an image against a palette
/// or a per-channel two-level output.
///
/// # Examples
/// To start, create a [`QuantizePipeline`] from a [`GammaLut`] and a pixel buffer
/// (or from an [`RgbaImage`] via [`QuantizePipeline::from_image`], with the
/// `image` feature):
/// ```
/// # use palettize::{QuantizePipeline, GammaLut, AboveMaxLen};
/// # use palette::Srgba;
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// let lut = GammaLut::new();
/// let pixels = vec![Srgba::new(0u8, 0, 0, 255); 12];
/// let mut pipeline = QuantizePipeline::new(&lut, pixels.as_slice().try_into()?, 4, 3)
///     .expect("dimensions match the pixel count");
/// # Ok(())
/// # }
/// ```
///
/// Then, you can change different options like the dither method or how the
/// diffused error behaves:
/// ```
/// # use palettize::{
/// #     QuantizePipeline, GammaLut, AboveMaxLen, DitherMethod, DiffusionKernel, ErrorFraction,
/// # };
/// # use palette::Srgba;
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// # let lut = GammaLut::new();
/// # let pixels = vec![Srgba::new(0u8, 0, 0, 255); 12];
/// # let mut pipeline = QuantizePipeline::new(&lut, pixels.as_slice().try_into()?, 4, 3).unwrap();
/// let pipeline = pipeline
///     .dither_method(DitherMethod::Diffusion(DiffusionKernel::SIERRA3))
///     .error_fraction(ErrorFraction::from_clamped(896))
///     .serpentine(true);
/// # Ok(())
/// # }
/// ```
///
/// Finally, run the pipeline with [`quantized`](Self::quantized) (or
/// [`quantized_par`](Self::quantized_par) with the `threads` feature).
///
/// Without a palette, every channel quantizes independently to two levels.
/// Setting a [`PaletteStore`] via [`palette`](Self::palette) switches all modes
/// to whole-color nearest-entry snapping; output pixels are then always exact
/// palette colors. The palette is read during the run and must not be edited
/// concurrently; edits belong between quantization passes.
#[must_use]
#[derive(Debug, Clone)]
pub struct QuantizePipeline<'a> {
    /// The gamma tables used at the raster and palette boundaries.
    lut: &'a GammaLut,
    /// The input image as a flat slice of pixels.
    pixels: RasterSlice<'a>,
    /// The dimensions of the image.
    dimensions: (u32, u32),
    /// The palette to quantize against, if any.
    palette: Option<&'a PaletteStore>,
    /// The dither method to use.
    method: DitherMethod,
    /// The fraction of quantization error diffused to neighbors.
    error_fraction: ErrorFraction,
    /// Whether the diffusion scan alternates direction.
    serpentine: bool,
    /// Scanlines between serpentine direction flips.
    serpentine_period: u32,
    /// The seed for the random dither mode.
    #[cfg(feature = "random")]
    seed: u64,
}

impl<'a> QuantizePipeline<'a> {
    /// Creates a new [`QuantizePipeline`] with default options
    /// and does not validate the size of the input slice.
    fn new_unchecked(lut: &'a GammaLut, pixels: RasterSlice<'a>, width: u32, height: u32) -> Self {
        Self {
            lut,
            pixels,
            dimensions: (width, height),
            palette: None,
            method: DitherMethod::default(),
            error_fraction: ErrorFraction::MAX,
            serpentine: false,
            serpentine_period: DiffusionOptions::DEFAULT_SERPENTINE_PERIOD,
            #[cfg(feature = "random")]
            seed: 0,
        }
    }

    /// Creates a new [`QuantizePipeline`] with default options.
    /// Returns `None` if the length of `pixels` is not equal to `width * height`.
    #[must_use]
    pub fn new(
        lut: &'a GammaLut,
        pixels: RasterSlice<'a>,
        width: u32,
        height: u32,
    ) -> Option<Self> {
        if pixels.len() == width as usize * height as usize {
            Some(Self::new_unchecked(lut, pixels, width, height))
        } else {
            None
        }
    }

    /// Sets the palette to quantize against.
    ///
    /// An empty palette behaves like no palette at all: the per-channel
    /// two-level output is used instead.
    ///
    /// By default no palette is set.
    pub fn palette(&mut self, palette: &'a PaletteStore) -> &mut Self {
        self.palette = Some(palette);
        self
    }

    /// Sets the dither method to use.
    ///
    /// See [`DitherMethod`] for more details.
    ///
    /// The default method is Floyd–Steinberg error diffusion.
    pub fn dither_method(&mut self, method: DitherMethod) -> &mut Self {
        self.method = method;
        self
    }

    /// Sets the fraction of quantization error that error diffusion spreads
    /// to neighboring pixels.
    ///
    /// [`ErrorFraction::MAX`] diffuses all of the error and may result in color
    /// bleed; smaller values tame the bleed at the cost of more banding.
    ///
    /// The default value is [`ErrorFraction::MAX`].
    pub fn error_fraction(&mut self, fraction: ErrorFraction) -> &mut Self {
        self.error_fraction = fraction;
        self
    }

    /// Sets whether the diffusion scan alternates direction while descending
    /// the image, which breaks up directional worm artifacts.
    ///
    /// The default value is `false`.
    pub fn serpentine(&mut self, enabled: bool) -> &mut Self {
        self.serpentine = enabled;
        self
    }

    /// Sets the number of scanlines between serpentine direction flips.
    ///
    /// The default value is [`DiffusionOptions::DEFAULT_SERPENTINE_PERIOD`].
    pub fn serpentine_period(&mut self, period: u32) -> &mut Self {
        self.serpentine_period = period;
        self
    }

    /// Sets the seed for the random dither mode.
    ///
    /// The default seed is `0`.
    #[cfg(feature = "random")]
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// The palette to snap to, if one is set and holds at least one color.
    fn active_palette(&self) -> Option<&'a PaletteStore> {
        self.palette.filter(|palette| !palette.is_empty())
    }

    /// The engine options specified by the current builder state.
    fn diffusion_options(&self) -> DiffusionOptions {
        DiffusionOptions::new()
            .error_fraction(self.error_fraction)
            .serpentine(self.serpentine)
            .serpentine_period(self.serpentine_period)
    }
}

impl<'a> QuantizePipeline<'a> {
    /// Runs the pipeline and returns the quantized image.
    ///
    /// The output has the same shape and channel layout as the input; alpha is
    /// carried through unmodified. A zero-sized image returns an empty buffer
    /// without creating any diffusion state.
    #[must_use]
    pub fn quantized(&self) -> Vec<Srgba<u8>> {
        let (width, height) = self.dimensions;
        if width == 0 || height == 0 {
            return Vec::new();
        }
        match self.method {
            DitherMethod::Clip => self.clip(),
            #[cfg(feature = "random")]
            DitherMethod::Random => self.random_pixels(&self.pixels, self.seed),
            DitherMethod::Diffusion(kernel) => match self.active_palette() {
                Some(palette) => self.diffuse_palette(kernel, palette),
                None => self.diffuse_channels(kernel),
            },
        }
    }

    /// Per-pixel snapping with no dithering.
    fn clip(&self) -> Vec<Srgba<u8>> {
        match self.active_palette() {
            Some(palette) => self
                .pixels
                .iter()
                .map(|&pixel| self.clip_palette_pixel(palette, pixel))
                .collect(),
            None => self
                .pixels
                .iter()
                .map(|&pixel| self.clip_threshold_pixel(pixel))
                .collect(),
        }
    }

    /// Snaps one pixel to the nearest entry of a non-empty palette.
    fn clip_palette_pixel(&self, palette: &PaletteStore, pixel: Srgba<u8>) -> Srgba<u8> {
        let (display, alpha) = Fixed3::from_raster(pixel);
        let linear = self.lut.to_linear_color(display);
        // the palette was checked to be non-empty
        let index = palette.nearest(linear).unwrap_or(0);
        palette.display_colors()[usize::from(index)].into_raster(alpha)
    }

    /// Snaps each channel of one pixel to the nearer of the two output levels.
    fn clip_threshold_pixel(&self, pixel: Srgba<u8>) -> Srgba<u8> {
        let (display, alpha) = Fixed3::from_raster(pixel);
        let linear = self.lut.to_linear_color(display);
        let quantized = linear.step(FIXED_HALF, 0, FIXED_MAX);
        self.lut.to_display_color(quantized).into_raster(alpha)
    }

    /// The random mode over a run of pixels, with its own noise stream.
    #[cfg(feature = "random")]
    fn random_pixels(&self, pixels: &[Srgba<u8>], seed: u64) -> Vec<Srgba<u8>> {
        match self.active_palette() {
            Some(palette) => {
                let mut quantizer = RandomOffset::new(NearestPalette::new(palette), seed);
                pixels
                    .iter()
                    .map(|&pixel| {
                        let (display, alpha) = Fixed3::from_raster(pixel);
                        quantizer.quantize(self.lut.to_linear_color(display));
                        let index = usize::from(quantizer.inner().last_index());
                        palette.display_colors()[index].into_raster(alpha)
                    })
                    .collect()
            }
            None => {
                let mut quantizer = RandomOffset::new(Threshold::linear_midpoint(), seed);
                pixels
                    .iter()
                    .map(|&pixel| {
                        let (display, alpha) = Fixed3::from_raster(pixel);
                        let quantized = quantizer.quantize(self.lut.to_linear_color(display));
                        self.lut.to_display_color(quantized).into_raster(alpha)
                    })
                    .collect()
            }
        }
    }

    /// Splits the image into per-channel planes of linear values.
    fn linear_planes(&self) -> ([Vec<i32>; 3], Vec<u8>) {
        let len = self.pixels.len();
        let mut planes = [vec![0i32; len], vec![0i32; len], vec![0i32; len]];
        let mut alphas = vec![0u8; len];
        for (i, &pixel) in self.pixels.iter().enumerate() {
            let (display, alpha) = Fixed3::from_raster(pixel);
            let linear = self.lut.to_linear_color(display);
            planes[0][i] = linear.0[0];
            planes[1][i] = linear.0[1];
            planes[2][i] = linear.0[2];
            alphas[i] = alpha;
        }
        (planes, alphas)
    }

    /// Recombines quantized linear planes into display pixels.
    fn pack_planes(&self, planes: &[Vec<i32>; 3], alphas: &[u8]) -> Vec<Srgba<u8>> {
        alphas
            .iter()
            .enumerate()
            .map(|(i, &alpha)| {
                let linear = Fixed3::new(planes[0][i], planes[1][i], planes[2][i]);
                self.lut.to_display_color(linear).into_raster(alpha)
            })
            .collect()
    }

    /// Error diffusion of a single channel plane, in place.
    fn diffuse_plane(
        kernel: DiffusionKernel,
        options: DiffusionOptions,
        width: u32,
        plane: &mut [i32],
    ) {
        let mut engine = ErrorDiffusionEngine::new(kernel, width, options);
        let mut threshold = Threshold::linear_midpoint();
        for row in plane.chunks_exact_mut(width as usize) {
            match engine.direction() {
                ScanDirection::Forward => {
                    for value in row.iter_mut() {
                        *value = engine.diffuse(*value, &mut threshold);
                    }
                }
                ScanDirection::Reverse => {
                    for value in row.iter_mut().rev() {
                        *value = engine.diffuse(*value, &mut threshold);
                    }
                }
            }
            engine.end_of_row();
        }
    }

    /// Error diffusion with one engine per color channel and a two-level output.
    fn diffuse_channels(&self, kernel: DiffusionKernel) -> Vec<Srgba<u8>> {
        let (mut planes, alphas) = self.linear_planes();
        let options = self.diffusion_options();
        let width = self.dimensions.0;
        for plane in &mut planes {
            Self::diffuse_plane(kernel, options, width, plane);
        }
        self.pack_planes(&planes, &alphas)
    }

    /// Error diffusion with a single 3-vector engine snapping to palette entries.
    fn diffuse_palette(&self, kernel: DiffusionKernel, palette: &PaletteStore) -> Vec<Srgba<u8>> {
        let width = self.dimensions.0;
        let w = width as usize;
        let mut engine = ErrorDiffusionEngine::<Fixed3>::new(kernel, width, self.diffusion_options());
        let mut quantizer = NearestPalette::new(palette);
        let mut out = vec![Srgba::new(0, 0, 0, 0); self.pixels.len()];

        for (row, out_row) in self.pixels.chunks_exact(w).zip(out.chunks_exact_mut(w)) {
            match engine.direction() {
                ScanDirection::Forward => {
                    for x in 0..w {
                        out_row[x] =
                            self.palette_pixel(palette, &mut engine, &mut quantizer, row[x]);
                    }
                }
                ScanDirection::Reverse => {
                    for x in (0..w).rev() {
                        out_row[x] =
                            self.palette_pixel(palette, &mut engine, &mut quantizer, row[x]);
                    }
                }
            }
            engine.end_of_row();
        }
        out
    }

    /// Diffuses one pixel and writes the exact display form of the chosen entry.
    fn palette_pixel(
        &self,
        palette: &PaletteStore,
        engine: &mut ErrorDiffusionEngine<Fixed3>,
        quantizer: &mut NearestPalette<'_>,
        pixel: Srgba<u8>,
    ) -> Srgba<u8> {
        let (display, alpha) = Fixed3::from_raster(pixel);
        engine.diffuse(self.lut.to_linear_color(display), quantizer);
        let index = usize::from(quantizer.last_index());
        palette.display_colors()[index].into_raster(alpha)
    }
}

#[cfg(feature = "threads")]
impl<'a> QuantizePipeline<'a> {
    /// Runs the pipeline in parallel and returns the quantized image.
    ///
    /// Independent color channels are the only safe parallelism axis of error
    /// diffusion, so the per-channel modes run one channel per thread and
    /// produce output identical to [`quantized`](Self::quantized).
    /// Palette-mode diffusion has a strict whole-color raster dependency and
    /// runs sequentially. The random mode uses an independent noise stream per
    /// row, so its output differs from the sequential run.
    #[must_use]
    pub fn quantized_par(&self) -> Vec<Srgba<u8>> {
        let (width, height) = self.dimensions;
        if width == 0 || height == 0 {
            return Vec::new();
        }
        match self.method {
            DitherMethod::Clip => self.clip_par(),
            #[cfg(feature = "random")]
            DitherMethod::Random => self.random_par(),
            DitherMethod::Diffusion(kernel) => match self.active_palette() {
                Some(palette) => self.diffuse_palette(kernel, palette),
                None => self.diffuse_channels_par(kernel),
            },
        }
    }

    /// Per-pixel snapping across threads.
    fn clip_par(&self) -> Vec<Srgba<u8>> {
        match self.active_palette() {
            Some(palette) => self
                .pixels
                .par_iter()
                .map(|&pixel| self.clip_palette_pixel(palette, pixel))
                .collect(),
            None => self
                .pixels
                .par_iter()
                .map(|&pixel| self.clip_threshold_pixel(pixel))
                .collect(),
        }
    }

    /// The random mode with one noise stream per row.
    #[cfg(feature = "random")]
    fn random_par(&self) -> Vec<Srgba<u8>> {
        let width = self.dimensions.0 as usize;
        self.pixels
            .par_chunks(width)
            .enumerate()
            .map(|(y, row)| self.random_pixels(row, self.seed.wrapping_add(y as u64)))
            .collect::<Vec<_>>()
            .concat()
    }

    /// Error diffusion with the three channel engines running concurrently.
    fn diffuse_channels_par(&self, kernel: DiffusionKernel) -> Vec<Srgba<u8>> {
        let (mut planes, alphas) = self.linear_planes();
        let options = self.diffusion_options();
        let width = self.dimensions.0;
        planes
            .par_iter_mut()
            .for_each(|plane| Self::diffuse_plane(kernel, options, width, plane));
        self.pack_planes(&planes, &alphas)
    }
}

#[cfg(feature = "image")]
impl<'a> QuantizePipeline<'a> {
    /// Creates a new [`QuantizePipeline`] with default options from an image.
    ///
    /// # Errors
    /// Returns an error if the image holds more than
    /// [`MAX_PIXELS`](crate::MAX_PIXELS) pixels.
    pub fn from_image(lut: &'a GammaLut, image: &'a RgbaImage) -> Result<Self, AboveMaxLen<u32>> {
        Ok(Self::new_unchecked(
            lut,
            image.try_into()?,
            image.width(),
            image.height(),
        ))
    }

    /// Runs the pipeline and returns the quantized image as an [`RgbaImage`].
    #[must_use]
    pub fn quantized_rgbaimage(&self) -> RgbaImage {
        let (width, height) = self.dimensions;
        let buf = self.quantized().into_components();

        #[allow(clippy::expect_used)]
        {
            // quantized() returns width * height pixels by construction
            RgbaImage::from_vec(width, height, buf).expect("large enough buffer")
        }
    }
}

#[cfg(all(feature = "threads", feature = "image"))]
impl<'a> QuantizePipeline<'a> {
    /// Runs the pipeline in parallel and returns the quantized image as an
    /// [`RgbaImage`].
    #[must_use]
    pub fn quantized_rgbaimage_par(&self) -> RgbaImage {
        let (width, height) = self.dimensions;
        let buf = self.quantized_par().into_components();

        #[allow(clippy::expect_used)]
        {
            // quantized_par() returns width * height pixels by construction
            RgbaImage::from_vec(width, height, buf).expect("large enough buffer")
        }
    }
}
