use std::time::Duration;

use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode,
};
use palette::{Srgb, Srgba};
use palettize::{DiffusionKernel, DitherMethod, GammaLut, PaletteStore, QuantizePipeline};

const SIZE: u32 = 512;

fn gradient_raster(width: u32, height: u32) -> Vec<Srgba<u8>> {
    (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let b = ((x + y) * 255 / (width + height).max(1)) as u8;
                Srgba::new(r, g, b, 255)
            })
        })
        .collect()
}

fn bench_palette(lut: &GammaLut) -> PaletteStore {
    let colors: Vec<Srgb<u8>> = (0..16)
        .map(|i| {
            let v = i * 17;
            Srgb::new(v, 255 - v, v / 2)
        })
        .collect();
    PaletteStore::from_colors(lut, &colors).unwrap()
}

fn kernels() -> [(&'static str, DiffusionKernel); 3] {
    [
        ("floyd_steinberg", DiffusionKernel::FLOYD_STEINBERG),
        ("jarvis_judice_ninke", DiffusionKernel::JARVIS_JUDICE_NINKE),
        ("sierra3", DiffusionKernel::SIERRA3),
    ]
}

fn dither_channels(c: &mut Criterion) {
    let lut = GammaLut::new();
    let pixels = gradient_raster(SIZE, SIZE);

    let mut group = c.benchmark_group("dither_channels");
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_secs(2));

    for (name, kernel) in kernels() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &kernel, |b, &kernel| {
            let mut pipeline =
                QuantizePipeline::new(&lut, pixels.as_slice().try_into().unwrap(), SIZE, SIZE)
                    .unwrap();
            pipeline.dither_method(DitherMethod::Diffusion(kernel));
            b.iter(|| black_box(pipeline.quantized()));
        });
    }
    group.finish();
}

fn dither_palette(c: &mut Criterion) {
    let lut = GammaLut::new();
    let palette = bench_palette(&lut);
    let pixels = gradient_raster(SIZE, SIZE);

    let mut group = c.benchmark_group("dither_palette");
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_secs(2));

    for (name, kernel) in kernels() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &kernel, |b, &kernel| {
            let mut pipeline =
                QuantizePipeline::new(&lut, pixels.as_slice().try_into().unwrap(), SIZE, SIZE)
                    .unwrap();
            pipeline
                .palette(&palette)
                .dither_method(DitherMethod::Diffusion(kernel));
            b.iter(|| black_box(pipeline.quantized()));
        });
    }
    group.finish();
}

criterion_group!(benches, dither_channels, dither_palette);
criterion_main!(benches);
