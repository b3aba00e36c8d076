#![recursion_limit = "256"]

use std::hint::black_box;

use burn::tensor::backend::Backend as BackendTrait;
use burn_ndarray::NdArray;
use burn_texture_cvae::model::one_hot_batch;
use burn_texture_cvae::{Cvae, CvaeConfig, init_wgpu_runtime, tensor_to_images};
use burn_wgpu::Wgpu;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

#[cfg(feature = "cuda")]
use burn_cuda::Cuda;

#[derive(Clone, Copy)]
struct DecodeConfig {
    name: &'static str,
    classes: usize,
    img: usize,
}

const DECODE_CONFIGS: &[DecodeConfig] = &[
    DecodeConfig {
        name: "c8_img32",
        classes: 8,
        img: 32,
    },
    DecodeConfig {
        name: "c32_img32",
        classes: 32,
        img: 32,
    },
    DecodeConfig {
        name: "c16_img64",
        classes: 16,
        img: 64,
    },
];

const Z_DIM: usize = 64;

fn generate_bench(c: &mut Criterion) {
    run_generate_backend::<NdArray<f32>, _>(c, "ndarray", |_| {});
    run_generate_backend::<Wgpu<f32>, _>(c, "wgpu", init_wgpu_runtime);

    #[cfg(feature = "cuda")]
    run_generate_backend::<Cuda<f32>, _>(c, "cuda", |_| {});
}

fn run_generate_backend<B, Init>(c: &mut Criterion, backend_name: &'static str, init_backend: Init)
where
    B: BackendTrait,
    Init: Fn(&<B as BackendTrait>::Device),
{
    let device = <B as BackendTrait>::Device::default();
    init_backend(&device);
    <B as BackendTrait>::seed(&device, 42);

    let mut group = c.benchmark_group(format!("cvae_generate_all/{backend_name}"));
    for cfg in DECODE_CONFIGS {
        let model = Cvae::<B>::new(&CvaeConfig::new(Z_DIM, cfg.classes, cfg.img), &device);
        let indices: Vec<usize> = (0..cfg.classes).collect();

        // Warm-up so kernel compilation is not measured.
        let warm = model.sample(one_hot_batch::<B>(&indices, cfg.classes, &device));
        tensor_to_images(warm).expect("warm-up images");

        group.throughput(Throughput::Elements(cfg.classes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(cfg.name), cfg, |b, cfg| {
            b.iter(|| {
                let conditions = one_hot_batch::<B>(&indices, cfg.classes, &device);
                let images = tensor_to_images(model.sample(conditions)).expect("images");
                black_box(images);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, generate_bench);
criterion_main!(benches);
