#![recursion_limit = "256"]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use burn_wgpu::Wgpu;
use clap::Parser;
use tracing::info;

#[cfg(feature = "cuda")]
use burn_cuda::Cuda;

use burn_texture_cvae::{
    BackendArg, TextureConfig, TextureGenerator, apply_transitions, encode_png_base64,
    init_tracing, init_wgpu_runtime, load_config,
};
use indexmap::IndexMap;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sample textures from a trained checkpoint as base64 PNG JSON")]
struct Args {
    /// Additional configuration files applied in order (later files override earlier ones).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Vec<PathBuf>,
    /// Backend used for inference.
    #[arg(long, value_enum, default_value_t = BackendArg::Ndarray)]
    backend: BackendArg,
    /// Classes to sample; every class and every configured transition when omitted.
    #[arg(long = "class", value_name = "NAME")]
    classes: Vec<String>,
    /// JSON file to write instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config_paths = vec![PathBuf::from("config/base.toml")];
    config_paths.extend(args.config.clone());
    let config = load_config(&config_paths)?;

    match args.backend {
        BackendArg::Ndarray => generate_backend::<NdArray<f32>, _>(&config, &args, |_| {}),
        BackendArg::Wgpu => generate_backend::<Wgpu<f32>, _>(&config, &args, init_wgpu_runtime),
        BackendArg::Cuda => {
            #[cfg(feature = "cuda")]
            {
                generate_backend::<Cuda<f32>, _>(&config, &args, |_| {})
            }
            #[cfg(not(feature = "cuda"))]
            {
                Err(anyhow!(burn_texture_cvae::backend::CUDA_UNAVAILABLE))
            }
        }
    }
}

fn generate_backend<B, Init>(config: &TextureConfig, args: &Args, init_backend: Init) -> Result<()>
where
    B: Backend,
    Init: Fn(&B::Device),
{
    let device = B::Device::default();
    init_backend(&device);

    let generator = TextureGenerator::<B>::load(&config.artifacts, &device)?;
    let images = if args.classes.is_empty() {
        let mut images = generator.generate_all()?;
        apply_transitions(&mut images, &config.server.transitions)?;
        images
    } else {
        generator.generate_many(&args.classes)?
    };

    let encoded = images
        .iter()
        .map(|(name, image)| Ok((name.clone(), encode_png_base64(image)?)))
        .collect::<Result<IndexMap<_, _>>>()?;
    let json = serde_json::to_string_pretty(&encoded).context("failed to serialize textures")?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(
                "Wrote {} textures to {} using the {} backend",
                encoded.len(),
                path.display(),
                args.backend.name()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
