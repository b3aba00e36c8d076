#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use burn::tensor::backend::AutodiffBackend;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use burn_wgpu::Wgpu;
use clap::Parser;
use tracing::info;

#[cfg(feature = "cuda")]
use burn_cuda::Cuda;

use burn_texture_cvae::{BackendArg, TextureConfig, init_tracing, init_wgpu_runtime, load_config, train};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the texture CVAE on a folder of class directories")]
struct Args {
    /// Additional configuration files applied in order (later files override earlier ones).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Vec<PathBuf>,
    /// Backend to use for training.
    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    backend: BackendArg,
    /// Dataset root; overrides `dataset.root`.
    #[arg(long, value_name = "DIR")]
    dataset: Option<PathBuf>,
    /// Overrides `training.epochs`.
    #[arg(long)]
    epochs: Option<usize>,
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
    let mut config = load_config(&config_paths)?;
    if let Some(root) = args.dataset {
        config.dataset.root = root;
    }
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }

    match args.backend {
        BackendArg::Ndarray => {
            train_backend::<Autodiff<NdArray<f32>>, _>(&config, args.backend, |_| {})
        }
        BackendArg::Wgpu => {
            train_backend::<Autodiff<Wgpu<f32>>, _>(&config, args.backend, init_wgpu_runtime)
        }
        BackendArg::Cuda => {
            #[cfg(feature = "cuda")]
            {
                train_backend::<Autodiff<Cuda<f32>>, _>(&config, args.backend, |_| {})
            }
            #[cfg(not(feature = "cuda"))]
            {
                Err(anyhow!(burn_texture_cvae::backend::CUDA_UNAVAILABLE))
            }
        }
    }
}

fn train_backend<B, Init>(config: &TextureConfig, backend: BackendArg, init_backend: Init) -> Result<()>
where
    B: AutodiffBackend,
    Init: Fn(&B::Device),
{
    let device = B::Device::default();
    init_backend(&device);
    info!("Training on the {} backend", backend.name());

    let summary = train::<B>(config, &device)?;
    match summary.final_loss {
        Some(loss) => info!(
            "Trained {} epochs on {} classes{}; final loss {loss:.6}",
            summary.epochs,
            summary.metadata.num_classes,
            if summary.resumed { " (resumed)" } else { "" }
        ),
        None => info!("No epochs configured; checkpoint written unchanged"),
    }
    Ok(())
}
