#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use burn_wgpu::Wgpu;
use clap::Parser;
use tracing::info;

#[cfg(feature = "cuda")]
use burn_cuda::Cuda;

use burn_texture_cvae::server::{self, AppState, GeneratorHandle};
use burn_texture_cvae::{BackendArg, TextureConfig, init_tracing, init_wgpu_runtime, load_config};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve generated textures over HTTP")]
struct Args {
    /// Additional configuration files applied in order (later files override earlier ones).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Vec<PathBuf>,
    /// Backend used for inference.
    #[arg(long, value_enum, default_value_t = BackendArg::Ndarray)]
    backend: BackendArg,
    /// Listen address; overrides `server.bind`.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
    /// Overrides `artifacts.checkpoint`.
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<PathBuf>,
    /// Overrides `artifacts.metadata`.
    #[arg(long, value_name = "PATH")]
    metadata: Option<PathBuf>,
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
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(checkpoint) = args.checkpoint {
        config.artifacts.checkpoint = checkpoint;
    }
    if let Some(metadata) = args.metadata {
        config.artifacts.metadata = metadata;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    match args.backend {
        BackendArg::Ndarray => {
            runtime.block_on(serve_backend::<NdArray<f32>, _>(config, args.backend, |_| {}))
        }
        BackendArg::Wgpu => runtime.block_on(serve_backend::<Wgpu<f32>, _>(
            config,
            args.backend,
            init_wgpu_runtime,
        )),
        BackendArg::Cuda => {
            #[cfg(feature = "cuda")]
            {
                runtime.block_on(serve_backend::<Cuda<f32>, _>(config, args.backend, |_| {}))
            }
            #[cfg(not(feature = "cuda"))]
            {
                Err(anyhow!(burn_texture_cvae::backend::CUDA_UNAVAILABLE))
            }
        }
    }
}

async fn serve_backend<B, Init>(
    config: TextureConfig,
    backend: BackendArg,
    init_backend: Init,
) -> Result<()>
where
    B: Backend,
    Init: Fn(&B::Device),
{
    let device = B::Device::default();
    init_backend(&device);
    info!(
        "Loading {} and {} on the {} backend",
        config.artifacts.metadata.display(),
        config.artifacts.checkpoint.display(),
        backend.name()
    );

    let generator = GeneratorHandle::spawn::<B>(
        config.artifacts.clone(),
        device,
        config.server.queue_capacity,
    )
    .await?;
    let state = AppState::new(generator, &config.server);
    server::serve(&config.server.bind, state).await
}
