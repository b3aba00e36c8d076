use std::env;

use burn::tensor::backend::Backend as BackendTrait;
use burn_wgpu::{self, MemoryConfiguration, RuntimeOptions, Wgpu, graphics};
use clap::ValueEnum;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Compute backend selectable from the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Ndarray,
    Wgpu,
    Cuda,
}

impl BackendArg {
    pub fn name(self) -> &'static str {
        match self {
            BackendArg::Ndarray => "ndarray",
            BackendArg::Wgpu => "wgpu",
            BackendArg::Cuda => "cuda",
        }
    }
}

/// The concrete device type used by the `Wgpu<f32>` backend.
pub type WgpuDevice = <Wgpu<f32> as BackendTrait>::Device;

pub const CUDA_UNAVAILABLE: &str =
    "cuda backend selected but this build lacks `cuda` feature; rebuild with `--features cuda`";

/// Install the global `tracing` subscriber, honouring `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Initialize the global wgpu runtime using environment-driven overrides.
///
/// Environment variables:
/// * `TEXTURE_WGPU_BACKEND` - `auto` (default), `vulkan`, `dx12`, `metal`, or `opengl`.
/// * `TEXTURE_WGPU_TASKS_MAX` - maximum aggregated tasks per GPU submit.
/// * `TEXTURE_WGPU_MEMORY` - `subslices` (default) or `exclusive` pages.
pub fn init_wgpu_runtime(device: &WgpuDevice) {
    if matches!(device, WgpuDevice::Existing(_)) {
        return;
    }

    let options = runtime_options();
    match graphics_override() {
        GraphicsApi::Auto => {
            burn_wgpu::init_setup::<graphics::AutoGraphicsApi>(device, options);
        }
        GraphicsApi::Vulkan => {
            burn_wgpu::init_setup::<graphics::Vulkan>(device, options);
        }
        GraphicsApi::Dx12 => {
            burn_wgpu::init_setup::<graphics::Dx12>(device, options);
        }
        GraphicsApi::Metal => {
            burn_wgpu::init_setup::<graphics::Metal>(device, options);
        }
        GraphicsApi::OpenGl => {
            burn_wgpu::init_setup::<graphics::OpenGl>(device, options);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum GraphicsApi {
    Auto,
    Vulkan,
    Dx12,
    Metal,
    OpenGl,
}

fn graphics_override() -> GraphicsApi {
    let value = env::var("TEXTURE_WGPU_BACKEND").unwrap_or_default();
    parse_graphics_api(&value).unwrap_or_else(|| {
        warn!("Unsupported TEXTURE_WGPU_BACKEND value '{value}', using auto.");
        GraphicsApi::Auto
    })
}

fn parse_graphics_api(value: &str) -> Option<GraphicsApi> {
    let api = match value.to_ascii_lowercase().as_str() {
        "auto" | "" => GraphicsApi::Auto,
        "vulkan" => GraphicsApi::Vulkan,
        "dx12" | "directx" => GraphicsApi::Dx12,
        "metal" => GraphicsApi::Metal,
        "opengl" | "gl" => GraphicsApi::OpenGl,
        _ => return None,
    };
    Some(api)
}

/// Empty selects `subslices`.
fn parse_memory_config(value: &str) -> Option<MemoryConfiguration> {
    match value.to_ascii_lowercase().as_str() {
        "subslices" | "" => Some(MemoryConfiguration::SubSlices),
        "exclusive" => Some(MemoryConfiguration::ExclusivePages),
        _ => None,
    }
}

fn runtime_options() -> RuntimeOptions {
    let defaults = RuntimeOptions::default();
    let tasks_max = env::var("TEXTURE_WGPU_TASKS_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(defaults.tasks_max);

    let memory = env::var("TEXTURE_WGPU_MEMORY").unwrap_or_default();
    let memory_config = parse_memory_config(&memory).unwrap_or_else(|| {
        warn!("Unsupported TEXTURE_WGPU_MEMORY value '{memory}', using subslices.");
        MemoryConfiguration::SubSlices
    });

    RuntimeOptions {
        tasks_max,
        memory_config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphics_api_names_are_case_insensitive() {
        assert!(matches!(parse_graphics_api(""), Some(GraphicsApi::Auto)));
        assert!(matches!(parse_graphics_api("Vulkan"), Some(GraphicsApi::Vulkan)));
        assert!(matches!(parse_graphics_api("directx"), Some(GraphicsApi::Dx12)));
        assert!(matches!(parse_graphics_api("GL"), Some(GraphicsApi::OpenGl)));
        assert!(parse_graphics_api("glide").is_none());
    }

    #[test]
    fn memory_config_defaults_to_subslices() {
        assert!(matches!(
            parse_memory_config(""),
            Some(MemoryConfiguration::SubSlices)
        ));
        assert!(matches!(
            parse_memory_config("EXCLUSIVE"),
            Some(MemoryConfiguration::ExclusivePages)
        ));
        assert!(parse_memory_config("pooled").is_none());
    }
}
