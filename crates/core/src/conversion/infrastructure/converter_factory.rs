use std::sync::Arc;

use crate::conversion::domain::gray_converter::GrayConverter;

use super::cpu_gray_converter::CpuGrayConverter;
use super::gpu_context::GpuContext;
use super::gpu_gray_converter::GpuGrayConverter;

/// Gray conversion backend preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrayBackend {
    /// Use the GPU when an adapter can be initialised, otherwise the CPU.
    Auto,
    Cpu,
}

/// Creates the best available gray converter, preferring GPU when available.
///
/// Probes for a wgpu adapter once. If one is found, returns a GPU converter
/// (which itself falls back to the CPU per frame); otherwise returns the CPU
/// implementation. Logs which backend is selected.
pub fn create_gray_converter(backend: GrayBackend) -> Box<dyn GrayConverter> {
    let converter: Box<dyn GrayConverter> = match backend {
        GrayBackend::Cpu => {
            log::info!("GPU probe skipped");
            Box::new(CpuGrayConverter::new())
        }
        GrayBackend::Auto => match GpuContext::new() {
            Some(ctx) => {
                log::info!("GPU acceleration available ({})", ctx.adapter_name);
                Box::new(GpuGrayConverter::new(Arc::new(ctx)))
            }
            None => {
                log::info!("No GPU adapter found");
                Box::new(CpuGrayConverter::new())
            }
        },
    };
    log::info!("Using {} gray conversion", converter.backend());
    converter
}
