use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::conversion::domain::gray_converter::GrayConverter;
use crate::shared::frame::Frame;

use super::cpu_gray_converter::CpuGrayConverter;
use super::gpu_context::GpuContext;

/// GPU gray converter using a wgpu compute shader.
///
/// Any failure on the GPU path is downgraded to a log line and the frame is
/// converted on the CPU instead; the next frame tries the GPU again.
pub struct GpuGrayConverter {
    ctx: Arc<GpuContext>,
    fallback: CpuGrayConverter,
    warned: AtomicBool,
}

impl GpuGrayConverter {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx,
            fallback: CpuGrayConverter::new(),
            warned: AtomicBool::new(false),
        }
    }

    fn log_fallback(&self, frame: &Frame, err: &dyn std::error::Error) {
        if self.warned.swap(true, Ordering::Relaxed) {
            log::debug!(
                "GPU conversion failed for frame {}, using CPU: {err}",
                frame.index()
            );
        } else {
            log::warn!(
                "GPU conversion failed for frame {}, using CPU for this frame: {err}",
                frame.index()
            );
        }
    }
}

impl GrayConverter for GpuGrayConverter {
    fn to_gray(&self, frame: &Frame) -> Result<Frame, Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return self.fallback.to_gray(frame);
        }

        match self
            .ctx
            .rgb_to_gray(frame.data(), frame.width(), frame.height())
        {
            Ok(gray) => Ok(Frame::new(
                gray,
                frame.width(),
                frame.height(),
                1,
                frame.index(),
            )),
            Err(e) => {
                self.log_fallback(frame, e.as_ref());
                self.fallback.to_gray(frame)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "gpu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_gpu_context() -> Option<Arc<GpuContext>> {
        GpuContext::new().map(Arc::new)
    }

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 7 % 256) as u8);
                data.push((y * 13 % 256) as u8);
                data.push(((x + y) * 3 % 256) as u8);
            }
        }
        Frame::new(data, width, height, 3, 9)
    }

    #[test]
    fn test_matches_cpu_output() {
        let ctx = match try_gpu_context() {
            Some(c) => c,
            None => return,
        };
        // Odd width exercises the padded tail of the packed input.
        let frame = gradient_frame(37, 21);
        let gpu = GpuGrayConverter::new(ctx).to_gray(&frame).unwrap();
        let cpu = CpuGrayConverter::new().to_gray(&frame).unwrap();
        assert_eq!(gpu.channels(), 1);
        assert_eq!(gpu.index(), 9);
        assert_eq!(gpu.data(), cpu.data());
    }

    #[test]
    fn test_gray_input_passes_through() {
        let ctx = match try_gpu_context() {
            Some(c) => c,
            None => return,
        };
        let frame = Frame::new(vec![5, 6, 7, 8], 2, 2, 1, 0);
        let gray = GpuGrayConverter::new(ctx).to_gray(&frame).unwrap();
        assert_eq!(gray.data(), frame.data());
    }

    #[test]
    fn test_rgb_to_gray_rejects_mismatched_buffer() {
        let ctx = match try_gpu_context() {
            Some(c) => c,
            None => return,
        };
        assert!(ctx.rgb_to_gray(&[0u8; 10], 2, 2).is_err());
    }

    #[test]
    fn test_backend_name() {
        let ctx = match try_gpu_context() {
            Some(c) => c,
            None => return,
        };
        assert_eq!(GpuGrayConverter::new(ctx).backend(), "gpu");
    }
}
