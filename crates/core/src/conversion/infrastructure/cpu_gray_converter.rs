use crate::conversion::domain::gray_converter::GrayConverter;
use crate::shared::frame::Frame;

/// BT.601 luma in 14-bit fixed point, matching OpenCV's RGB→GRAY weights.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;
const ROUND: u32 = 1 << (SHIFT - 1);

#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * R_WEIGHT + g as u32 * G_WEIGHT + b as u32 * B_WEIGHT + ROUND) >> SHIFT) as u8
}

/// Pure-software gray conversion. Always available.
pub struct CpuGrayConverter;

impl CpuGrayConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpuGrayConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl GrayConverter for CpuGrayConverter {
    fn to_gray(&self, frame: &Frame) -> Result<Frame, Box<dyn std::error::Error>> {
        match frame.channels() {
            1 => Ok(frame.clone()),
            3 => {
                let pixels = frame.as_ndarray();
                let gray: Vec<u8> = pixels
                    .rows()
                    .into_iter()
                    .map(|px| luma(px[0], px[1], px[2]))
                    .collect();
                Ok(Frame::new(
                    gray,
                    frame.width(),
                    frame.height(),
                    1,
                    frame.index(),
                ))
            }
            n => Err(format!("unsupported channel count for gray conversion: {n}").into()),
        }
    }

    fn backend(&self) -> &'static str {
        "cpu"
    }
}
