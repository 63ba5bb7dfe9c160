use ndarray::{s, ArrayView3};

use crate::shared::region::Region;

/// A single decoded frame: contiguous pixel bytes in row-major order.
///
/// Color frames are RGB24 (3 channels); the detection working copy is
/// single-channel luma. `index` is the frame's position in the source video.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the part of the frame covered by `region` into a new frame.
    ///
    /// The region is clamped to the frame bounds first; returns `None` if
    /// nothing remains.
    pub fn crop(&self, region: &Region) -> Option<Frame> {
        let r = region.clamp(self.width, self.height)?;
        let (x, y) = (r.x as usize, r.y as usize);
        let (w, h) = (r.width as usize, r.height as usize);
        let view = self.as_ndarray();
        let roi = view.slice(s![y..y + h, x..x + w, ..]);
        let data: Vec<u8> = roi.iter().copied().collect();
        Some(Frame::new(
            data,
            r.width as u32,
            r.height as u32,
            self.channels,
            self.index,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
