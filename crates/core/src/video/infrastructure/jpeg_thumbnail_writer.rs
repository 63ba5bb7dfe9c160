use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::shared::constants::JPEG_QUALITY;
use crate::shared::frame::Frame;
use crate::video::domain::thumbnail_writer::ThumbnailWriter;

/// Writes a color frame as a JPEG using the `image` crate.
///
/// The image is encoded fully in memory before the file is touched, so a
/// failed encode never leaves a partial file behind.
pub struct JpegThumbnailWriter {
    quality: u8,
}

impl JpegThumbnailWriter {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegThumbnailWriter {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl ThumbnailWriter for JpegThumbnailWriter {
    fn write_thumbnail(
        &self,
        path: &Path,
        frame: &Frame,
        size: (u32, u32),
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!(
                "expected an RGB frame, got {} channel(s)",
                frame.channels()
            )
            .into());
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        let (w, h) = size;
        if w == 0 || h == 0 {
            return Err(format!("thumbnail size must be non-zero, got {w}x{h}").into());
        }
        let img = if (w, h) == img.dimensions() {
            img
        } else {
            image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
        };

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality).encode_image(&img)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, r: u8, g: u8, b: u8) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.push(r);
            data.push(g);
            data.push(b);
        }
        Frame::new(data, width, height, 3, 0)
    }

    fn native(frame: &Frame) -> (u32, u32) {
        (frame.width(), frame.height())
    }

    fn is_jpeg(bytes: &[u8]) -> bool {
        bytes.starts_with(&[0xFF, 0xD8]) && bytes.ends_with(&[0xFF, 0xD9])
    }

    #[test]
    fn test_write_creates_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let frame = make_frame(100, 80, 50, 100, 200);
        JpegThumbnailWriter::default()
            .write_thumbnail(&path, &frame, native(&frame))
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(is_jpeg(&bytes));
    }

    #[test]
    fn test_write_jpeg_regardless_of_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumbnail.png");
        let frame = make_frame(32, 32, 10, 10, 10);
        JpegThumbnailWriter::default()
            .write_thumbnail(&path, &frame, native(&frame))
            .unwrap();
        assert!(is_jpeg(&std::fs::read(&path).unwrap()));
    }

    #[test]
    fn test_write_with_resize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thumb.jpg");
        let frame = make_frame(1920, 1080, 128, 128, 128);
        JpegThumbnailWriter::default()
            .write_thumbnail(&path, &frame, (320, 180))
            .unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 320);
        assert_eq!(img.height(), 180);
    }

    #[test]
    fn test_colors_survive_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let frame = make_frame(64, 64, 200, 40, 40);
        JpegThumbnailWriter::default()
            .write_thumbnail(&path, &frame, native(&frame))
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        let [r, g, b] = img.get_pixel(32, 32).0;
        assert!(r > 180 && g < 70 && b < 70, "got ({r}, {g}, {b})");
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = Vec::with_capacity(128 * 128 * 3);
        for i in 0..(128 * 128 * 3) {
            data.push(((i * 7919) % 251) as u8);
        }
        let frame = Frame::new(data, 128, 128, 3, 0);

        let high = dir.path().join("high.jpg");
        let low = dir.path().join("low.jpg");
        JpegThumbnailWriter::new(95).write_thumbnail(&high, &frame, native(&frame)).unwrap();
        JpegThumbnailWriter::new(20).write_thumbnail(&low, &frame, native(&frame)).unwrap();

        let high_len = std::fs::metadata(&high).unwrap().len();
        let low_len = std::fs::metadata(&low).unwrap().len();
        assert!(low_len < high_len);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.jpg");
        JpegThumbnailWriter::default()
            .write_thumbnail(&path, &make_frame(8, 8, 0, 0, 0), (8, 8))
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_gray_frame_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let gray = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        assert!(JpegThumbnailWriter::default()
            .write_thumbnail(&path, &gray, native(&gray))
            .is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_zero_size_rejected_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let frame = make_frame(8, 8, 0, 0, 0);
        assert!(JpegThumbnailWriter::default()
            .write_thumbnail(&path, &frame, (320, 0))
            .is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(JpegThumbnailWriter::new(0).quality(), 1);
        assert_eq!(JpegThumbnailWriter::new(255).quality(), 100);
        assert_eq!(JpegThumbnailWriter::default().quality(), 85);
    }
}
