use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

const MICROS_PER_SECOND: f64 = 1_000_000.0;
/// libav's `AV_NOPTS_VALUE`.
const NO_PTS: i64 = i64::MIN;

/// Decodes individual video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Each `read_frame` seeks to the nearest keyframe at or before the requested
/// frame, then decodes forward until it reaches it. Output is RGB24.
pub struct FfmpegReader {
    state: Option<OpenVideo>,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

struct OpenVideo {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    fps: f64,
    /// Seconds per stream timestamp tick.
    time_base: f64,
    start_pts: i64,
}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let (video_stream_index, decoder, fps, time_base, start_pts, total_frames) = {
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or("No video stream found")?;

            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
            let decoder = codec_ctx.decoder().video()?;

            let fps = match rational_to_f64(stream.rate()) {
                rate if rate > 0.0 => rate,
                _ => rational_to_f64(stream.avg_frame_rate()),
            };
            let time_base = rational_to_f64(stream.time_base());
            let start_pts = match stream.start_time() {
                NO_PTS => 0,
                pts => pts,
            };

            let stream_duration = if stream.duration() > 0 {
                stream.duration() as f64 * time_base
            } else {
                ictx.duration().max(0) as f64 / MICROS_PER_SECOND
            };
            let total_frames = frame_count(stream.frames(), stream_duration, fps);

            (
                stream.index(),
                decoder,
                fps,
                time_base,
                start_pts,
                total_frames,
            )
        };

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
        };

        self.state = Some(OpenVideo {
            ictx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            fps,
            time_base,
            start_pts,
        });

        Ok(metadata)
    }

    fn read_frame(&mut self, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let state = self.state.as_mut().ok_or("FfmpegReader: not opened")?;
        state.seek(index)?;
        state.decode_until(index)
    }

    fn close(&mut self) {
        self.state = None;
    }
}

impl OpenVideo {
    fn seek(&mut self, index: usize) -> Result<(), Box<dyn std::error::Error>> {
        if self.fps <= 0.0 {
            return Err("cannot seek: unknown frame rate".into());
        }
        let start_seconds = self.start_pts as f64 * self.time_base;
        let seconds = start_seconds + index as f64 / self.fps;
        let ts = (seconds * MICROS_PER_SECOND).round() as i64;
        self.ictx.seek(ts, ..ts)?;
        self.decoder.flush();
        Ok(())
    }

    fn decode_until(&mut self, target: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                break;
            };
            if stream.index() != self.video_stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if let Some(frame) = self.accept(&decoded, target)? {
                    return Ok(frame);
                }
            }
        }

        // Drain frames still buffered in the decoder.
        let _ = self.decoder.send_eof();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            if let Some(frame) = self.accept(&decoded, target)? {
                return Ok(frame);
            }
        }

        Err(format!("frame {target} could not be decoded").into())
    }

    /// Converts `decoded` to RGB if it is at or past `target`.
    fn accept(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
        target: usize,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let index = match self.frame_index_of(decoded) {
            Some(index) if index < target => return Ok(None),
            Some(index) => index,
            None => target,
        };

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        Ok(Some(Frame::new(pixels, self.width, self.height, 3, index)))
    }

    fn frame_index_of(&self, decoded: &ffmpeg_next::util::frame::video::Video) -> Option<usize> {
        let pts = decoded.timestamp().or_else(|| decoded.pts())?;
        let seconds = (pts - self.start_pts) as f64 * self.time_base;
        Some((seconds * self.fps).round().max(0.0) as usize)
    }
}

fn rational_to_f64(rate: ffmpeg_next::Rational) -> f64 {
    if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    }
}

/// Frame count reported by the container, or estimated from the duration
/// when the container does not record one.
fn frame_count(reported: i64, duration_seconds: f64, fps: f64) -> usize {
    if reported > 0 {
        return reported as usize;
    }
    if duration_seconds > 0.0 && fps > 0.0 {
        (duration_seconds * fps).round() as usize
    } else {
        0
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This function strips that padding to produce a tightly-packed pixel buffer.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
