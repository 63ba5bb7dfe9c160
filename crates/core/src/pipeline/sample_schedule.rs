use crate::shared::video_metadata::VideoMetadata;

/// A sampled timestamp and the frame it maps to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub frame_index: usize,
}

/// Iterator over sampled timestamps: `start`, `start + interval`, ... while
/// the time is before the end of the video and maps to an existing frame.
#[derive(Clone, Debug)]
pub struct SampleSchedule {
    current_time: f64,
    interval: f64,
    duration: f64,
    fps: f64,
    total_frames: usize,
}

impl SampleSchedule {
    /// `interval` must be positive; a non-positive interval yields nothing.
    pub fn new(start_time: f64, interval: f64, metadata: &VideoMetadata) -> Self {
        Self {
            current_time: start_time,
            interval,
            duration: metadata.duration(),
            fps: metadata.fps,
            total_frames: metadata.total_frames,
        }
    }
}

impl Iterator for SampleSchedule {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.interval.is_nan() || self.interval <= 0.0 {
            return None;
        }
        if self.current_time.is_nan() || self.current_time >= self.duration {
            return None;
        }

        let frame_index = (self.current_time * self.fps).floor() as usize;
        if frame_index >= self.total_frames {
            return None;
        }

        let sample = Sample {
            time: self.current_time,
            frame_index,
        };
        let next_time = self.current_time + self.interval;
        // Stop once the interval no longer moves the clock forward.
        self.current_time = if next_time > self.current_time {
            next_time
        } else {
            f64::INFINITY
        };
        Some(sample)
    }
}
