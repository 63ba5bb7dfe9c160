#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
}

impl VideoMetadata {
    /// Length of the video in seconds, derived from the frame count.
    ///
    /// Zero when the frame rate is unknown.
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 && self.fps.is_finite() {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}
