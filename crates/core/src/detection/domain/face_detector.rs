use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for face detection on a grayscale frame.
///
/// Regions are returned in the detector's own output order; callers rely on
/// that order when picking the first acceptable face.
pub trait FaceDetector: Send {
    fn detect(&mut self, gray: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
