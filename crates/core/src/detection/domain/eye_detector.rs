use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for eye detection.
///
/// `face` is the grayscale crop of a single detected face; returned regions
/// are relative to that crop.
pub trait EyeDetector: Send {
    fn detect_eyes(&mut self, face: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
