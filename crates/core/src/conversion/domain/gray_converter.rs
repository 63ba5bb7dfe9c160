use crate::shared::frame::Frame;

/// Domain interface for producing the single-channel working copy that the
/// cascade detectors run on.
///
/// The returned frame keeps the source frame's dimensions and index.
pub trait GrayConverter: Send {
    fn to_gray(&self, frame: &Frame) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Short backend name for log output.
    fn backend(&self) -> &'static str;
}
