use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Random-access frame source over a video file.
///
/// Implementations handle I/O details (codec, container format, seeking)
/// while the selection loop works with the abstract `Frame` and
/// `VideoMetadata` types.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Seeks to `index` and decodes that frame as RGB24.
    fn read_frame(&mut self, index: usize) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Releases any resources held by the reader. Safe to call repeatedly.
    fn close(&mut self);
}
