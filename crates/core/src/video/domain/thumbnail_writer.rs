use std::path::Path;

use crate::shared::frame::Frame;

/// Persists the selected color frame as a thumbnail image.
///
/// `frame` is the full-resolution RGB frame; `size` is the final thumbnail
/// size, already computed to keep the frame's aspect ratio. Nothing is
/// written unless encoding succeeds.
pub trait ThumbnailWriter: Send {
    fn write_thumbnail(
        &self,
        path: &Path,
        frame: &Frame,
        size: (u32, u32),
    ) -> Result<(), Box<dyn std::error::Error>>;
}
