use crate::detection::domain::face_scorer::FaceVerdict;
use crate::pipeline::sample_schedule::Sample;
use crate::shared::video_metadata::VideoMetadata;

/// Observer for scan events.
///
/// Decouples the selection loop from how its progress is reported, so the
/// CLI and tests can each watch the scan without touching the loop itself.
pub trait ScanLogger: Send {
    fn scan_started(&mut self, metadata: &VideoMetadata, start_time: f64, interval: f64);

    /// The sampled frame could not be decoded; the scan moves on.
    fn frame_unreadable(&mut self, sample: &Sample, error: &dyn std::error::Error);

    fn no_faces(&mut self, sample: &Sample);

    /// Called once per face that was evaluated, accepted or not.
    fn face_evaluated(&mut self, sample: &Sample, verdict: &FaceVerdict);

    fn scan_finished(&mut self, frames_checked: usize, selected: bool);
}

/// Silent logger that discards all events.
pub struct NullScanLogger;

impl ScanLogger for NullScanLogger {
    fn scan_started(&mut self, _metadata: &VideoMetadata, _start_time: f64, _interval: f64) {}
    fn frame_unreadable(&mut self, _sample: &Sample, _error: &dyn std::error::Error) {}
    fn no_faces(&mut self, _sample: &Sample) {}
    fn face_evaluated(&mut self, _sample: &Sample, _verdict: &FaceVerdict) {}
    fn scan_finished(&mut self, _frames_checked: usize, _selected: bool) {}
}

/// Tally of why faces were turned down during a scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub too_small: usize,
    pub not_frontal: usize,
    pub low_score: usize,
}

/// Reports scan events through the `log` crate, one line per sample or face.
pub struct LogScanLogger {
    min_face_size: f64,
    min_score: f64,
    rejections: RejectionCounts,
}

impl LogScanLogger {
    /// Thresholds are only used to phrase rejection messages.
    pub fn new(min_face_size: f64, min_score: f64) -> Self {
        Self {
            min_face_size,
            min_score,
            rejections: RejectionCounts::default(),
        }
    }

    pub fn rejections(&self) -> RejectionCounts {
        self.rejections
    }
}

impl ScanLogger for LogScanLogger {
    fn scan_started(&mut self, metadata: &VideoMetadata, start_time: f64, interval: f64) {
        log::info!(
            "Video: {}x{} {}, {} frames, {:.1}s, FPS: {:.2}",
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.total_frames,
            metadata.duration(),
            metadata.fps
        );
        log::info!(
            "Searching for frontal face starting at {start_time}s, checking every {interval}s"
        );
    }

    fn frame_unreadable(&mut self, sample: &Sample, error: &dyn std::error::Error) {
        log::warn!(
            "  Frame {} ({:.1}s): could not be decoded: {error}",
            sample.frame_index,
            sample.time
        );
    }

    fn no_faces(&mut self, sample: &Sample) {
        log::info!(
            "  Frame {} ({:.1}s): No faces detected",
            sample.frame_index,
            sample.time
        );
    }

    fn face_evaluated(&mut self, sample: &Sample, verdict: &FaceVerdict) {
        let prefix = format!("  Frame {} ({:.1}s):", sample.frame_index, sample.time);
        match verdict {
            FaceVerdict::TooSmall(c) => {
                self.rejections.too_small += 1;
                log::info!(
                    "{prefix} Face too small ({:.1}% < {:.0}%), continuing search...",
                    c.area_ratio * 100.0,
                    self.min_face_size * 100.0
                );
            }
            FaceVerdict::NotFrontal(c) => {
                self.rejections.not_frontal += 1;
                log::info!(
                    "{prefix} Face rejected ({} eye(s) detected, need 2), continuing search...",
                    c.eye_count.unwrap_or(0)
                );
            }
            FaceVerdict::LowScore(_, s) => {
                self.rejections.low_score += 1;
                log::info!(
                    "{prefix} Face with both eyes but score too low ({:.1} < {}), continuing search...",
                    s.total_score,
                    self.min_score
                );
            }
            FaceVerdict::Accepted(_, s) => {
                log::info!(
                    "{prefix} Found clear frontal face! Score={:.1} (size={:.1}, pos={:.1}, frontal={})",
                    s.total_score,
                    s.size_score,
                    s.position_score,
                    s.frontal_score
                );
            }
        }
    }

    fn scan_finished(&mut self, frames_checked: usize, selected: bool) {
        if selected {
            log::debug!("Scan finished after {frames_checked} frame(s)");
            return;
        }
        let r = self.rejections;
        log::warn!(
            "No clear frontal face found in {frames_checked} frames checked \
             (too small: {}, not frontal: {}, low score: {})",
            r.too_small,
            r.not_frontal,
            r.low_score
        );
    }
}
