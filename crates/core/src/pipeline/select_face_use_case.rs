use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::conversion::domain::gray_converter::GrayConverter;
use crate::detection::domain::eye_detector::EyeDetector;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_scorer::{FaceScorer, FaceVerdict, ScoreBreakdown};
use crate::pipeline::sample_schedule::{Sample, SampleSchedule};
use crate::pipeline::scan_logger::ScanLogger;
use crate::shared::constants::{DEFAULT_INTERVAL, DEFAULT_START_TIME, THUMBNAIL_WIDTH};
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::thumbnail_writer::ThumbnailWriter;
use crate::video::domain::video_reader::VideoReader;

#[derive(Error, Debug)]
pub enum SelectFaceError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("could not open video {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("gray conversion failed: {0}")]
    Conversion(#[source] Box<dyn std::error::Error>),
    #[error("detection failed: {0}")]
    Detection(#[source] Box<dyn std::error::Error>),
    #[error("could not write thumbnail {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Sampling and output settings for one scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectorConfig {
    /// First sampled timestamp, in seconds.
    pub start_time: f64,
    /// Seconds between samples.
    pub interval: f64,
    /// Thumbnail width in pixels; height follows the source aspect ratio.
    pub thumbnail_width: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            start_time: DEFAULT_START_TIME,
            interval: DEFAULT_INTERVAL,
            thumbnail_width: THUMBNAIL_WIDTH,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<(), SelectFaceError> {
        if !self.interval.is_finite() || self.interval <= 0.0 {
            return Err(SelectFaceError::InvalidConfig(format!(
                "interval must be a positive number of seconds, got {}",
                self.interval
            )));
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(SelectFaceError::InvalidConfig(format!(
                "start time must be zero or more seconds, got {}",
                self.start_time
            )));
        }
        if self.thumbnail_width == 0 {
            return Err(SelectFaceError::InvalidConfig(
                "thumbnail width must be at least 1 pixel".to_string(),
            ));
        }
        Ok(())
    }
}

/// The face that was picked and where its thumbnail went.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceSelection {
    pub frame_index: usize,
    pub timestamp: f64,
    pub face: Region,
    pub score: ScoreBreakdown,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub output_path: PathBuf,
    pub frames_checked: usize,
}

/// Thumbnail size for a `width`-wide copy of a `src_width`x`src_height` frame.
pub fn thumbnail_size(src_width: u32, src_height: u32, width: u32) -> (u32, u32) {
    if src_width == 0 {
        return (width, 1);
    }
    let height = (src_height as f64 * width as f64 / src_width as f64).round() as u32;
    (width, height.max(1))
}

/// Scans sampled frames for the first clear frontal face and writes a
/// thumbnail of that frame.
pub struct SelectFaceUseCase {
    reader: Box<dyn VideoReader>,
    converter: Box<dyn GrayConverter>,
    face_detector: Box<dyn FaceDetector>,
    eye_detector: Box<dyn EyeDetector>,
    writer: Box<dyn ThumbnailWriter>,
    scorer: FaceScorer,
    config: SelectorConfig,
    logger: Box<dyn ScanLogger>,
}

impl SelectFaceUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        converter: Box<dyn GrayConverter>,
        face_detector: Box<dyn FaceDetector>,
        eye_detector: Box<dyn EyeDetector>,
        writer: Box<dyn ThumbnailWriter>,
        scorer: FaceScorer,
        config: SelectorConfig,
        logger: Box<dyn ScanLogger>,
    ) -> Self {
        Self {
            reader,
            converter,
            face_detector,
            eye_detector,
            writer,
            scorer,
            config,
            logger,
        }
    }

    /// Returns `Ok(None)` when no sampled frame has a face that passes every
    /// gate; nothing is written in that case.
    pub fn execute(
        &mut self,
        video_path: &Path,
        output_path: &Path,
    ) -> Result<Option<FaceSelection>, SelectFaceError> {
        self.config.validate()?;

        let metadata = self
            .reader
            .open(video_path)
            .map_err(|source| SelectFaceError::Open {
                path: video_path.to_path_buf(),
                source,
            })?;

        let result = self.scan(&metadata, output_path);
        self.reader.close();
        result
    }

    fn scan(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<Option<FaceSelection>, SelectFaceError> {
        self.logger
            .scan_started(metadata, self.config.start_time, self.config.interval);

        let mut frames_checked = 0;
        let schedule = SampleSchedule::new(self.config.start_time, self.config.interval, metadata);

        for sample in schedule {
            let frame = match self.reader.read_frame(sample.frame_index) {
                Ok(f) => f,
                Err(e) => {
                    self.logger.frame_unreadable(&sample, e.as_ref());
                    continue;
                }
            };
            frames_checked += 1;

            if let Some((face, score)) = self.find_face(&sample, &frame)? {
                let (width, height) =
                    thumbnail_size(frame.width(), frame.height(), self.config.thumbnail_width);
                self.writer
                    .write_thumbnail(output_path, &frame, (width, height))
                    .map_err(|source| SelectFaceError::Write {
                        path: output_path.to_path_buf(),
                        source,
                    })?;
                log::info!(
                    "Saved {width}x{height} thumbnail from frame {} to {}",
                    sample.frame_index,
                    output_path.display()
                );
                self.logger.scan_finished(frames_checked, true);

                return Ok(Some(FaceSelection {
                    frame_index: sample.frame_index,
                    timestamp: sample.time,
                    face,
                    score,
                    thumbnail_width: width,
                    thumbnail_height: height,
                    output_path: output_path.to_path_buf(),
                    frames_checked,
                }));
            }
        }

        self.logger.scan_finished(frames_checked, false);
        Ok(None)
    }

    /// Evaluates every detected face in detector order and returns the first
    /// one accepted.
    fn find_face(
        &mut self,
        sample: &Sample,
        frame: &Frame,
    ) -> Result<Option<(Region, ScoreBreakdown)>, SelectFaceError> {
        let gray = self
            .converter
            .to_gray(frame)
            .map_err(SelectFaceError::Conversion)?;
        let faces = self
            .face_detector
            .detect(&gray)
            .map_err(SelectFaceError::Detection)?;

        if faces.is_empty() {
            self.logger.no_faces(sample);
            return Ok(None);
        }

        let scorer = self.scorer;
        for face in &faces {
            let eye_detector = &mut self.eye_detector;
            let verdict = scorer
                .evaluate(face, gray.width(), gray.height(), || {
                    match gray.crop(face) {
                        Some(crop) => eye_detector.detect_eyes(&crop).map(|eyes| eyes.len()),
                        None => Ok(0),
                    }
                })
                .map_err(SelectFaceError::Detection)?;
            self.logger.face_evaluated(sample, &verdict);

            if let FaceVerdict::Accepted(candidate, score) = verdict {
                return Ok(Some((candidate.region, score)));
            }
        }
        Ok(None)
    }
}
