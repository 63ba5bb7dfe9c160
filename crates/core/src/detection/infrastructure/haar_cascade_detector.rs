use std::path::Path;

use opencv::core::{Mat, Rect, Scalar, Size, Vector, CV_8UC1};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::detection::domain::eye_detector::EyeDetector;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// `detectMultiScale` tuning for one cascade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeParams {
    pub scale_factor: f64,
    pub min_neighbors: i32,
    /// Smallest object size in pixels; `(0, 0)` means no limit.
    pub min_size: (i32, i32),
}

pub const FACE_CASCADE_PARAMS: CascadeParams = CascadeParams {
    scale_factor: 1.1,
    min_neighbors: 5,
    min_size: (30, 30),
};

pub const EYE_CASCADE_PARAMS: CascadeParams = CascadeParams {
    scale_factor: 1.1,
    min_neighbors: 3,
    min_size: (0, 0),
};

/// OpenCV Haar cascade classifier running on single-channel frames.
///
/// Used both for the frontal-face pass over the whole frame and for the
/// eye pass over each face crop.
pub struct HaarCascadeDetector {
    classifier: CascadeClassifier,
    params: CascadeParams,
}

impl HaarCascadeDetector {
    /// Loads a cascade XML file.
    ///
    /// OpenCV reports an unreadable file as an empty classifier rather than
    /// an error, so emptiness is checked here.
    pub fn load(path: &Path, params: CascadeParams) -> Result<Self, Box<dyn std::error::Error>> {
        let path_str = path
            .to_str()
            .ok_or_else(|| format!("cascade path is not valid UTF-8: {}", path.display()))?;
        let classifier = CascadeClassifier::new(path_str)?;
        if classifier.empty()? {
            return Err(format!("failed to load cascade from {}", path.display()).into());
        }
        Ok(Self { classifier, params })
    }

    fn detect_regions(&mut self, gray: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        if gray.channels() != 1 {
            return Err(format!(
                "cascade detection needs a gray frame, got {} channel(s)",
                gray.channels()
            )
            .into());
        }
        if gray.width() == 0 || gray.height() == 0 {
            return Ok(Vec::new());
        }

        let mat = to_mat(gray)?;
        let (min_w, min_h) = self.params.min_size;
        let mut objects = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &mat,
            &mut objects,
            self.params.scale_factor,
            self.params.min_neighbors,
            0,
            Size::new(min_w, min_h),
            Size::default(),
        )?;

        Ok(objects
            .iter()
            .map(|r| Region::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(&mut self, gray: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        self.detect_regions(gray)
    }
}

impl EyeDetector for HaarCascadeDetector {
    fn detect_eyes(&mut self, face: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        self.detect_regions(face)
    }
}

/// Copies a gray frame into an owned 8-bit single-channel Mat.
fn to_mat(gray: &Frame) -> Result<Mat, Box<dyn std::error::Error>> {
    let mut mat = Mat::new_rows_cols_with_default(
        gray.height() as i32,
        gray.width() as i32,
        CV_8UC1,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(gray.data());
    Ok(mat)
}
