use serde::Serialize;

use crate::shared::constants::{
    FRONTAL_SCORE, MAX_POSITION_SCORE, MAX_SIZE_SCORE, MIN_EYES, MIN_FACE_SIZE, MIN_SCORE,
};
use crate::shared::region::Region;

/// Per-component quality score of an accepted or near-accepted face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub size_score: f64,
    pub position_score: f64,
    pub frontal_score: f64,
    pub total_score: f64,
}

/// A detected face with the metrics derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceCandidate {
    pub region: Region,
    pub area_ratio: f64,
    pub center_dist: f64,
    /// `None` when the face was rejected before eye detection ran.
    pub eye_count: Option<usize>,
}

/// Outcome of evaluating a single face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FaceVerdict {
    TooSmall(FaceCandidate),
    NotFrontal(FaceCandidate),
    LowScore(FaceCandidate, ScoreBreakdown),
    Accepted(FaceCandidate, ScoreBreakdown),
}

impl FaceVerdict {
    pub fn candidate(&self) -> &FaceCandidate {
        match self {
            FaceVerdict::TooSmall(c)
            | FaceVerdict::NotFrontal(c)
            | FaceVerdict::LowScore(c, _)
            | FaceVerdict::Accepted(c, _) => c,
        }
    }

    pub fn score(&self) -> Option<&ScoreBreakdown> {
        match self {
            FaceVerdict::LowScore(_, s) | FaceVerdict::Accepted(_, s) => Some(s),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, FaceVerdict::Accepted(..))
    }
}

/// Face area divided by frame area. Zero for an empty frame.
pub fn area_ratio(face: &Region, frame_width: u32, frame_height: u32) -> f64 {
    let frame_area = frame_width as f64 * frame_height as f64;
    if frame_area <= 0.0 {
        return 0.0;
    }
    face.area() as f64 / frame_area
}

pub fn size_score(area_ratio: f64) -> f64 {
    (area_ratio * 300.0).min(MAX_SIZE_SCORE)
}

/// Mean of the horizontal and vertical offsets of the face center from the
/// frame center, each normalized by the frame dimension.
pub fn center_distance(face: &Region, frame_width: u32, frame_height: u32) -> f64 {
    if frame_width == 0 || frame_height == 0 {
        return 0.0;
    }
    let (fx, fy) = face.center();
    let w = frame_width as f64;
    let h = frame_height as f64;
    let dx = (fx - w / 2.0).abs() / w;
    let dy = (fy - h / 2.0).abs() / h;
    (dx + dy) / 2.0
}

pub fn position_score(center_dist: f64) -> f64 {
    (MAX_POSITION_SCORE * (1.0 - center_dist * 2.0)).max(0.0)
}

/// Size/position/frontality scoring with the two acceptance gates.
///
/// Both gates are inclusive: a face exactly at `min_face_size` or exactly at
/// `min_score` passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceScorer {
    min_face_size: f64,
    min_score: f64,
}

impl FaceScorer {
    pub fn new(min_face_size: f64, min_score: f64) -> Self {
        Self {
            min_face_size,
            min_score,
        }
    }

    pub fn min_face_size(&self) -> f64 {
        self.min_face_size
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Scores a face already confirmed frontal.
    pub fn score(&self, area_ratio: f64, center_dist: f64) -> ScoreBreakdown {
        let size = size_score(area_ratio);
        let position = position_score(center_dist);
        ScoreBreakdown {
            size_score: size,
            position_score: position,
            frontal_score: FRONTAL_SCORE,
            total_score: size + position + FRONTAL_SCORE,
        }
    }

    /// Runs the size gate, then `count_eyes`, then the score gate.
    ///
    /// `count_eyes` is only called for faces that pass the size gate.
    pub fn evaluate<E>(
        &self,
        face: &Region,
        frame_width: u32,
        frame_height: u32,
        count_eyes: impl FnOnce() -> Result<usize, E>,
    ) -> Result<FaceVerdict, E> {
        let mut candidate = FaceCandidate {
            region: *face,
            area_ratio: area_ratio(face, frame_width, frame_height),
            center_dist: center_distance(face, frame_width, frame_height),
            eye_count: None,
        };

        if candidate.area_ratio < self.min_face_size {
            return Ok(FaceVerdict::TooSmall(candidate));
        }

        let eyes = count_eyes()?;
        candidate.eye_count = Some(eyes);
        if eyes < MIN_EYES {
            return Ok(FaceVerdict::NotFrontal(candidate));
        }

        let score = self.score(candidate.area_ratio, candidate.center_dist);
        if score.total_score >= self.min_score {
            Ok(FaceVerdict::Accepted(candidate, score))
        } else {
            Ok(FaceVerdict::LowScore(candidate, score))
        }
    }
}

impl Default for FaceScorer {
    fn default() -> Self {
        Self::new(MIN_FACE_SIZE, MIN_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::convert::Infallible;

    fn eyes(n: usize) -> impl FnOnce() -> Result<usize, Infallible> {
        move || Ok(n)
    }

    #[test]
    fn test_centered_large_face_scores_100() {
        // 700x700 face centered in a 1920x1080 frame
        let face = Region::new(610, 190, 700, 700);
        let verdict = FaceScorer::default()
            .evaluate(&face, 1920, 1080, eyes(2))
            .unwrap();

        let c = verdict.candidate();
        assert_relative_eq!(c.area_ratio, 490_000.0 / 2_073_600.0);
        assert_relative_eq!(c.center_dist, 0.0);
        assert_eq!(c.eye_count, Some(2));

        let s = verdict.score().unwrap();
        assert_relative_eq!(s.size_score, 30.0);
        assert_relative_eq!(s.position_score, 20.0);
        assert_relative_eq!(s.frontal_score, 50.0);
        assert_relative_eq!(s.total_score, 100.0);
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_small_face_rejected_without_eye_detection() {
        let face = Region::new(0, 0, 100, 100);
        let mut called = false;
        let verdict = FaceScorer::default()
            .evaluate(&face, 1920, 1080, || {
                called = true;
                Ok::<_, Infallible>(2)
            })
            .unwrap();
        assert!(matches!(verdict, FaceVerdict::TooSmall(_)));
        assert_eq!(verdict.candidate().eye_count, None);
        assert!(!called);
    }

    #[test]
    fn test_area_ratio_exactly_at_minimum_passes_size_gate() {
        // 30x30 in 100x100 = 0.09
        let face = Region::new(35, 35, 30, 30);
        let verdict = FaceScorer::default()
            .evaluate(&face, 100, 100, eyes(2))
            .unwrap();
        assert_eq!(verdict.candidate().area_ratio, 0.09);
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_area_ratio_just_below_minimum_rejected() {
        // 30x29 in 100x100 = 0.087
        let face = Region::new(35, 35, 30, 29);
        let verdict = FaceScorer::default()
            .evaluate(&face, 100, 100, eyes(2))
            .unwrap();
        assert!(matches!(verdict, FaceVerdict::TooSmall(_)));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_fewer_than_two_eyes_rejected(#[case] eye_count: usize) {
        let face = Region::new(610, 190, 700, 700);
        let verdict = FaceScorer::default()
            .evaluate(&face, 1920, 1080, eyes(eye_count))
            .unwrap();
        assert!(matches!(verdict, FaceVerdict::NotFrontal(_)));
        assert_eq!(verdict.candidate().eye_count, Some(eye_count));
        assert!(verdict.score().is_none());
    }

    #[test]
    fn test_more_than_two_eyes_accepted() {
        let face = Region::new(610, 190, 700, 700);
        let verdict = FaceScorer::default()
            .evaluate(&face, 1920, 1080, eyes(4))
            .unwrap();
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_total_exactly_at_min_score_passes() {
        let face = Region::new(0, 0, 30, 30);
        let expected = FaceScorer::default().score(
            area_ratio(&face, 100, 100),
            center_distance(&face, 100, 100),
        );
        let scorer = FaceScorer::new(MIN_FACE_SIZE, expected.total_score);
        let verdict = scorer.evaluate(&face, 100, 100, eyes(2)).unwrap();
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_total_below_min_score_is_low_score() {
        // Corner face: ~27 size + ~6 position + 50 frontal
        let face = Region::new(0, 0, 30, 30);
        let scorer = FaceScorer::new(MIN_FACE_SIZE, 90.0);
        let verdict = scorer.evaluate(&face, 100, 100, eyes(2)).unwrap();
        match verdict {
            FaceVerdict::LowScore(_, s) => {
                assert_relative_eq!(s.size_score, 27.0, epsilon = 1e-9);
                assert_relative_eq!(s.position_score, 6.0, epsilon = 1e-9);
                assert_relative_eq!(s.total_score, 83.0, epsilon = 1e-9);
            }
            other => panic!("expected LowScore, got {other:?}"),
        }
    }

    #[test]
    fn test_eye_detection_error_propagates() {
        let face = Region::new(610, 190, 700, 700);
        let result = FaceScorer::default().evaluate(&face, 1920, 1080, || Err("boom"));
        assert_eq!(result, Err("boom"));
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(0.05, 15.0)]
    #[case(0.1, 30.0)]
    #[case(0.5, 30.0)]
    fn test_size_score(#[case] ratio: f64, #[case] expected: f64) {
        assert_relative_eq!(size_score(ratio), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0.0, 20.0)]
    #[case(0.25, 10.0)]
    #[case(0.5, 0.0)]
    #[case(0.75, 0.0)]
    fn test_position_score(#[case] dist: f64, #[case] expected: f64) {
        assert_relative_eq!(position_score(dist), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_size_score_is_monotonic() {
        let mut previous = f64::NEG_INFINITY;
        for step in 0..=200 {
            let s = size_score(step as f64 / 200.0);
            assert!(s >= previous);
            previous = s;
        }
    }

    #[test]
    fn test_position_score_is_non_increasing_and_clamped() {
        let mut previous = f64::INFINITY;
        for step in 0..=200 {
            let p = position_score(step as f64 / 100.0);
            assert!(p <= previous);
            assert!(p >= 0.0);
            previous = p;
        }
    }

    #[test]
    fn test_total_score_monotonic_in_face_size() {
        // Grow a centered face; position and eyes stay constant.
        let scorer = FaceScorer::default();
        let mut previous = f64::NEG_INFINITY;
        for side in (440..=1000).step_by(10) {
            let x = (1920 - side) / 2;
            let y = (1080 - side.min(1080)) / 2;
            let face = Region::new(x, y, side, side.min(1080));
            let verdict = scorer.evaluate(&face, 1920, 1080, eyes(2)).unwrap();
            let total = verdict.score().unwrap().total_score;
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn test_center_distance_averages_axes() {
        // Face centered horizontally, at the top edge vertically.
        let face = Region::new(40, -10, 20, 20);
        assert_relative_eq!(center_distance(&face, 100, 100), (0.0 + 0.5) / 2.0);
    }

    #[test]
    fn test_degenerate_frame() {
        let face = Region::new(0, 0, 10, 10);
        assert_eq!(area_ratio(&face, 0, 0), 0.0);
        assert_eq!(center_distance(&face, 0, 100), 0.0);
    }

    #[test]
    fn test_default_thresholds() {
        let scorer = FaceScorer::default();
        assert_relative_eq!(scorer.min_face_size(), 0.09);
        assert_relative_eq!(scorer.min_score(), 75.0);
    }
}
