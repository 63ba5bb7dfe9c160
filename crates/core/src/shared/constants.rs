/// First sampled timestamp, in seconds.
pub const DEFAULT_START_TIME: f64 = 10.0;
/// Distance between sampled timestamps, in seconds.
pub const DEFAULT_INTERVAL: f64 = 2.0;

/// Minimum face box area as a fraction of the frame area.
pub const MIN_FACE_SIZE: f64 = 0.09;
/// Minimum total score (out of 100) for a face to be selected.
pub const MIN_SCORE: f64 = 75.0;

pub const MAX_SIZE_SCORE: f64 = 30.0;
pub const MAX_POSITION_SCORE: f64 = 20.0;
pub const FRONTAL_SCORE: f64 = 50.0;
pub const MIN_EYES: usize = 2;

pub const THUMBNAIL_WIDTH: u32 = 320;
pub const JPEG_QUALITY: u8 = 85;

pub const FACE_CASCADE_NAME: &str = "haarcascade_frontalface_default.xml";
pub const FACE_CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_default.xml";

pub const EYE_CASCADE_NAME: &str = "haarcascade_eye.xml";
pub const EYE_CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_eye.xml";

/// Environment variable naming a directory that holds the cascade XML files.
pub const CASCADE_DIR_ENV: &str = "FACETHUMB_CASCADE_DIR";
