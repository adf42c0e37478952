/// Detector certainty below which a face is labeled low-confidence.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Minimum bounding box width and height, in pixels.
pub const DEFAULT_MIN_FACE_SIZE: f64 = 60.0;

/// Roll tolerance around both 0° and 180°.
pub const DEFAULT_MAX_TILT_DEGREES: f64 = 30.0;

/// Number of landmark points: left eye, right eye, nose tip, mouth corners.
pub const LANDMARK_COUNT: usize = 5;

/// YuNet row layout: `[x, y, w, h, 5 × (x, y), score]`.
pub const FLAT_DETECTION_LEN: usize = 4 + LANDMARK_COUNT * 2 + 1;

/// Frames buffered between the decode thread and the classify loop.
pub const PREFETCH_CAPACITY: usize = 8;

/// Progress is logged every N frames.
pub const DEFAULT_PROGRESS_THROTTLE: usize = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
