pub const CASCADE_MODEL_NAME: &str = "haarcascade_frontalface_default.xml";
pub const CASCADE_MODEL_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_default.xml";

/// Side length of the square crop every face is resampled to before flattening.
pub const FEATURE_RESOLUTION: u32 = 64;
pub const FEATURE_LENGTH: usize = (FEATURE_RESOLUTION * FEATURE_RESOLUTION) as usize;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

pub const DEFAULT_KEY_ENV: &str = "ENCRYPTION_KEY";
pub const CASCADE_PATH_ENV: &str = "FACEVAULT_CASCADE";
pub const CONFIG_PATH_ENV: &str = "FACEVAULT_CONFIG";

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
