pub const SEETAFACE_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const SEETAFACE_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";

/// Capabilities reported by `supported_features`, in wire form.
pub const SUPPORTED_FEATURES: &[&str] = &["FACE_DETECTION", "FACE_LANDMARKS", "BOUNDING_BOX"];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
