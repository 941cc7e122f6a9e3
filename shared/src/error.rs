#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("surface transform failed: {0}")]
    Transform(String),

    #[error("overlay draw failed: {0}")]
    Draw(String),
}

impl SurfaceError {
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    pub fn draw(msg: impl Into<String>) -> Self {
        Self::Draw(msg.into())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SettingError {
    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    #[error("invalid value for {setting}: {value:?}")]
    InvalidValue { setting: &'static str, value: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    #[error("Invalid file format. Please upload a JPEG, PNG, GIF, WebP, or BMP image.")]
    UnsupportedFormat,

    #[error("Image is too large ({:.2}MB). Maximum size is 10MB.", .bytes / (1024.0 * 1024.0))]
    FileTooLarge { bytes: f64 },

    #[error("Image dimensions are too small. Please upload a larger image.")]
    DimensionsTooSmall,

    #[error("Image dimensions are too large. Please upload a smaller image or resize it.")]
    DimensionsTooLarge,

    #[error("Failed to load image. The file might be corrupted.")]
    Unreadable,

    #[error("Failed to read the image file")]
    ReadFailed,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Camera is not supported in this browser")]
    Unsupported,

    #[error("No camera found. Please connect a camera and try again.")]
    NotFound,

    #[error("Camera access denied. Please allow camera access in your browser settings.")]
    PermissionDenied,

    #[error("Camera is in use by another application. Please close other applications using the camera.")]
    InUse,

    #[error("Error displaying camera feed. Please reload the page.")]
    Playback,

    #[error("{0}")]
    Other(String),
}

impl CameraError {
    pub fn from_dom_name(name: &str, message: &str) -> Self {
        match name {
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => Self::NotFound,
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                Self::PermissionDenied
            }
            "NotReadableError" | "TrackStartError" | "AbortError" => Self::InUse,
            _ if message.is_empty() => Self::Other("Failed to access camera".to_string()),
            _ => Self::Other(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(SurfaceError::draw("x")
            .to_string()
            .contains("overlay draw failed:"));
        assert!(SurfaceError::transform("x")
            .to_string()
            .contains("surface transform failed:"));
        assert!(SettingError::UnknownSetting("zoom".into())
            .to_string()
            .contains("unknown setting: zoom"));
    }

    #[test]
    fn oversized_files_report_megabytes() {
        let error = ImageError::FileTooLarge {
            bytes: 12.5 * 1024.0 * 1024.0,
        };
        assert_eq!(
            error.to_string(),
            "Image is too large (12.50MB). Maximum size is 10MB."
        );
    }

    #[test]
    fn dom_names_map_to_camera_errors() {
        assert_eq!(CameraError::from_dom_name("NotFoundError", ""), CameraError::NotFound);
        assert_eq!(
            CameraError::from_dom_name("DevicesNotFoundError", ""),
            CameraError::NotFound
        );
        assert_eq!(
            CameraError::from_dom_name("PermissionDeniedError", ""),
            CameraError::PermissionDenied
        );
        assert_eq!(CameraError::from_dom_name("TrackStartError", ""), CameraError::InUse);
        assert_eq!(
            CameraError::from_dom_name("TypeError", "bad constraints"),
            CameraError::Other("bad constraints".into())
        );
        assert_eq!(
            CameraError::from_dom_name("TypeError", "").to_string(),
            "Failed to access camera"
        );
    }
}
