use crate::error::ImageError;

pub const IMAGE_DATA_KEY: &str = "traceImageData";
pub const IMAGE_URL_KEY: &str = "traceImageUrl";
pub const MAX_IMAGE_BYTES: f64 = 10.0 * 1024.0 * 1024.0;
pub const MIN_IMAGE_SIDE: f64 = 10.0;
pub const MAX_IMAGE_SIDE: f64 = 5000.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    DataUrl(String),
    Url(String),
}

impl ImageSource {
    /// Prefers the inline data URL. Plain URLs are only usable when they do not
    /// point at a `blob:` object URL, which dies with the page that created it.
    pub fn resolve(url: Option<&str>, data: Option<&str>) -> Option<Self> {
        if let Some(data) = data.map(str::trim).filter(|data| !data.is_empty()) {
            return Some(ImageSource::DataUrl(data.to_string()));
        }
        let url = url.map(str::trim).filter(|url| !url.is_empty())?;
        if url.starts_with("blob:") {
            return None;
        }
        Some(ImageSource::Url(url.to_string()))
    }

    pub fn src(&self) -> &str {
        match self {
            ImageSource::DataUrl(src) | ImageSource::Url(src) => src,
        }
    }
}

pub const ACCEPTED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// Checks an upload before it is read. Dimensions are checked once decoded.
pub fn check_file(mime_type: &str, size_bytes: f64) -> Result<(), ImageError> {
    if !ACCEPTED_IMAGE_TYPES.contains(&mime_type) {
        return Err(ImageError::UnsupportedFormat);
    }
    if size_bytes > MAX_IMAGE_BYTES {
        return Err(ImageError::FileTooLarge { bytes: size_bytes });
    }
    Ok(())
}

pub fn check_dimensions(width: f64, height: f64) -> Result<(), ImageError> {
    if width < MIN_IMAGE_SIDE || height < MIN_IMAGE_SIDE {
        return Err(ImageError::DimensionsTooSmall);
    }
    if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        return Err(ImageError::DimensionsTooLarge);
    }
    Ok(())
}
