//! Upload validation.
//!
//! The same rules run in the browser before submission and again on the
//! server before anything is sent to the remote model. The first violated
//! rule wins: type is checked before size.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted image (3 MiB).
pub const MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Confidence used when the form value is missing or unparsable.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Image formats the model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMime {
    Jpeg,
    Png,
    Webp,
}

impl ImageMime {
    pub const ALL: &'static [ImageMime] = &[ImageMime::Jpeg, ImageMime::Png, ImageMime::Webp];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpg",
            ImageMime::Png => "png",
            ImageMime::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImageMime {
    type Err = UploadError;

    /// Parses a `Content-Type` value, ignoring case and parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim().to_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Ok(ImageMime::Jpeg),
            "image/png" => Ok(ImageMime::Png),
            "image/webp" => Ok(ImageMime::Webp),
            _ => Err(UploadError::UnsupportedType(essence)),
        }
    }
}

/// Validation failures. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("No image provided")]
    Missing,

    #[error("Please upload JPG, PNG, or WebP images only")]
    UnsupportedType(String),

    #[error("Image must be under {}", size_label(.limit))]
    TooLarge { size: usize, limit: usize },
}

/// Human-readable size, rounded down so the message never overstates the limit.
fn size_label(bytes: &usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;

    match *bytes {
        b if b >= MB && b % MB == 0 => format!("{}MB", b / MB),
        b if b >= MB => format!("{:.1}MB", (b as f64 / MB as f64 * 10.0).floor() / 10.0),
        b if b >= KB => format!("{}KB", b / KB),
        b => format!("{} bytes", b),
    }
}

/// Limits applied to every upload.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_bytes: usize,
    pub allowed: Vec<ImageMime>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed: ImageMime::ALL.to_vec(),
        }
    }
}

impl UploadLimits {
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }
}

/// A validated image ready to be forwarded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime: ImageMime,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name to present to the remote service.
    pub fn upload_name(&self) -> String {
        match &self.file_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("upload.{}", self.mime.extension()),
        }
    }
}

/// Validate a candidate upload against `limits`.
pub fn validate_upload(
    content_type: Option<&str>,
    bytes: Vec<u8>,
    file_name: Option<String>,
    limits: &UploadLimits,
) -> Result<ImageUpload, UploadError> {
    let mime: ImageMime = content_type.unwrap_or_default().parse()?;
    if !limits.allowed.contains(&mime) {
        return Err(UploadError::UnsupportedType(mime.as_str().to_string()));
    }

    if bytes.len() > limits.max_bytes {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit: limits.max_bytes,
        });
    }

    Ok(ImageUpload {
        bytes,
        mime,
        file_name,
    })
}

/// Parse the form's confidence value.
///
/// Missing, unparsable and non-finite values fall back to `default`.
/// Parsed values are returned unmodified.
pub fn parse_confidence(raw: Option<&str>, default: f64) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_parse() {
        assert_eq!("image/jpeg".parse::<ImageMime>().unwrap(), ImageMime::Jpeg);
        assert_eq!("image/jpg".parse::<ImageMime>().unwrap(), ImageMime::Jpeg);
        assert_eq!("IMAGE/PNG".parse::<ImageMime>().unwrap(), ImageMime::Png);
        assert_eq!(
            "image/webp; q=0.9".parse::<ImageMime>().unwrap(),
            ImageMime::Webp
        );
        assert!("image/gif".parse::<ImageMime>().is_err());
        assert!("".parse::<ImageMime>().is_err());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = validate_upload(Some("image/gif"), vec![0; 10], None, &UploadLimits::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Please upload JPG, PNG, or WebP images only");

        let err = validate_upload(None, vec![0; 10], None, &UploadLimits::default()).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
    }

    #[test]
    fn test_rejects_oversized() {
        let err = validate_upload(
            Some("image/png"),
            vec![0; 4 * 1024 * 1024],
            None,
            &UploadLimits::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Image must be under 3MB");
    }

    #[test]
    fn test_size_message_follows_configured_limit() {
        let message = |limit: usize| {
            validate_upload(
                Some("image/png"),
                vec![0; limit + 1],
                None,
                &UploadLimits::with_max_bytes(limit),
            )
            .unwrap_err()
            .to_string()
        };

        assert_eq!(message(500_000), "Image must be under 488KB");
        assert_eq!(message(5 * 1024 * 1024 / 2), "Image must be under 2.5MB");
        assert_eq!(message(10 * 1024 * 1024), "Image must be under 10MB");
        assert_eq!(message(512), "Image must be under 512 bytes");
    }

    #[test]
    fn test_type_checked_before_size() {
        let err = validate_upload(
            Some("application/pdf"),
            vec![0; 4 * 1024 * 1024],
            None,
            &UploadLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType(_)));
    }

    #[test]
    fn test_size_boundary() {
        let limits = UploadLimits::default();
        assert!(validate_upload(Some("image/jpeg"), vec![0; MAX_UPLOAD_BYTES], None, &limits).is_ok());
        assert!(
            validate_upload(Some("image/jpeg"), vec![0; MAX_UPLOAD_BYTES + 1], None, &limits).is_err()
        );
    }

    #[test]
    fn test_restricted_allow_list() {
        let limits = UploadLimits {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed: vec![ImageMime::Png],
        };
        assert!(validate_upload(Some("image/jpeg"), vec![1], None, &limits).is_err());
        assert!(validate_upload(Some("image/png"), vec![1], None, &limits).is_ok());
    }

    #[test]
    fn test_upload_name() {
        let upload = validate_upload(Some("image/webp"), vec![1], None, &UploadLimits::default())
            .unwrap();
        assert_eq!(upload.upload_name(), "upload.webp");

        let upload = validate_upload(
            Some("image/png"),
            vec![1],
            Some("road.png".to_string()),
            &UploadLimits::default(),
        )
        .unwrap();
        assert_eq!(upload.upload_name(), "road.png");
    }

    #[test]
    fn test_parse_confidence() {
        assert_eq!(parse_confidence(Some("0.3"), DEFAULT_CONFIDENCE), 0.3);
        assert_eq!(parse_confidence(Some(" 0.75 "), DEFAULT_CONFIDENCE), 0.75);
        assert_eq!(parse_confidence(Some("abc"), DEFAULT_CONFIDENCE), 0.5);
        assert_eq!(parse_confidence(Some(""), DEFAULT_CONFIDENCE), 0.5);
        assert_eq!(parse_confidence(Some("NaN"), DEFAULT_CONFIDENCE), 0.5);
        assert_eq!(parse_confidence(None, DEFAULT_CONFIDENCE), 0.5);
    }
}
