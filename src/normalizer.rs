use std::sync::Arc;

use image::{DynamicImage, ImageFormat};

use crate::error::{UploadError, UploadErrorKind};
use crate::media::UploadRequest;
use crate::storage::naming::replace_extension;

pub const NORMALIZED_MEDIA_TYPE: &str = "image/png";
pub const NORMALIZED_EXTENSION: &str = "png";

/// Result of a normalization pass that did not fail.
#[derive(Debug)]
pub enum Normalized {
    Unchanged(UploadRequest),
    Converted(UploadRequest),
}

impl Normalized {
    pub fn into_request(self) -> UploadRequest {
        match self {
            Normalized::Unchanged(request) | Normalized::Converted(request) => request,
        }
    }
}

/// A failed conversion. Carries the untouched request so the caller can
/// upload it as-is.
#[derive(Debug)]
pub struct ConversionWarning {
    pub original: UploadRequest,
    pub error: UploadError,
}

/// Re-encodes denylisted image formats as PNG before upload.
#[derive(Clone, Debug)]
pub struct FormatNormalizer {
    denylist: Arc<Vec<String>>,
}

impl Default for FormatNormalizer {
    fn default() -> Self {
        Self::new(["image/avif"])
    }
}

impl FormatNormalizer {
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denylist = denylist
            .into_iter()
            .map(|value| value.as_ref().trim().to_lowercase())
            .filter(|value| !value.is_empty())
            .collect();
        Self {
            denylist: Arc::new(denylist),
        }
    }

    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }

    pub fn should_convert(&self, media_type: &str) -> bool {
        let essence = media_type.split(';').next().unwrap_or(media_type).trim();
        self.denylist
            .iter()
            .any(|denied| denied.eq_ignore_ascii_case(essence))
    }

    pub fn try_normalize(&self, request: UploadRequest) -> Result<Normalized, ConversionWarning> {
        if !self.should_convert(&request.media_type) {
            return Ok(Normalized::Unchanged(request));
        }
        match transcode_to_png(&request.bytes, &request.media_type) {
            Ok(png) => Ok(Normalized::Converted(UploadRequest {
                bytes: png.into(),
                media_type: NORMALIZED_MEDIA_TYPE.to_string(),
                category: request.category,
                original_filename: replace_extension(
                    &request.original_filename,
                    NORMALIZED_EXTENSION,
                ),
            })),
            Err(error) => Err(ConversionWarning {
                original: request,
                error,
            }),
        }
    }

    /// Best-effort: on conversion failure the original request comes back
    /// unchanged and the failure is only logged.
    pub async fn normalize(&self, request: UploadRequest) -> UploadRequest {
        if !self.should_convert(&request.media_type) {
            return request;
        }
        let fallback = request.clone();
        let normalizer = self.clone();
        let result =
            tokio::task::spawn_blocking(move || normalizer.try_normalize(request)).await;
        match result {
            Ok(Ok(normalized)) => {
                let request = normalized.into_request();
                tracing::debug!(
                    filename = %request.original_filename,
                    size = request.len(),
                    "converted upload to png"
                );
                request
            }
            Ok(Err(warning)) => {
                tracing::warn!(
                    filename = %warning.original.original_filename,
                    media_type = %warning.original.media_type,
                    error = %warning.error,
                    "format conversion failed, uploading original"
                );
                warning.original
            }
            Err(err) => {
                tracing::warn!(error = %err, "format conversion task failed, uploading original");
                fallback
            }
        }
    }
}

fn transcode_to_png(bytes: &[u8], media_type: &str) -> Result<Vec<u8>, UploadError> {
    let format = match detect_mime_type(bytes).and_then(|mime| mime_to_format(mime).ok()) {
        Some(format) => format,
        None => mime_to_format(media_type)?,
    };
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| conversion_failed(format!("decode image failed: {err}")))?;
    encode_png(image)
}

fn encode_png(image: DynamicImage) -> Result<Vec<u8>, UploadError> {
    let mut output = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|err| conversion_failed(format!("encode png failed: {err}")))?;
    Ok(output)
}

pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" && matches!(&bytes[8..12], b"avif" | b"avis")
    {
        return Some("image/avif");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    None
}

pub fn mime_to_format(mime_type: &str) -> Result<ImageFormat, UploadError> {
    let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();
    match essence.to_lowercase().as_str() {
        "image/png" => Ok(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
        "image/gif" => Ok(ImageFormat::Gif),
        "image/webp" => Ok(ImageFormat::WebP),
        "image/bmp" => Ok(ImageFormat::Bmp),
        "image/avif" => Ok(ImageFormat::Avif),
        _ => Err(conversion_failed(format!("unsupported mime type: {mime_type}"))),
    }
}

fn conversion_failed(message: String) -> UploadError {
    UploadError::new(UploadErrorKind::ConversionFailed, message)
}
