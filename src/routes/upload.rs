use axum::{
    Json,
    body::Body,
    extract::{Multipart, State},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use bytes::{Bytes, BytesMut};
use multer::{Constraints, SizeLimit};

use crate::category::Category;
use crate::error::UploadError;
use crate::media::{MAX_UPLOAD_BYTES, UploadRequest, UploadResponse};
use crate::routes::AppState;
use crate::transport::UploadTransport;

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";
const TYPE_FIELD_LIMIT: u64 = 64;

/// Raw pieces of the `file` part before they become an [`UploadRequest`].
struct FilePart {
    bytes: Bytes,
    media_type: String,
    file_name: String,
}

fn into_request(
    file: Option<FilePart>,
    category: Option<String>,
) -> Result<UploadRequest, UploadError> {
    let file = file.ok_or_else(|| UploadError::invalid_request("No file uploaded"))?;
    Ok(UploadRequest::new(
        file.bytes,
        file.media_type,
        Category::from_form_value(category.as_deref()),
        file.file_name,
    ))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadRequest, UploadError> {
    let mut file = None;
    let mut category = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(UploadError::invalid_request(format!(
                    "Failed to read form: {err}"
                )));
            }
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let media_type = field.content_type().unwrap_or(DEFAULT_MEDIA_TYPE).to_string();
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(|err| {
                    UploadError::invalid_request(format!("Failed to read file: {err}"))
                })?;
                file = Some(FilePart {
                    bytes,
                    media_type,
                    file_name,
                });
            }
            Some("type") => {
                let value = field.text().await.map_err(|err| {
                    UploadError::invalid_request(format!("Failed to read type: {err}"))
                })?;
                category = Some(value);
            }
            _ => {}
        }
    }
    into_request(file, category)
}

/// Streams the form through `multer` directly. The whole body is capped at
/// `body_limit`, the `file` part at the upload ceiling.
async fn read_form_streaming(
    headers: &HeaderMap,
    body: Body,
    body_limit: usize,
) -> Result<UploadRequest, UploadError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| UploadError::invalid_request("Missing multipart content type"))?;
    let boundary = multer::parse_boundary(content_type)
        .map_err(|err| UploadError::invalid_request(format!("Invalid multipart body: {err}")))?;
    let constraints = Constraints::new().size_limit(
        SizeLimit::new()
            .whole_stream(body_limit as u64)
            .for_field("type", TYPE_FIELD_LIMIT),
    );
    let mut multipart =
        multer::Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut file = None;
    let mut category = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::invalid_request(format!("Failed to read form: {err}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let media_type = field
                    .content_type()
                    .map(|mime| mime.to_string())
                    .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
                let file_name = field.file_name().unwrap_or("").to_string();
                let mut buffer = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(|err| {
                    UploadError::invalid_request(format!("Failed to read file: {err}"))
                })? {
                    buffer.extend_from_slice(&chunk);
                    if buffer.len() >= MAX_UPLOAD_BYTES {
                        return Err(UploadError::too_large(MAX_UPLOAD_BYTES));
                    }
                }
                file = Some(FilePart {
                    bytes: buffer.freeze(),
                    media_type,
                    file_name,
                });
            }
            Some("type") => {
                let value = field.text().await.map_err(|err| {
                    UploadError::invalid_request(format!("Failed to read type: {err}"))
                })?;
                category = Some(value);
            }
            _ => {}
        }
    }
    into_request(file, category)
}

/// `POST /api/upload`
#[tracing::instrument(skip_all)]
pub async fn upload_primary(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let request = read_form(multipart).await?;
    let stored = state.primary.upload(&request).await?;
    Ok(Json(UploadResponse::from(&stored)))
}

/// `POST /api/upload-fallback`
#[tracing::instrument(skip_all)]
pub async fn upload_fallback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, UploadError> {
    let request = read_form_streaming(&headers, body, state.body_limit)
        .await
        .map_err(UploadError::exhausted)?;
    let stored = state.fallback.upload(&request).await?;
    Ok(Json(UploadResponse::from(&stored)))
}

/// `POST /api/media`: normalize, primary, then fallback, all in-process.
#[tracing::instrument(skip_all)]
pub async fn upload_orchestrated(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let request = read_form(multipart).await?;
    let stored = state.orchestrator.upload(request).await?;
    Ok(Json(UploadResponse::from(&stored)))
}
