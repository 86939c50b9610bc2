// crates/server/src/upload.rs
//! Image upload extractor shared by every submission endpoint.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use bytes::Bytes;

use crate::error::ApiError;

/// Multipart field the upload form posts the image under.
pub const FILE_FIELD: &str = "file";

/// The bytes of an uploaded image.
///
/// Accepts either a raw request body or `multipart/form-data`, where the
/// image is the `file` field (or, failing that, the first field carrying a
/// file name). Empty uploads are rejected.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: Option<String>,
}

impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let upload = if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            from_multipart(multipart).await?
        } else {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            ImageUpload {
                bytes,
                file_name: None,
            }
        };

        if upload.bytes.is_empty() {
            return Err(ApiError::BadRequest("empty image upload".to_string()));
        }
        Ok(upload)
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

async fn from_multipart(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection(e.status(), e.body_text()))?
    {
        let is_file = field.name() == Some(FILE_FIELD) || field.file_name().is_some();
        if !is_file {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        return Ok(ImageUpload { bytes, file_name });
    }

    Err(ApiError::BadRequest(format!(
        "multipart upload has no `{FILE_FIELD}` field"
    )))
}

fn rejection(status: StatusCode, message: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}
