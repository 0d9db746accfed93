//! File uploads for property photos and documents.
//!
//! Uploads arrive as `multipart/form-data`. The file is checked against the
//! kind's size and type rules, written under the upload root as
//! `{photos|documents}/{prefix}-{millis}-{nonce}{ext}` and served back from
//! `/uploads/...`. Any other form fields are kept as text so handlers can
//! build the same request they would get from a JSON body.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::{
    async_trait,
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};
use crate::extractors::ApiJson;
use crate::telemetry::metrics::with_metrics;

const MB: usize = 1024 * 1024;

/// What is being uploaded; decides limits, naming and storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Document,
}

impl UploadKind {
    /// Multipart field that must carry the file.
    pub fn field_name(self) -> &'static str {
        match self {
            UploadKind::Photo => "photo",
            UploadKind::Document => "document",
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            UploadKind::Photo => 5 * MB,
            UploadKind::Document => 10 * MB,
        }
    }

    fn directory(self) -> &'static str {
        match self {
            UploadKind::Photo => "photos",
            UploadKind::Document => "documents",
        }
    }

    fn file_prefix(self) -> &'static str {
        match self {
            UploadKind::Photo => "photo",
            UploadKind::Document => "doc",
        }
    }

    /// Accepted extensions, lowercase and without the dot.
    fn extensions(self) -> &'static [&'static str] {
        match self {
            UploadKind::Photo => &["jpeg", "jpg", "png", "gif", "webp"],
            UploadKind::Document => &["pdf", "doc", "docx", "xls", "xlsx", "txt"],
        }
    }

    fn label(self) -> &'static str {
        match self {
            UploadKind::Photo => "photo",
            UploadKind::Document => "document",
        }
    }

    fn too_large(self) -> ApiError {
        ApiError::upload_rejected(format!(
            "File too large. Maximum size is {}MB.",
            self.max_bytes() / MB
        ))
    }

    fn wrong_type(self) -> ApiError {
        let message = match self {
            UploadKind::Photo => "Only image files (jpeg, jpg, png, gif, webp) are allowed!",
            UploadKind::Document => {
                "Only document files (pdf, doc, docx, xls, xlsx, txt) are allowed!"
            }
        };
        ApiError::upload_rejected(message)
    }

    /// Photos must pass on both extension and declared MIME type; documents
    /// are judged by extension.
    fn accepts(self, extension: &str, content_type: Option<&str>) -> bool {
        if !self.extensions().contains(&extension) {
            return false;
        }
        match self {
            UploadKind::Photo => content_type
                .and_then(|ct| ct.strip_prefix("image/"))
                .map(|subtype| self.extensions().contains(&subtype.to_ascii_lowercase().as_str()))
                .unwrap_or(false),
            UploadKind::Document => true,
        }
    }
}

/// Lowercased extension of a client-supplied file name, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Name a stored file. Never reuses the client's name.
pub fn stored_file_name(kind: UploadKind, extension: &str, millis: i64, nonce: u32) -> String {
    format!("{}-{}-{}.{}", kind.file_prefix(), millis, nonce, extension)
}

/// A file pulled out of a multipart body, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A file written to the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub original_name: String,
    pub path: PathBuf,
    /// Public URL, `/uploads/{dir}/{file}`.
    pub url: String,
}

/// Parsed multipart form: at most one file plus the text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Trimmed text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }
}

fn multipart_error(kind: UploadKind, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return kind.too_large();
    }
    ApiError::invalid_input(format!("Invalid multipart body: {}", err.body_text()))
}

/// Read the whole form. A file under any field other than the kind's field
/// is rejected, as is a file over the size limit.
pub async fn read_upload_form(mut multipart: Multipart, kind: UploadKind) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(kind, e))?
    {
        let name = field.name().map(str::to_owned).unwrap_or_default();

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            let value = field.text().await.map_err(|e| multipart_error(kind, e))?;
            form.fields.insert(name, value);
            continue;
        };

        if name != kind.field_name() || form.file.is_some() {
            return Err(ApiError::upload_rejected("Unexpected file field."));
        }

        let content_type = field.content_type().map(str::to_owned);
        let mut buffer = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(kind, e))? {
            if buffer.len() + chunk.len() > kind.max_bytes() {
                with_metrics(|m| m.record_upload(kind.label(), false));
                return Err(kind.too_large());
            }
            buffer.extend_from_slice(&chunk);
        }

        form.file = Some(UploadedFile {
            original_name: file_name,
            content_type,
            bytes: Bytes::from(buffer),
        });
    }

    Ok(form)
}

/// Check and write one file under `upload_root`.
pub async fn store_upload(
    upload_root: &Path,
    kind: UploadKind,
    file: UploadedFile,
) -> ApiResult<StoredUpload> {
    let extension = file_extension(&file.original_name).unwrap_or_default();
    if !kind.accepts(&extension, file.content_type.as_deref()) {
        with_metrics(|m| m.record_upload(kind.label(), false));
        return Err(kind.wrong_type());
    }
    if file.bytes.len() > kind.max_bytes() {
        with_metrics(|m| m.record_upload(kind.label(), false));
        return Err(kind.too_large());
    }

    let directory = upload_root.join(kind.directory());
    tokio::fs::create_dir_all(&directory).await.map_err(|e| {
        tracing::error!(error = %e, dir = %directory.display(), "Failed to create upload directory");
        ApiError::internal_error("Failed to store upload")
    })?;

    let file_name = stored_file_name(
        kind,
        &extension,
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>() % 1_000_000_000,
    );
    let path = directory.join(&file_name);
    tokio::fs::write(&path, &file.bytes).await.map_err(|e| {
        tracing::error!(error = %e, path = %path.display(), "Failed to write upload");
        ApiError::internal_error("Failed to store upload")
    })?;

    with_metrics(|m| m.record_upload(kind.label(), true));
    tracing::info!(
        kind = kind.label(),
        file = %file_name,
        size = file.bytes.len(),
        "Upload stored"
    );

    Ok(StoredUpload {
        original_name: file.original_name,
        url: format!("/uploads/{}/{}", kind.directory(), file_name),
        path,
    })
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Body that is either JSON or `multipart/form-data`, chosen by content type.
pub enum JsonOrMultipart<T> {
    Json(T),
    Multipart(Multipart),
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrMultipart<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::invalid_input(e.body_text()))?;
            return Ok(JsonOrMultipart::Multipart(multipart));
        }

        let ApiJson(body) = ApiJson::<T>::from_request(req, state).await?;
        Ok(JsonOrMultipart::Json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_lowercases() {
        assert_eq!(file_extension("House.JPG").as_deref(), Some("jpg"));
        assert_eq!(file_extension("contract.final.pdf").as_deref(), Some("pdf"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_stored_file_name_format() {
        assert_eq!(
            stored_file_name(UploadKind::Photo, "png", 1_700_000_000_000, 42),
            "photo-1700000000000-42.png"
        );
        assert_eq!(
            stored_file_name(UploadKind::Document, "pdf", 5, 7),
            "doc-5-7.pdf"
        );
    }

    #[test]
    fn test_photo_needs_image_extension_and_mime() {
        let photo = UploadKind::Photo;
        assert!(photo.accepts("jpg", Some("image/jpg")));
        assert!(photo.accepts("webp", Some("image/webp")));
        assert!(!photo.accepts("jpg", Some("application/pdf")));
        assert!(!photo.accepts("jpg", None));
        assert!(!photo.accepts("bmp", Some("image/bmp")));
    }

    #[test]
    fn test_document_judged_by_extension() {
        let doc = UploadKind::Document;
        assert!(doc.accepts("pdf", Some("application/octet-stream")));
        assert!(doc.accepts("xlsx", None));
        assert!(!doc.accepts("exe", Some("application/pdf")));
    }

    #[test]
    fn test_limit_messages() {
        assert_eq!(
            UploadKind::Photo.too_large().message,
            "File too large. Maximum size is 5MB."
        );
        assert_eq!(
            UploadKind::Document.too_large().message,
            "File too large. Maximum size is 10MB."
        );
    }

    #[test]
    fn test_form_text_trims_and_drops_blank() {
        let mut form = UploadForm::default();
        form.fields.insert("caption".into(), "  Front porch ".into());
        form.fields.insert("url".into(), "   ".into());
        assert_eq!(form.text("caption").as_deref(), Some("Front porch"));
        assert_eq!(form.text("url"), None);
        assert_eq!(form.text("missing"), None);
    }

    #[tokio::test]
    async fn test_store_rejects_wrong_type_without_writing() {
        let root = std::env::temp_dir().join(format!("estate-upload-test-{}", std::process::id()));
        let file = UploadedFile {
            original_name: "notes.exe".into(),
            content_type: Some("application/octet-stream".into()),
            bytes: Bytes::from_static(b"MZ"),
        };
        let err = store_upload(&root, UploadKind::Document, file)
            .await
            .expect_err("exe must be rejected");
        assert_eq!(
            err.message,
            "Only document files (pdf, doc, docx, xls, xlsx, txt) are allowed!"
        );
        assert!(!root.join("documents").exists());
    }

    #[tokio::test]
    async fn test_store_writes_under_kind_directory() {
        let root = std::env::temp_dir().join(format!("estate-upload-store-{}", std::process::id()));
        let file = UploadedFile {
            original_name: "listing.txt".into(),
            content_type: Some("text/plain".into()),
            bytes: Bytes::from_static(b"3 bed, 2 bath"),
        };
        let stored = store_upload(&root, UploadKind::Document, file)
            .await
            .expect("txt is allowed");
        assert!(stored.url.starts_with("/uploads/documents/doc-"));
        assert!(stored.url.ends_with(".txt"));
        let written = tokio::fs::read(&stored.path).await.expect("file written");
        assert_eq!(written, b"3 bed, 2 bath");
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
