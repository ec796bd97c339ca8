use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
    models::{ApiResponse, Document, NewDocument, RenameDocumentRequest, UploadDocumentForm},
    storage::{StorageError, sanitize_file_name},
};

/// Multipart field carrying the file.
pub const DOCUMENT_FIELD: &str = "document";
/// Multipart field carrying the human-readable title.
pub const TITLE_FIELD: &str = "title";

fn document_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Document {id} not found"))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}

struct Upload {
    title: Option<String>,
    original_name: String,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut title = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(TITLE_FIELD) => {
                title = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(DOCUMENT_FIELD) => {
                let original_name = field
                    .file_name()
                    .map(str::to_owned)
                    .ok_or_else(|| AppError::Validation("Uploaded file has no name".to_string()))?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((original_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (original_name, bytes) =
        file.ok_or_else(|| AppError::Validation("A `document` file is required".to_string()))?;

    Ok(Upload {
        title,
        original_name,
        bytes,
    })
}

/// upload_document
///
/// [Editor Route] Accepts `multipart/form-data` with a `document` file and an optional
/// `title` (defaults to the file name). The file is stored as
/// `<unix-millis>-<sanitized name>` and a document record is created.
#[utoipa::path(
    post,
    path = "/document/upload",
    request_body(content = UploadDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Uploaded (data: Document)", body = Document),
        (status = 400, description = "Missing file or unusable file name"),
        (status = 403, description = "ADMIN or EDITOR only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_document(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResponse<Document>> {
    let upload = read_upload(multipart).await?;

    let stored = state
        .storage
        .save(&upload.original_name, &upload.bytes)
        .await?;

    let title = upload
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| upload.original_name.clone());

    let document = state
        .repo
        .create_document(NewDocument {
            title,
            file_name: stored.file_name,
            file_path: stored.file_path,
            created_by: Some(caller.user_id().to_string()),
        })
        .await?;

    tracing::info!(
        document_id = %document.id,
        size = upload.bytes.len(),
        uploaded_by = caller.user_id(),
        "document uploaded"
    );
    Ok(ApiResponse::created("Document uploaded successfully", document))
}

/// list_documents
///
/// [Reader Route] Document metadata, newest first. Open to every role.
#[utoipa::path(
    get,
    path = "/document",
    responses((status = 200, description = "Documents (data: [Document])", body = Vec<Document>)),
    security(("bearer_auth" = []))
)]
pub async fn list_documents(State(state): State<AppState>) -> Result<ApiResponse<Vec<Document>>> {
    let documents = state.repo.list_documents().await?;
    Ok(ApiResponse::ok("Documents retrieved successfully", documents))
}

fn attachment_disposition(file_name: &str) -> HeaderValue {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() || c.is_ascii_control() => '_',
            c => c,
        })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// download_document
///
/// [Editor Route] Streams back the stored bytes as an attachment. The content type is
/// guessed from the file extension.
#[utoipa::path(
    get,
    path = "/document/download/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let document = state
        .repo
        .get_document(id)
        .await?
        .ok_or_else(|| document_not_found(id))?;

    let bytes = state.storage.read(&document.file_path).await.map_err(|e| match e {
        StorageError::NotFound(_) => {
            tracing::error!(document_id = %id, path = %document.file_path, "document file missing");
            document_not_found(id)
        }
        other => other.into(),
    })?;

    let mime = mime_guess::from_path(&document.file_name).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.essence_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&document.file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// rename_document
///
/// [Editor Route] Renames the stored file within its directory and updates the record.
#[utoipa::path(
    patch,
    path = "/document/rename/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = RenameDocumentRequest,
    responses(
        (status = 200, description = "Renamed (data: Document)", body = Document),
        (status = 400, description = "Unusable file name"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Another file already has that name")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename_document(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameDocumentRequest>,
) -> Result<ApiResponse<Document>> {
    payload.validate()?;
    let file_name = sanitize_file_name(&payload.file_name)?;

    let document = state
        .repo
        .get_document(id)
        .await?
        .ok_or_else(|| document_not_found(id))?;

    let file_path = state
        .storage
        .rename(&document.file_path, &file_name)
        .await
        .map_err(|e| match e {
            StorageError::AlreadyExists(name) => {
                AppError::Conflict(format!("A file named {name} already exists"))
            }
            other => other.into(),
        })?;

    let document = state
        .repo
        .rename_document(id, &file_name, &file_path, caller.user_id())
        .await?
        .ok_or_else(|| document_not_found(id))?;

    Ok(ApiResponse::ok("Document renamed successfully", document))
}

/// delete_document
///
/// [Editor Route] Removes the stored file, then the record. A file that is already gone
/// does not block removing the record.
#[utoipa::path(
    delete,
    path = "/document/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Deleted (data: Document)", body = Document),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_document(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Document>> {
    let document = state
        .repo
        .get_document(id)
        .await?
        .ok_or_else(|| document_not_found(id))?;

    match state.storage.delete(&document.file_path).await {
        Ok(()) => {}
        Err(StorageError::NotFound(path)) => {
            tracing::warn!(document_id = %id, path = %path, "document file already missing");
        }
        Err(e) => return Err(e.into()),
    }

    let document = state
        .repo
        .delete_document(id)
        .await?
        .ok_or_else(|| document_not_found(id))?;

    tracing::info!(document_id = %id, deleted_by = caller.user_id(), "document deleted");
    Ok(ApiResponse::ok("Document deleted successfully", document))
}
