use axum::http::Method;

use super::RouteRegistrar;
use crate::{
    AppState,
    auth::access::{DOCUMENT_EDITORS, DOCUMENT_READERS},
    handlers::documents,
};

/// Document Router Module
///
/// Every role may list documents. Only ADMIN and EDITOR may touch the files.
pub fn register(registrar: RouteRegistrar<AppState>) -> RouteRegistrar<AppState> {
    registrar
        .restricted(
            Method::POST,
            "/document/upload",
            documents::upload_document,
            DOCUMENT_EDITORS,
        )
        .restricted(
            Method::GET,
            "/document",
            documents::list_documents,
            DOCUMENT_READERS,
        )
        .restricted(
            Method::GET,
            "/document/download/{id}",
            documents::download_document,
            DOCUMENT_EDITORS,
        )
        .restricted(
            Method::PATCH,
            "/document/rename/{id}",
            documents::rename_document,
            DOCUMENT_EDITORS,
        )
        .restricted(
            Method::DELETE,
            "/document/{id}",
            documents::delete_document,
            DOCUMENT_EDITORS,
        )
}
