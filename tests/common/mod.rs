#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use dms_backend::{
    AppConfig, AppState, Identity, MockStorageService, create_router,
    error::{AppError, Result},
    models::{
        Document, NewDocument, NewUser, Role, RoleRecord, User, UserChanges, UserCredentials,
    },
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

// --- In-Memory Repository ---

#[derive(Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// InMemoryRepository
///
/// A `Repository` backed by vectors, seeded with one row per role. Mirrors the unique
/// constraints of the real schema (email, role name, file path).
pub struct InMemoryRepository {
    roles: Mutex<Vec<RoleRecord>>,
    users: Mutex<Vec<StoredUser>>,
    documents: Mutex<Vec<Document>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        let roles = Role::ALL
            .into_iter()
            .map(|role_name| RoleRecord {
                id: Uuid::new_v4(),
                role_name,
                created_at: Utc::now(),
                created_by: Some("system".to_string()),
                updated_at: None,
                updated_by: None,
            })
            .collect();

        Self {
            roles: Mutex::new(roles),
            users: Mutex::new(Vec::new()),
            documents: Mutex::new(Vec::new()),
        }
    }
}

impl InMemoryRepository {
    pub async fn role_id(&self, role: Role) -> Uuid {
        self.roles
            .lock()
            .await
            .iter()
            .find(|r| r.role_name == role)
            .map(|r| r.id)
            .expect("seeded role")
    }

    pub async fn document_count(&self) -> usize {
        self.documents.lock().await.len()
    }

    /// Inserts a document row directly, as if uploaded earlier.
    pub async fn seed_document(&self, title: &str, file_name: &str, file_path: &str) -> Document {
        self.create_document(NewDocument {
            title: title.to_string(),
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            created_by: None,
        })
        .await
        .expect("seed document")
    }

    async fn role_name(&self, id: Option<Uuid>) -> Option<String> {
        let id = id?;
        self.roles
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.role_name.to_string())
    }
}

fn conflict() -> AppError {
    AppError::Conflict("A record with the same unique value already exists".to_string())
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.user.email == user.email) {
            return Err(conflict());
        }
        let created = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            mobile: user.mobile,
            role: user.role,
            created_at: Utc::now(),
            created_by: user.created_by,
            updated_at: None,
            updated_by: None,
        };
        users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let found = self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.user.email == email)
            .cloned();
        let Some(stored) = found else {
            return Ok(None);
        };
        let role_name = self.role_name(stored.user.role).await;
        Ok(Some(UserCredentials {
            id: stored.user.id,
            email: stored.user.email,
            password_hash: stored.password_hash,
            role_name,
        }))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.lock().await.iter().map(|u| u.user.clone()).collect())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
        updated_by: &str,
    ) -> Result<Option<User>> {
        let mut users = self.users.lock().await;
        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.user.id != id && &u.user.email == email) {
                return Err(conflict());
            }
        }
        let Some(stored) = users.iter_mut().find(|u| u.user.id == id) else {
            return Ok(None);
        };
        let user = &mut stored.user;
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.mobile {
            user.mobile = v;
        }
        if let Some(v) = changes.role {
            user.role = Some(v);
        }
        if let Some(v) = changes.password_hash {
            stored.password_hash = v;
        }
        stored.user.updated_at = Some(Utc::now());
        stored.user.updated_by = Some(updated_by.to_string());
        Ok(Some(stored.user.clone()))
    }

    async fn assign_role(&self, id: Uuid, role: Uuid, updated_by: &str) -> Result<Option<User>> {
        self.update_user(
            id,
            UserChanges {
                role: Some(role),
                ..UserChanges::default()
            },
            updated_by,
        )
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>> {
        let mut users = self.users.lock().await;
        let position = users.iter().position(|u| u.user.id == id);
        Ok(position.map(|i| users.remove(i).user))
    }

    async fn create_role(&self, role_name: Role, created_by: &str) -> Result<RoleRecord> {
        let mut roles = self.roles.lock().await;
        if roles.iter().any(|r| r.role_name == role_name) {
            return Err(conflict());
        }
        let record = RoleRecord {
            id: Uuid::new_v4(),
            role_name,
            created_at: Utc::now(),
            created_by: Some(created_by.to_string()),
            updated_at: None,
            updated_by: None,
        };
        roles.push(record.clone());
        Ok(record)
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn get_role(&self, id: Uuid) -> Result<Option<RoleRecord>> {
        Ok(self.roles.lock().await.iter().find(|r| r.id == id).cloned())
    }

    async fn update_role(
        &self,
        id: Uuid,
        role_name: Role,
        updated_by: &str,
    ) -> Result<Option<RoleRecord>> {
        let mut roles = self.roles.lock().await;
        if !roles.iter().any(|r| r.id == id) {
            return Ok(None);
        }
        if roles.iter().any(|r| r.id != id && r.role_name == role_name) {
            return Err(conflict());
        }
        Ok(roles.iter_mut().find(|r| r.id == id).map(|r| {
            r.role_name = role_name;
            r.updated_at = Some(Utc::now());
            r.updated_by = Some(updated_by.to_string());
            r.clone()
        }))
    }

    async fn delete_role(&self, id: Uuid) -> Result<Option<RoleRecord>> {
        let removed = {
            let mut roles = self.roles.lock().await;
            let position = roles.iter().position(|r| r.id == id);
            position.map(|i| roles.remove(i))
        };
        if removed.is_some() {
            for stored in self.users.lock().await.iter_mut() {
                if stored.user.role == Some(id) {
                    stored.user.role = None;
                }
            }
        }
        Ok(removed)
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document> {
        let mut documents = self.documents.lock().await;
        if documents.iter().any(|d| d.file_path == document.file_path) {
            return Err(conflict());
        }
        let created = Document {
            id: Uuid::new_v4(),
            title: document.title,
            file_name: document.file_name,
            file_path: document.file_path,
            created_at: Utc::now(),
            created_by: document.created_by,
            updated_at: None,
            updated_by: None,
        };
        documents.push(created.clone());
        Ok(created)
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.lock().await.clone())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self
            .documents
            .lock()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn rename_document(
        &self,
        id: Uuid,
        file_name: &str,
        file_path: &str,
        updated_by: &str,
    ) -> Result<Option<Document>> {
        Ok(self
            .documents
            .lock()
            .await
            .iter_mut()
            .find(|d| d.id == id)
            .map(|d| {
                d.file_name = file_name.to_string();
                d.file_path = file_path.to_string();
                d.updated_at = Some(Utc::now());
                d.updated_by = Some(updated_by.to_string());
                d.clone()
            }))
    }

    async fn delete_document(&self, id: Uuid) -> Result<Option<Document>> {
        let mut documents = self.documents.lock().await;
        let position = documents.iter().position(|d| d.id == id);
        Ok(position.map(|i| documents.remove(i)))
    }
}

// --- App Harness ---

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(MockStorageService::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        let repo = Arc::new(InMemoryRepository::default());
        let state = AppState::new(
            repo.clone() as RepositoryState,
            Arc::new(storage.clone()) as StorageState,
            AppConfig::default(),
        );
        Self {
            router: create_router(state.clone()),
            state,
            repo,
            storage,
        }
    }

    /// A signed token for a made-up caller holding `role`.
    pub fn token(&self, role: Option<Role>) -> String {
        let label = role.map(|r| r.as_str().to_lowercase()).unwrap_or_else(|| "norole".into());
        let identity = Identity::new(
            Uuid::new_v4().to_string(),
            format!("{label}@example.com"),
            role,
        );
        self.state.tokens.issue(&identity).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec();
        (status, body, headers)
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body, _) = self.send(request).await;
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };
        (status, json)
    }
}

// --- Request Builders ---

pub fn get(uri: &str, token: Option<&String>) -> Request<Body> {
    with_auth(Request::get(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, token: Option<&String>) -> Request<Body> {
    with_auth(Request::delete(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: &str, uri: &str, token: Option<&String>, body: Value) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub const BOUNDARY: &str = "dms-test-boundary";

/// A `multipart/form-data` upload with a `title` field and a `document` file.
pub fn upload(token: Option<&String>, title: &str, file_name: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    with_auth(Request::post("/document/upload"), token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn with_auth(
    builder: axum::http::request::Builder,
    token: Option<&String>,
) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}
