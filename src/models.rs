use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Roles ---

/// Role
///
/// The closed set of authorization levels. Serialized (in tokens, JSON bodies and the
/// `roles.role_name` column) as the uppercase names `ADMIN`, `EDITOR`, `VIEWER`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Editor => "EDITOR",
            Role::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown role `{0}` (expected ADMIN, EDITOR or VIEWER)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

// Used by `#[sqlx(try_from = "String")]` when decoding `roles.role_name`.
impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// RoleRecord
///
/// A row of the `roles` table. Users reference a role by its `id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoleRecord {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub role_name: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

// --- Users ---

/// User
///
/// The public view of a row in the `users` table. The password hash is never part of
/// this struct, so it can't leak through a handler response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    // FK to roles.id; a user holds at most one role.
    pub role: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

/// UserCredentials
///
/// Login lookup row: the stored hash plus the joined role name. Internal only.
#[derive(Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role_name: Option<String>,
}

impl UserCredentials {
    /// The user's role, if one is assigned and it names a known role.
    pub fn role(&self) -> Option<Role> {
        self.role_name.as_deref().and_then(|name| name.parse().ok())
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role_name", &self.role_name)
            .finish()
    }
}

/// NewUser
///
/// Insert payload assembled by the handlers after validation and hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile: String,
    pub role: Option<Uuid>,
    pub created_by: Option<String>,
}

/// UserChanges
///
/// Partial update; `None` leaves the column untouched (COALESCE in SQL).
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub mobile: Option<String>,
    pub role: Option<Uuid>,
}

// --- Documents ---

/// Document
///
/// A row of the `documents` table. `file_path` locates the blob in storage and stays
/// server-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub file_path: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub file_name: String,
    pub file_path: String,
    pub created_by: Option<String>,
}

// --- Request Payloads ---

/// RegisterUserRequest
///
/// Self-service registration (POST /user/register). The password is hashed before it
/// reaches the repository and is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    #[schema(example = "John")]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "john.doe@example.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    #[validate(length(min = 7, max = 20, message = "Mobile number must be valid"))]
    #[schema(example = "+1234567890")]
    pub mobile: String,
}

/// CreateUserByAdminRequest
///
/// Same as registration, plus the role the new account starts with (POST /user/admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateUserByAdminRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    #[validate(length(min = 7, max = 20, message = "Mobile number must be valid"))]
    pub mobile: String,
    /// Role id (roles.id).
    pub role: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AssignRoleRequest {
    /// Role id (roles.id).
    pub role: Uuid,
}

/// UpdateUserRequest
///
/// Partial update payload (PATCH /user/{id}). Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 7, max = 20, message = "Mobile number must be valid"))]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Uuid>,
}

/// CreateRoleRequest
///
/// Only the three known role names deserialize; anything else is rejected by serde.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateRoleRequest {
    pub role_name: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role_name: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RenameDocumentRequest {
    #[validate(length(min = 1, max = 255, message = "fileName must be 1-255 characters"))]
    #[schema(example = "updated-document-name.pdf")]
    pub file_name: String,
}

/// UploadDocumentForm
///
/// Documentation-only shape of the multipart body accepted by POST /document/upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentForm {
    #[schema(example = "Quarterly Report")]
    pub title: String,
    #[schema(value_type = String, format = Binary)]
    pub document: Vec<u8>,
}

// --- Response Envelope ---

/// ApiResponse
///
/// The success envelope shared by every JSON endpoint:
/// `{"statusCode": 200, "message": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
