use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
    models::{ApiResponse, CreateRoleRequest, RoleRecord, UpdateRoleRequest},
};

fn role_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Role {id} not found"))
}

fn role_taken(e: AppError) -> AppError {
    match e {
        AppError::Conflict(_) => AppError::Conflict("Role already exists".to_string()),
        other => other,
    }
}

/// create_role
///
/// [Admin Route] Adds a role row. Only `ADMIN`, `EDITOR` and `VIEWER` are accepted, and
/// each may exist once.
#[utoipa::path(
    post,
    path = "/role",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Created (data: RoleRecord)", body = RoleRecord),
        (status = 409, description = "Role already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_role(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<ApiResponse<RoleRecord>> {
    let role = state
        .repo
        .create_role(payload.role_name, caller.user_id())
        .await
        .map_err(role_taken)?;

    Ok(ApiResponse::created("Role created successfully", role))
}

/// list_roles
///
/// [Admin Route]
#[utoipa::path(
    get,
    path = "/role",
    responses((status = 200, description = "Roles (data: [RoleRecord])", body = Vec<RoleRecord>)),
    security(("bearer_auth" = []))
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<ApiResponse<Vec<RoleRecord>>> {
    let roles = state.repo.list_roles().await?;
    Ok(ApiResponse::ok("Roles retrieved successfully", roles))
}

/// get_role
///
/// [Admin Route]
#[utoipa::path(
    get,
    path = "/role/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Found (data: RoleRecord)", body = RoleRecord),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<RoleRecord>> {
    let role = state
        .repo
        .get_role(id)
        .await?
        .ok_or_else(|| role_not_found(id))?;
    Ok(ApiResponse::ok("Role retrieved successfully", role))
}

/// update_role
///
/// [Admin Route] Renames a role. Users keep pointing at the same row, so they pick up the
/// new name on their next login.
#[utoipa::path(
    patch,
    path = "/role/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated (data: RoleRecord)", body = RoleRecord),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Role already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<ApiResponse<RoleRecord>> {
    let role = state
        .repo
        .update_role(id, payload.role_name, caller.user_id())
        .await
        .map_err(role_taken)?
        .ok_or_else(|| role_not_found(id))?;

    Ok(ApiResponse::ok("Role updated successfully", role))
}

/// delete_role
///
/// [Admin Route] Users holding the role are left without one.
#[utoipa::path(
    delete,
    path = "/role/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Deleted (data: RoleRecord)", body = RoleRecord),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_role(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<RoleRecord>> {
    let role = state
        .repo
        .delete_role(id)
        .await?
        .ok_or_else(|| role_not_found(id))?;

    tracing::info!(role = %role.role_name, deleted_by = caller.user_id(), "role deleted");
    Ok(ApiResponse::ok("Role deleted successfully", role))
}
