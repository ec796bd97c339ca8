use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, Identity},
    error::{AppError, Result},
    models::{
        ApiResponse, AssignRoleRequest, CreateUserByAdminRequest, LoginRequest, LoginResponse,
        NewUser, RegisterUserRequest, UpdateUserRequest, User, UserChanges,
    },
    password::{hash_password, verify_password, verify_unknown_user},
};

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User {id} not found"))
}

fn email_taken(e: AppError) -> AppError {
    match e {
        AppError::Conflict(_) => AppError::Conflict("Email is already registered".to_string()),
        other => other,
    }
}

async fn ensure_role_exists(state: &AppState, role: Uuid) -> Result<()> {
    match state.repo.get_role(role).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Role {role} not found"))),
    }
}

/// register_user
///
/// [Public Route] Self-service sign-up. The account starts without a role, so it can log
/// in but is refused by every role-restricted route until an admin assigns one.
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered (data: User)", body = User),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<ApiResponse<User>> {
    payload.validate()?;

    let new_user = NewUser {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email.to_lowercase(),
        password_hash: hash_password(&payload.password)?,
        mobile: payload.mobile,
        role: None,
        created_by: None,
    };

    let user = state.repo.create_user(new_user).await.map_err(email_taken)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::created("User registered successfully", user))
}

/// login
///
/// [Public Route] Exchanges email and password for a 24h access token carrying the
/// user's id, email and role. Unknown email and wrong password get the same answer.
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in (data: LoginResponse)", body = LoginResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    payload.validate()?;

    let Some(credentials) = state
        .repo
        .find_credentials_by_email(&payload.email.to_lowercase())
        .await?
    else {
        verify_unknown_user(&payload.password);
        return Err(AppError::InvalidLogin);
    };

    if !verify_password(&payload.password, &credentials.password_hash) {
        tracing::info!(user_id = %credentials.id, "login rejected: wrong password");
        return Err(AppError::InvalidLogin);
    }

    let identity = Identity::new(
        credentials.id.to_string(),
        credentials.email.as_str(),
        credentials.role(),
    );
    let access_token = state.tokens.issue(&identity)?;

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse { access_token },
    ))
}

/// create_user_by_admin
///
/// [Admin Route] Creates an account with an initial role.
#[utoipa::path(
    post,
    path = "/user/admin",
    request_body = CreateUserByAdminRequest,
    responses(
        (status = 201, description = "Created (data: User)", body = User),
        (status = 404, description = "Role not found"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user_by_admin(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserByAdminRequest>,
) -> Result<ApiResponse<User>> {
    payload.validate()?;
    ensure_role_exists(&state, payload.role).await?;

    let new_user = NewUser {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email.to_lowercase(),
        password_hash: hash_password(&payload.password)?,
        mobile: payload.mobile,
        role: Some(payload.role),
        created_by: Some(caller.user_id().to_string()),
    };

    let user = state.repo.create_user(new_user).await.map_err(email_taken)?;

    Ok(ApiResponse::created("User created successfully", user))
}

/// assign_role
///
/// [Admin Route] Replaces a user's role. Takes effect on the user's next login.
#[utoipa::path(
    patch,
    path = "/user/role/assign/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned (data: User)", body = User),
        (status = 404, description = "User or role not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_role(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<ApiResponse<User>> {
    ensure_role_exists(&state, payload.role).await?;

    let user = state
        .repo
        .assign_role(id, payload.role, caller.user_id())
        .await?
        .ok_or_else(|| user_not_found(id))?;

    Ok(ApiResponse::ok("Role assigned successfully", user))
}

/// list_users
///
/// [Authenticated Route] Every user, newest first.
#[utoipa::path(
    get,
    path = "/user",
    responses((status = 200, description = "Users (data: [User])", body = Vec<User>)),
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<ApiResponse<Vec<User>>> {
    let users = state.repo.list_users().await?;
    Ok(ApiResponse::ok("Users retrieved successfully", users))
}

/// get_user
///
/// [Authenticated Route]
#[utoipa::path(
    get,
    path = "/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found (data: User)", body = User),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<User>> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(ApiResponse::ok("User retrieved successfully", user))
}

/// update_user
///
/// [Admin Route] Partial update. A new password is hashed before it is stored.
#[utoipa::path(
    patch,
    path = "/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated (data: User)", body = User),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<ApiResponse<User>> {
    payload.validate()?;
    if let Some(role) = payload.role {
        ensure_role_exists(&state, role).await?;
    }

    let changes = UserChanges {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email.map(|email| email.to_lowercase()),
        password_hash: payload
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?,
        mobile: payload.mobile,
        role: payload.role,
    };

    let user = state
        .repo
        .update_user(id, changes, caller.user_id())
        .await
        .map_err(email_taken)?
        .ok_or_else(|| user_not_found(id))?;

    Ok(ApiResponse::ok("User updated successfully", user))
}

/// delete_user
///
/// [Admin Route] Deletes the account and returns the removed record.
#[utoipa::path(
    delete,
    path = "/user/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted (data: User)", body = User),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<User>> {
    let user = state
        .repo
        .delete_user(id)
        .await?
        .ok_or_else(|| user_not_found(id))?;

    tracing::info!(user_id = %id, deleted_by = caller.user_id(), "user deleted");
    Ok(ApiResponse::ok("User deleted successfully", user))
}
