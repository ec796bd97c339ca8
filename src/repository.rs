use crate::error::{AppError, Result};
use crate::models::{
    Document, NewDocument, NewUser, Role, RoleRecord, User, UserChanges, UserCredentials,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

/// Repository Trait
///
/// The persistence contract used by the handlers. Each method is a single statement;
/// lookups by id return `Ok(None)` for a missing row and leave the 404 to the caller.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`) shareable
/// across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> Result<User>;
    // Login lookup, joined with the role name.
    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    // Partial update; `None` fields keep their value.
    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
        updated_by: &str,
    ) -> Result<Option<User>>;
    async fn assign_role(&self, id: Uuid, role: Uuid, updated_by: &str) -> Result<Option<User>>;
    // Returns the deleted row.
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>>;

    // --- Roles ---
    async fn create_role(&self, role_name: Role, created_by: &str) -> Result<RoleRecord>;
    async fn list_roles(&self) -> Result<Vec<RoleRecord>>;
    async fn get_role(&self, id: Uuid) -> Result<Option<RoleRecord>>;
    async fn update_role(
        &self,
        id: Uuid,
        role_name: Role,
        updated_by: &str,
    ) -> Result<Option<RoleRecord>>;
    async fn delete_role(&self, id: Uuid) -> Result<Option<RoleRecord>>;

    // --- Documents ---
    async fn create_document(&self, document: NewDocument) -> Result<Document>;
    async fn list_documents(&self) -> Result<Vec<Document>>;
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;
    async fn rename_document(
        &self,
        id: Uuid,
        file_name: &str,
        file_path: &str,
        updated_by: &str,
    ) -> Result<Option<Document>>;
    async fn delete_document(&self, id: Uuid) -> Result<Option<Document>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, first_name, last_name, email, mobile, role, \
     created_at, created_by, updated_at, updated_by";
const ROLE_COLUMNS: &str = "id, role_name, created_at, created_by, updated_at, updated_by";
const DOCUMENT_COLUMNS: &str =
    "id, title, file_name, file_path, created_at, created_by, updated_at, updated_by";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Failures are logged here and
/// propagated as `AppError`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Constraint violations become 409/400 answers; only real failures are errors.
fn failure_level(error: &AppError) -> Level {
    match error {
        AppError::Database(_) => Level::ERROR,
        _ => Level::DEBUG,
    }
}

fn logged<T>(operation: &'static str, result: sqlx::Result<T>) -> Result<T> {
    result.map_err(|e| {
        let error: AppError = e.into();
        if failure_level(&error) == Level::ERROR {
            tracing::error!(operation, error = ?error, "database operation failed");
        } else {
            tracing::debug!(operation, error = %error, "database rejected the operation");
        }
        error
    })
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, mobile, role, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.mobile)
            .bind(user.role)
            .bind(user.created_by)
            .fetch_one(&self.pool)
            .await;
        logged("create_user", result)
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let result = sqlx::query_as::<_, UserCredentials>(
            "SELECT u.id, u.email, u.password_hash, r.role_name \
             FROM users u LEFT JOIN roles r ON r.id = u.role \
             WHERE u.email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        logged("find_credentials_by_email", result)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        let result = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await;
        logged("list_users", result)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        logged("get_user", result)
    }

    /// Uses COALESCE so absent fields keep their stored value.
    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
        updated_by: &str,
    ) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                password_hash = COALESCE($5, password_hash), \
                mobile = COALESCE($6, mobile), \
                role = COALESCE($7, role), \
                updated_at = now(), \
                updated_by = $8 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.mobile)
            .bind(changes.role)
            .bind(updated_by)
            .fetch_optional(&self.pool)
            .await;
        logged("update_user", result)
    }

    async fn assign_role(&self, id: Uuid, role: Uuid, updated_by: &str) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = now(), updated_by = $3 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .bind(updated_by)
            .fetch_optional(&self.pool)
            .await;
        logged("assign_role", result)
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        logged("delete_user", result)
    }

    async fn create_role(&self, role_name: Role, created_by: &str) -> Result<RoleRecord> {
        let sql = format!(
            "INSERT INTO roles (role_name, created_by) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}"
        );
        let result = sqlx::query_as::<_, RoleRecord>(&sql)
            .bind(role_name.as_str())
            .bind(created_by)
            .fetch_one(&self.pool)
            .await;
        logged("create_role", result)
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY role_name");
        let result = sqlx::query_as::<_, RoleRecord>(&sql)
            .fetch_all(&self.pool)
            .await;
        logged("list_roles", result)
    }

    async fn get_role(&self, id: Uuid) -> Result<Option<RoleRecord>> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1");
        let result = sqlx::query_as::<_, RoleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        logged("get_role", result)
    }

    async fn update_role(
        &self,
        id: Uuid,
        role_name: Role,
        updated_by: &str,
    ) -> Result<Option<RoleRecord>> {
        let sql = format!(
            "UPDATE roles SET role_name = $2, updated_at = now(), updated_by = $3 \
             WHERE id = $1 RETURNING {ROLE_COLUMNS}"
        );
        let result = sqlx::query_as::<_, RoleRecord>(&sql)
            .bind(id)
            .bind(role_name.as_str())
            .bind(updated_by)
            .fetch_optional(&self.pool)
            .await;
        logged("update_role", result)
    }

    /// Users holding the role keep their account; their role becomes NULL.
    async fn delete_role(&self, id: Uuid) -> Result<Option<RoleRecord>> {
        let sql = format!("DELETE FROM roles WHERE id = $1 RETURNING {ROLE_COLUMNS}");
        let result = sqlx::query_as::<_, RoleRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        logged("delete_role", result)
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document> {
        let sql = format!(
            "INSERT INTO documents (title, file_name, file_path, created_by) \
             VALUES ($1, $2, $3, $4) RETURNING {DOCUMENT_COLUMNS}"
        );
        let result = sqlx::query_as::<_, Document>(&sql)
            .bind(document.title)
            .bind(document.file_name)
            .bind(document.file_path)
            .bind(document.created_by)
            .fetch_one(&self.pool)
            .await;
        logged("create_document", result)
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC");
        let result = sqlx::query_as::<_, Document>(&sql)
            .fetch_all(&self.pool)
            .await;
        logged("list_documents", result)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");
        let result = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        logged("get_document", result)
    }

    async fn rename_document(
        &self,
        id: Uuid,
        file_name: &str,
        file_path: &str,
        updated_by: &str,
    ) -> Result<Option<Document>> {
        let sql = format!(
            "UPDATE documents SET file_name = $2, file_path = $3, updated_at = now(), updated_by = $4 \
             WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}"
        );
        let result = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .bind(file_name)
            .bind(file_path)
            .bind(updated_by)
            .fetch_optional(&self.pool)
            .await;
        logged("rename_document", result)
    }

    async fn delete_document(&self, id: Uuid) -> Result<Option<Document>> {
        let sql = format!("DELETE FROM documents WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}");
        let result = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        logged("delete_document", result)
    }
}
