use chrono::Utc;
use dms_backend::models::{
    ApiResponse, CreateRoleRequest, Document, LoginRequest, RegisterUserRequest,
    RenameDocumentRequest, Role, UnknownRole, UpdateUserRequest, UserCredentials,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

fn registration() -> RegisterUserRequest {
    RegisterUserRequest {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: "analytical-engine".to_string(),
        mobile: "+441234567890".to_string(),
    }
}

// --- Role ---

#[test]
fn test_role_wire_names_are_uppercase() {
    assert_eq!(serde_json::to_value(Role::Editor).unwrap(), json!("EDITOR"));
    assert_eq!(
        serde_json::from_value::<Role>(json!("VIEWER")).unwrap(),
        Role::Viewer
    );
    assert!(serde_json::from_value::<Role>(json!("viewer")).is_err());
}

#[test]
fn test_role_from_str() {
    assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!(
        "OWNER".parse::<Role>().unwrap_err(),
        UnknownRole("OWNER".to_string())
    );
    assert_eq!(Role::try_from("EDITOR".to_string()).unwrap(), Role::Editor);
}

#[test]
fn test_create_role_request_rejects_unknown_names() {
    let ok: CreateRoleRequest = serde_json::from_value(json!({ "roleName": "ADMIN" })).unwrap();
    assert_eq!(ok.role_name, Role::Admin);

    let bad = serde_json::from_value::<CreateRoleRequest>(json!({ "roleName": "SUPERUSER" }));
    assert!(bad.is_err());
}

// --- Validation ---

#[test]
fn test_valid_registration_passes() {
    assert!(registration().validate().is_ok());
}

#[test]
fn test_registration_field_errors() {
    let request = RegisterUserRequest {
        email: "not-an-email".to_string(),
        password: "short".to_string(),
        mobile: "12".to_string(),
        ..registration()
    };

    let errors = request.validate().unwrap_err();
    let fields = errors.field_errors();

    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("password"));
    assert!(fields.contains_key("mobile"));
    assert!(!fields.contains_key("first_name"));
}

#[test]
fn test_registration_reads_camel_case() {
    let request: RegisterUserRequest = serde_json::from_value(json!({
        "firstName": "Grace",
        "lastName": "Hopper",
        "email": "grace@example.com",
        "password": "compilers!",
        "mobile": "5551234567"
    }))
    .unwrap();

    assert_eq!(request.first_name, "Grace");
    assert!(request.validate().is_ok());
}

#[test]
fn test_login_requires_password() {
    let request = LoginRequest {
        email: "a@example.com".to_string(),
        password: String::new(),
    };

    assert!(request.validate().unwrap_err().field_errors().contains_key("password"));
}

#[test]
fn test_partial_update_only_checks_present_fields() {
    assert!(UpdateUserRequest::default().validate().is_ok());

    let request = UpdateUserRequest {
        password: Some("1234".to_string()),
        ..Default::default()
    };
    assert!(request.validate().is_err());
}

#[test]
fn test_rename_requires_non_empty_name() {
    let empty = RenameDocumentRequest {
        file_name: String::new(),
    };
    let long = RenameDocumentRequest {
        file_name: "x".repeat(256),
    };

    assert!(empty.validate().is_err());
    assert!(long.validate().is_err());
}

// --- Serialization ---

#[test]
fn test_document_hides_file_path() {
    let document = Document {
        id: Uuid::new_v4(),
        title: "Quarterly".to_string(),
        file_name: "1700000000000-q3.pdf".to_string(),
        file_path: "/srv/uploads/1700000000000-q3.pdf".to_string(),
        created_at: Utc::now(),
        created_by: Some("editor@example.com".to_string()),
        updated_at: None,
        updated_by: None,
    };

    let value = serde_json::to_value(&document).unwrap();

    assert_eq!(value["fileName"], "1700000000000-q3.pdf");
    assert!(value.get("filePath").is_none());
    assert!(value.get("file_path").is_none());
}

#[test]
fn test_credentials_debug_redacts_hash() {
    let credentials = UserCredentials {
        id: Uuid::new_v4(),
        email: "a@example.com".to_string(),
        password_hash: "$argon2id$v=19$secret".to_string(),
        role_name: Some("ADMIN".to_string()),
    };

    let printed = format!("{credentials:?}");

    assert!(!printed.contains("argon2id"));
    assert!(printed.contains("<redacted>"));
    assert_eq!(credentials.role(), Some(Role::Admin));
}

#[test]
fn test_credentials_with_unknown_role_name_have_no_role() {
    let credentials = UserCredentials {
        id: Uuid::new_v4(),
        email: "a@example.com".to_string(),
        password_hash: String::new(),
        role_name: Some("LEGACY".to_string()),
    };

    assert_eq!(credentials.role(), None);
}

#[test]
fn test_api_response_envelope_shape() {
    let value = serde_json::to_value(ApiResponse::created("Role created", json!({ "id": 1 })))
        .unwrap();

    assert_eq!(value["statusCode"], 201);
    assert_eq!(value["message"], "Role created");
    assert_eq!(value["data"]["id"], 1);
}
