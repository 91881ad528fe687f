use api_doc_sync::{
    discover::{Access, Pass, TypeIndex, TypeRef},
    loader::Session,
    model::{
        ErrorEntry, FieldRecord, HttpMethod, SegmentKind, ServiceInput, Target, Visibility,
        WireLocation,
    },
    serializer::serialize_json,
    sync::{synchronize, Synchronizer},
};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a temporary application
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn services(targets: Vec<Target>) -> Vec<ServiceInput> {
    vec![ServiceInput {
        name: "app".to_string(),
        targets,
    }]
}

const LIST_ENDPOINT: &str = r#"
/// Lists users, newest first.
#[api(public, method = "GET", method = "POST", path = "/users")]
pub async fn list(params: ListParams) -> Result<Page, Error> {
    todo!()
}

pub struct ListParams {
    #[api(query = "limit")]
    pub page_size: u32,
    pub cursor: Option<String>,
}

/// One page of users.
pub struct Page {
    pub users: Vec<User>,
    pub next: Option<String>,
}
"#;

#[test]
fn test_users_service_end_to_end() {
    let temp_dir = create_test_project(vec![
        ("users/api.rs", include_str!("fixtures/users_service.rs")),
        ("users/list.rs", LIST_ENDPOINT),
        (
            "users/api_test.rs",
            "#[api(public, path = \"/hidden\")]\npub async fn hidden() {}",
        ),
    ]);

    let result = synchronize(
        temp_dir.path(),
        services(vec![Target::new("users/api.rs"), Target::new("users/list.rs")]),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let get = &result.services[0].targets[0].endpoint;
    assert_eq!(get.name, "get");
    assert_eq!(get.http_method, Some(HttpMethod::Get));
    assert_eq!(get.visibility, Visibility::Auth);
    assert_eq!(
        get.doc,
        "Fetches a user by id.\n\nOnly users of the caller's tenant are visible."
    );
    assert_eq!(
        get.errors,
        vec![
            ErrorEntry {
                code: "NotFound".to_string(),
                doc: "no user with that id".to_string(),
            },
            ErrorEntry {
                code: "PermissionDenied".to_string(),
                doc: "the user belongs to another tenant,\nor the caller lacks the `users.read` scope"
                    .to_string(),
            },
        ]
    );
    assert_eq!(get.errors[1].http_status(), Some(403));

    assert_eq!(get.path.len(), 2);
    assert_eq!(get.path[0].kind, SegmentKind::Literal);
    assert_eq!(get.path[0].doc, None);
    assert_eq!(get.path[1].kind, SegmentKind::Param);
    assert_eq!(get.path[1].doc.as_deref(), Some("the id of the user"));
    assert_eq!(get.path[1].value_type.as_deref(), Some("u32"));

    assert_eq!(get.request_type_name.as_deref(), Some("GetParams"));
    assert_eq!(get.response_type_name.as_deref(), Some("User"));

    // Endpoint types first, then the remaining types of the file; test items are gone.
    let names: Vec<&str> = get.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["GetParams", "User", "Profile"]);

    assert_eq!(get.types[0].doc, "Parameters for fetching a user.");
    assert_eq!(
        get.types[0].fields,
        vec![
            FieldRecord {
                name: "include_profile".to_string(),
                wire_name: Some("includeProfile".to_string()),
                location: Some(WireLocation::Query),
                type_name: "bool".to_string(),
                doc: "Include the user's profile.".to_string(),
            },
            FieldRecord {
                name: "request_id".to_string(),
                wire_name: Some("Request-Id".to_string()),
                location: Some(WireLocation::Header),
                type_name: "String".to_string(),
                doc: "Request correlation id.".to_string(),
            },
        ]
    );

    let user_fields: Vec<(&str, Option<&str>)> = get.types[1]
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.wire_name.as_deref()))
        .collect();
    assert_eq!(
        user_fields,
        vec![
            ("id", Some("id")),
            ("name", Some("displayName")),
            ("profile", Some("profile")),
        ]
    );

    assert_eq!(
        get.types[2].fields,
        vec![FieldRecord {
            name: "bio".to_string(),
            wire_name: None,
            location: None,
            type_name: "String".to_string(),
            doc: "Free-form biography.".to_string(),
        }]
    );

    let list = &result.services[0].targets[1].endpoint;
    assert_eq!(list.name, "list");
    assert_eq!(list.http_method, Some(HttpMethod::Get));
    assert_eq!(list.visibility, Visibility::Public);
    let names: Vec<&str> = list.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["ListParams", "Page"]);
    let locations: Vec<(&str, Option<WireLocation>)> = list.types[0]
        .fields
        .iter()
        .map(|f| (f.wire_name.as_deref().unwrap_or(""), f.location))
        .collect();
    assert_eq!(
        locations,
        vec![
            ("limit", Some(WireLocation::Query)),
            ("cursor", Some(WireLocation::Query)),
        ]
    );
}

#[test]
fn test_failed_package_does_not_block_others() {
    let temp_dir = create_test_project(vec![(
        "users/api.rs",
        include_str!("fixtures/users_service.rs"),
    )]);

    let result = synchronize(
        temp_dir.path(),
        services(vec![Target::new("billing/api.rs"), Target::new("users/api.rs")]),
    );

    assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
    assert!(
        result.errors[0].starts_with("billing: failed to load package"),
        "{}",
        result.errors[0]
    );
    assert_eq!(result.services[0].targets[0].endpoint.name, "");
    assert_eq!(result.services[0].targets[1].endpoint.name, "get");
}

#[test]
fn test_parse_errors_are_reported_per_file() {
    let temp_dir = create_test_project(vec![
        ("users/api.rs", include_str!("fixtures/users_service.rs")),
        ("users/broken.rs", "pub fn broken( {"),
    ]);

    let result = synchronize(temp_dir.path(), services(vec![Target::new("users/api.rs")]));

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("users/broken.rs: "));
    assert_eq!(result.services[0].targets[0].endpoint.name, "get");
}

#[test]
fn test_overlay_replaces_file_on_disk() {
    let temp_dir = create_test_project(vec![(
        "users/api.rs",
        "#[api(public, method = \"GET\", path = \"/old\")]\npub async fn old() {}",
    )]);

    let target = Target::new("users/api.rs")
        .with_contents("#[api(private, method = \"PUT\", path = \"/new\")]\npub async fn new() {}");
    let result = synchronize(temp_dir.path(), services(vec![target]));

    let record = &result.services[0].targets[0].endpoint;
    assert_eq!(record.name, "new");
    assert_eq!(record.http_method, Some(HttpMethod::Put));
    assert_eq!(record.visibility, Visibility::Private);
    assert_eq!(record.path[0].value, "new");
}

#[test]
fn test_overlay_only_package() {
    let temp_dir = TempDir::new().unwrap();

    let target = Target::new(temp_dir.path().join("fresh/api.rs"))
        .with_contents("/// Fresh.\n#[api(public)]\npub async fn ping() {}");
    let result = synchronize(temp_dir.path(), services(vec![target]));

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let record = &result.services[0].targets[0].endpoint;
    assert_eq!(record.doc, "Fresh.");
    assert_eq!(record.path[0].value, "fresh.ping");
    assert_eq!(record.http_method, Some(HttpMethod::Get));
}

#[test]
fn test_unclaimed_files_are_ignored() {
    let temp_dir = create_test_project(vec![
        ("users/api.rs", "pub struct Claimed { pub id: u32 }"),
        (
            "users/other.rs",
            "#[api(public, method = \"GET\", path = \"/other\")]\npub async fn other() {}\npub struct Unclaimed;",
        ),
    ]);

    let result = synchronize(temp_dir.path(), services(vec![Target::new("users/api.rs")]));

    let record = &result.services[0].targets[0].endpoint;
    assert_eq!(record.name, "");
    assert_eq!(record.http_method, None);
    let names: Vec<&str> = record.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Claimed"]);
}

#[test]
fn test_runs_are_repeatable() {
    let temp_dir = create_test_project(vec![
        ("users/api.rs", include_str!("fixtures/users_service.rs")),
        ("users/list.rs", LIST_ENDPOINT),
    ]);
    let input = services(vec![Target::new("users/api.rs"), Target::new("users/list.rs")]);

    let first = Synchronizer::new(temp_dir.path()).run(input.clone());
    let second = Synchronizer::new(temp_dir.path()).run(input);
    assert_eq!(first, second);

    // Feeding a result back in changes nothing.
    let third = Synchronizer::new(temp_dir.path()).run(first.services.clone());
    assert_eq!(third, first);
}

#[test]
fn test_actix_conventions() {
    let temp_dir = create_test_project(vec![(
        "posts/api.rs",
        include_str!("fixtures/actix_service.rs"),
    )]);

    let mut session = Session::new(temp_dir.path());
    let package = session
        .load_package(Path::new("posts"))
        .expect("Failed to load package");
    let packages = vec![package];
    let index = TypeIndex::build(&packages, &mut session.diagnostics);
    let endpoints = Pass::new(&packages[0], &index, &mut session.diagnostics).endpoints();
    assert!(session.diagnostics.is_empty(), "{:?}", session.diagnostics.messages());

    let summary: Vec<(&str, Vec<HttpMethod>, Access)> = endpoints
        .iter()
        .map(|e| (e.name.as_str(), e.methods.clone(), e.access))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("health", vec![HttpMethod::Get], Access::Public),
            ("create_post", vec![HttpMethod::Post], Access::Public),
            ("delete_post", vec![HttpMethod::Delete], Access::Auth),
        ]
    );

    assert!(endpoints[0].response.is_none());

    let create = &endpoints[1];
    assert_eq!(create.request.as_ref().and_then(TypeRef::named), Some("CreatePost"));
    assert_eq!(create.response.as_ref().and_then(TypeRef::named), Some("Post"));
    assert_eq!(create.request_encoding.as_ref().unwrap().parameters.len(), 2);
    assert_eq!(create.response_encoding.as_ref().unwrap().parameters.len(), 2);

    let delete = &endpoints[2];
    assert_eq!(delete.path[1].value, "post_id");
    assert_eq!(delete.path[1].value_type.as_deref(), Some("u64"));
    assert!(delete.request.is_none());
    assert!(delete.response.is_none());
}

#[test]
fn test_serialized_result() {
    let temp_dir = create_test_project(vec![(
        "posts/api.rs",
        include_str!("fixtures/actix_service.rs"),
    )]);

    let result = synchronize(temp_dir.path(), services(vec![Target::new("posts/api.rs")]));
    let json = serialize_json(&result).expect("Failed to serialize");
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    // The last endpoint of a file wins. It references no types, so the file's structs
    // are recorded as declared, without wire data.
    let endpoint = &parsed["services"][0]["targets"][0]["endpoint"];
    assert_eq!(endpoint["name"], "delete_post");
    assert_eq!(endpoint["httpMethod"], "DELETE");
    assert_eq!(endpoint["visibility"], "auth");
    assert_eq!(endpoint["path"][1]["doc"], "the post to delete");
    assert_eq!(endpoint["types"][0]["name"], "CreatePost");
    assert!(endpoint["types"][0]["fields"][0]["location"].is_null());
    assert!(endpoint["types"][0]["fields"][0]["wireName"].is_null());
    assert_eq!(endpoint["types"][1]["name"], "Post");
    assert_eq!(endpoint["types"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["errors"].as_array().unwrap().len(), 0);
}
