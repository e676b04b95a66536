//! Tests for the Google API clients with mocked HTTP responses.

mod common;

use common::{mock_token, workspace};
use drive_audit::models::{FileListResponse, ServiceAccountCredentials};
use drive_audit::validate::{check_api, RequiredApi};
use drive_audit::{AuditError, Authenticator, Scope, SharedDriveRecord, Workspace};
use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

mod models {
    use super::*;

    #[test]
    fn test_file_list_response_deserialization() {
        let json = json!({
            "files": [
                {"id": "f1", "name": "file1.txt", "webViewLink": "https://drive.google.com/file/d/f1/view"},
                {"id": "f2", "name": "file2.txt", "modifiedTime": "2024-01-01T00:00:00Z"}
            ],
            "nextPageToken": "token123"
        });

        let response: FileListResponse = serde_json::from_value(json).unwrap();

        assert_eq!(response.files.len(), 2);
        assert_eq!(response.files[1].modified_time.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(response.files[1].web_view_link, "");
        assert_eq!(response.next_page_token, Some("token123".to_string()));
    }

    #[test]
    fn test_file_list_response_empty() {
        let response: FileListResponse = serde_json::from_value(json!({})).unwrap();

        assert!(response.files.is_empty());
        assert!(response.next_page_token.is_none());
    }
}

mod credentials {
    use super::*;

    #[test]
    fn test_credentials_from_json() {
        let json = json!({
            "client_email": "test@project.iam.gserviceaccount.com",
            "private_key": "key",
            "token_uri": "https://oauth2.googleapis.com/token"
        });

        let creds: ServiceAccountCredentials = serde_json::from_value(json).unwrap();

        assert_eq!(creds.client_email, "test@project.iam.gserviceaccount.com");
        assert_eq!(creds.token_uri, Some("https://oauth2.googleapis.com/token".to_string()));
    }

    #[test]
    fn test_authenticator_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = common::write_credentials_file(dir.path());

        let auth = Authenticator::from_file(&path).unwrap();
        assert_eq!(auth.service_account_email(), common::SERVICE_ACCOUNT);
    }

    #[test]
    fn test_authenticator_from_invalid_file() {
        let auth = Authenticator::from_file("/nonexistent/path/credentials.json");
        assert!(matches!(auth, Err(AuditError::CredentialsFile(_))));
    }

    #[test]
    fn test_authenticator_from_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not valid json").unwrap();

        let auth = Authenticator::from_file(temp_file.path());
        assert!(matches!(auth, Err(AuditError::CredentialsParse(_))));
    }

    #[tokio::test]
    async fn test_token_is_cached_per_subject_and_scope() {
        let mut server = Server::new_async().await;
        let token = server
            .mock("POST", "/token")
            .match_body(Matcher::Regex("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"access_token": "abc", "token_type": "Bearer", "expires_in": 3600}).to_string())
            .expect(2)
            .create_async()
            .await;

        let auth = Authenticator::new(common::credentials())
            .with_token_uri(format!("{}/token", server.url()));

        assert_eq!(auth.access_token("admin@example.com", Scope::Directory).await.unwrap(), "abc");
        assert_eq!(auth.access_token("admin@example.com", Scope::Directory).await.unwrap(), "abc");
        assert_eq!(auth.access_token("alice@example.com", Scope::Audit).await.unwrap(), "abc");

        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_delegation_is_auth_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(401)
            .with_body(r#"{"error":"unauthorized_client","error_description":"Client is unauthorized to retrieve access tokens using this method"}"#)
            .create_async()
            .await;

        let auth = Authenticator::new(common::credentials())
            .with_token_uri(format!("{}/token", server.url()));

        let err = auth
            .access_token("admin@example.com", Scope::Directory)
            .await
            .unwrap_err();
        match err {
            AuditError::Auth(message) => {
                assert!(message.contains("admin@example.com"));
                assert!(message.contains("unauthorized_client"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

mod directory {
    use super::*;

    #[tokio::test]
    async fn test_list_users_follows_pages() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;

        let first = server
            .mock("GET", "/admin/directory/v1/users")
            .match_header("authorization", "Bearer test-token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("domain".into(), "example.com".into()),
                Matcher::Regex("fields=[^&]*$".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "users": [{"primaryEmail": "alice@example.com", "name": {"givenName": "Alice"}}],
                    "nextPageToken": "page-2"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let second = server
            .mock("GET", "/admin/directory/v1/users")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "page-2".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"users": [{"primaryEmail": "bob@example.com", "name": {"fullName": "Bob Builder"}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let users = workspace(&server).list_users().await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].primary_email, "alice@example.com");
        assert_eq!(users[0].display_name, "Alice");
        assert_eq!(users[1].display_name, "Bob Builder");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_disabled_directory_api_yields_activation_url() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/admin/directory/v1/users")
            .match_query(Matcher::UrlEncoded("maxResults".into(), "1".into()))
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"error": {
                    "code": 403,
                    "message": "Admin SDK API has not been used in project 42 before or it is disabled. Enable it by visiting https://console.developers.google.com/apis/api/admin.googleapis.com/overview?project=42 then retry."
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let err = check_api(&workspace(&server), RequiredApi::Directory)
            .await
            .unwrap_err();

        match err {
            AuditError::ApiUnavailable { api, activation_url } => {
                assert_eq!(api, "Admin SDK Directory API");
                assert_eq!(
                    activation_url.as_deref(),
                    Some("https://console.developers.google.com/apis/api/admin.googleapis.com/overview?project=42")
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

mod drive {
    use super::*;

    #[tokio::test]
    async fn test_user_public_files_query() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        let files = server
            .mock("GET", "/drive/v3/files")
            .match_header("authorization", "Bearer test-token")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "'alice@example.com' in owners and (visibility='anyoneWithLink' or visibility='anyoneCanFind')".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"files": [
                    {"id": "d1", "name": "Doc1", "webViewLink": "https://docs.google.com/document/d/d1/edit"},
                    {"id": "d2", "name": "Doc2", "webViewLink": "https://docs.google.com/document/d/d2/edit", "modifiedTime": "2024-01-01T00:00:00Z"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let found = workspace(&server).user_public_files("alice@example.com").await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "Doc1");
        assert!(found[0].modified_time.is_none());
        assert!(!found[1].is_shared_drive_file);
        files.assert_async().await;
    }

    #[tokio::test]
    async fn test_shared_drive_files_are_tagged() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("driveId".into(), "drive-1".into()),
                Matcher::UrlEncoded("corpora".into(), "drive".into()),
                Matcher::UrlEncoded("supportsAllDrives".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"files": [{"id": "s1", "name": "Roadmap", "webViewLink": "https://x/s1"}]}).to_string())
            .create_async()
            .await;

        let drive = SharedDriveRecord {
            id: "drive-1".to_string(),
            name: "Product".to_string(),
        };
        let found = workspace(&server).shared_drive_public_files(&drive).await.unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].is_shared_drive_file);
        assert_eq!(found[0].shared_drive_name.as_deref(), Some("Product"));
    }

    #[tokio::test]
    async fn test_list_shared_drives_uses_admin_access() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/drive/v3/drives")
            .match_query(Matcher::UrlEncoded("useDomainAdminAccess".into(), "true".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"drives": [{"id": "drive-1", "name": "Product"}, {"id": "drive-2", "name": "Ops"}]}).to_string())
            .create_async()
            .await;

        let drives = workspace(&server).list_shared_drives().await.unwrap();
        let names: Vec<&str> = drives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Product", "Ops"]);
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body(json!({"error": {"code": 500, "message": "Backend Error"}}).to_string())
            .create_async()
            .await;

        let err = workspace(&server).user_public_files("bob@example.com").await.unwrap_err();
        assert!(matches!(err, AuditError::Api { status: 500, ref message } if message == "Backend Error"));
    }

    #[tokio::test]
    async fn test_restrict_to_domain() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        let delete = server
            .mock("DELETE", "/drive/v3/files/f1/permissions/anyoneWithLink")
            .match_query(Matcher::Any)
            .with_status(204)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/drive/v3/files/f1/permissions")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({"role": "writer", "type": "domain", "domain": "example.com"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"id": "p9", "role": "writer", "type": "domain"}).to_string())
            .create_async()
            .await;

        let permission = workspace(&server)
            .drive()
            .restrict_to_domain("bob@example.com", "f1", "writer", "example.com")
            .await
            .unwrap();

        assert_eq!(permission.role.as_deref(), Some("writer"));
        delete.assert_async().await;
        create.assert_async().await;
    }
}

mod sheets {
    use super::*;
    use drive_audit::models::{ReportIndex, Source};
    use drive_audit::report::SpreadsheetReport;

    #[tokio::test]
    async fn test_probe_treats_not_found_as_reachable() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/v4/spreadsheets/drive-audit-api-probe")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(json!({"error": {"code": 404, "message": "Requested entity was not found."}}).to_string())
            .create_async()
            .await;

        assert!(workspace(&server).probe_sheets().await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_disabled_api() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/v4/spreadsheets/drive-audit-api-probe")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(json!({"error": {"code": 403, "message": "Google Sheets API has not been used in project 7 before or it is disabled. Enable it by visiting https://console.developers.google.com/apis/api/sheets.googleapis.com/overview?project=7 then retry."}}).to_string())
            .create_async()
            .await;

        let err = check_api(&workspace(&server), RequiredApi::Sheets).await.unwrap_err();
        assert!(matches!(err, AuditError::ApiUnavailable { activation_url: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_publish_creates_then_writes_once() {
        let mut server = Server::new_async().await;
        mock_token(&mut server).await;
        let create = server
            .mock("POST", "/v4/spreadsheets")
            .match_body(Matcher::PartialJson(json!({"sheets": [
                {"properties": {"title": "Dashboard"}},
                {"properties": {"title": "alice"}}
            ]})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"spreadsheetId": "sid", "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/sid/edit"}).to_string())
            .expect(1)
            .create_async()
            .await;
        let values = server
            .mock("POST", "/v4/spreadsheets/sid/values:batchUpdate")
            .match_body(Matcher::PartialJson(json!({"valueInputOption": "RAW"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"spreadsheetId": "sid", "totalUpdatedCells": 20}).to_string())
            .expect(1)
            .create_async()
            .await;

        let mut index = ReportIndex::new();
        index.record(
            Source::User {
                email: "alice@example.com".to_string(),
                display_name: "Alice".to_string(),
            },
            vec![common::file("d1", "Doc1", None)],
        );
        let report = SpreadsheetReport::build(&index, "example.com", chrono::Local::now().naive_local());

        let url = workspace(&server).publish_spreadsheet(&report).await.unwrap();

        assert_eq!(url, "https://docs.google.com/spreadsheets/d/sid/edit");
        create.assert_async().await;
        values.assert_async().await;
    }
}

mod error_handling {
    use drive_audit::error::AuditError;

    #[test]
    fn test_error_display() {
        let err = AuditError::Api {
            status: 404,
            message: "File not found".to_string(),
        };

        let display = format!("{}", err);
        assert!(display.contains("404"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_report_write_error() {
        let err = AuditError::report_write("spreadsheet", AuditError::Auth("denied".to_string()));
        let display = format!("{}", err);
        assert!(display.contains("spreadsheet"));
        assert!(display.contains("denied"));
    }
}
