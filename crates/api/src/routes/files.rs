//! Project attachment download route.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, RawQuery, State, rejection::PathRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::debug;

use crate::{AppState, error::ApiError};
use vitrine_core::delivery::{DeliveryError, FileDeliveryService, FileDownload, FileRequest};
use vitrine_db::ProjectRepository;

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/files/{id}", get(get_file))
}

/// Query parameters for a file download.
///
/// Both are kept as raw strings so that bad values produce the API's own
/// error messages instead of the extractor's. Repeated keys keep their
/// first value.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileQuery {
    /// Zero-based index into the project's attachments.
    pub attachment_index: Option<String>,
    /// `"true"` to request a watermarked copy.
    pub watermark: Option<String>,
}

impl FileQuery {
    /// Parse a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs: Vec<(String, String)> = raw
            .and_then(|raw| serde_urlencoded::from_str(raw).ok())
            .unwrap_or_default();

        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "attachmentIndex" => &mut query.attachment_index,
                "watermark" => &mut query.watermark,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// GET `/files/{id}?attachmentIndex=<n>[&watermark=true]`
/// Download one attachment of a project.
async fn get_file(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    RawQuery(raw_query): RawQuery,
) -> Response {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => {
            debug!(error = %rejection, "Rejected project id");
            return ApiError::from(DeliveryError::InvalidParameters).into_response();
        }
    };
    let query = FileQuery::parse(raw_query.as_deref());

    let request = match FileRequest::parse(
        &id,
        query.attachment_index.as_deref(),
        query.watermark.as_deref(),
    ) {
        Ok(request) => request,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = ProjectRepository::new(state.db.clone());
    let service = FileDeliveryService::new(Arc::new(repo), state.watermark.as_deref().cloned());

    match service.download(request).await {
        Ok(download) => file_response(download),
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn file_response(download: FileDownload) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, download.content_type().to_string()),
            (header::CONTENT_DISPOSITION, download.content_disposition()),
            (header::CONTENT_LENGTH, download.bytes.len().to_string()),
        ],
        download.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use chrono::{FixedOffset, TimeZone};
    use http_body_util::BodyExt;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use vitrine_db::entities::projects;
    use vitrine_shared::WatermarkConfig;

    use crate::create_router;

    fn project(id: i32, attachments: &[&[u8]]) -> projects::Model {
        projects::Model {
            id,
            title: "Portfolio".to_string(),
            description: None,
            status: Some("published".to_string()),
            category_id: Some(1),
            featured: true,
            attachments: Some(attachments.iter().map(|a| STANDARD.encode(a)).collect()),
            created_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
                .unwrap(),
        }
    }

    fn db_with(rows: Vec<projects::Model>) -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection()
    }

    fn app(db: DatabaseConnection) -> Router {
        create_router(AppState::new(db, &WatermarkConfig::default()))
    }

    /// One-page Letter PDF saying "Hello".
    fn pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    async fn send(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_file_is_served_verbatim() {
        let payload = b"0123456789";
        let app = app(db_with(vec![project(7, &[payload])]));

        let response = send(app, "/api/files/7?attachmentIndex=0&watermark=true").await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"attachment_0\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "10");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), payload);
    }

    #[tokio::test]
    async fn test_pdf_is_served_with_pdf_headers() {
        let original = pdf();
        let app = app(db_with(vec![project(3, &[b"zz", original.as_slice()])]));

        let response = send(app, "/api/files/3?attachmentIndex=1").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"attachment_1.pdf\""
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), original.as_slice());
    }

    #[tokio::test]
    async fn test_pdf_is_watermarked_on_request() {
        let original = pdf();
        let app = app(db_with(vec![project(3, &[original.as_slice()])]));

        let response = send(app, "/api/files/3?attachmentIndex=0&watermark=true").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_ne!(body.as_ref(), original.as_slice());

        let doc = Document::load_mem(&body).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        let subject = info.get(b"Subject").unwrap().as_str().unwrap();
        assert_eq!(subject, b"Watermark: 123");
    }

    #[tokio::test]
    async fn test_index_out_of_range() {
        let app = app(db_with(vec![project(7, &[b"a", b"b"])]));

        let response = send(app, "/api/files/7?attachmentIndex=5").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Attachment index out of range" })
        );
    }

    #[tokio::test]
    async fn test_negative_index_is_out_of_range() {
        let app = app(db_with(vec![project(7, &[b"a"])]));

        let response = send(app, "/api/files/7?attachmentIndex=-1").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Attachment index out of range" })
        );
    }

    #[rstest::rstest]
    #[case("/api/files/7", "Attachment index is required")]
    #[case("/api/files/7?attachmentIndex=", "Attachment index is required")]
    #[case("/api/files/7?watermark=true", "Attachment index is required")]
    #[case("/api/files/abc?attachmentIndex=0", "Invalid project ID or attachment index")]
    #[case("/api/files/7?attachmentIndex=first", "Invalid project ID or attachment index")]
    #[tokio::test]
    async fn test_bad_parameters(#[case] uri: &str, #[case] message: &str) {
        let app = app(db_with(Vec::new()));

        let response = send(app, uri).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": message }));
    }

    #[rstest::rstest]
    #[case("/api/files/%FF?attachmentIndex=0")]
    #[case("/api/files/%C3%28?attachmentIndex=0&watermark=true")]
    #[tokio::test]
    async fn test_undecodable_project_id_is_json_error(#[case] uri: &str) {
        let response = send(app(db_with(Vec::new())), uri).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Invalid project ID or attachment index" })
        );
    }

    #[tokio::test]
    async fn test_repeated_query_keys_use_first_value() {
        let payload = b"first file";
        let app = app(db_with(vec![project(7, &[payload, b"second file"])]));

        let response = send(
            app,
            "/api/files/7?attachmentIndex=0&attachmentIndex=1&watermark=false&watermark=true",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"attachment_0\""
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), payload);
    }

    #[tokio::test]
    async fn test_requests_share_one_connection() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![project(7, &[b"one"])], vec![project(7, &[b"one"])]])
            .into_connection();
        let app = app(db);

        for _ in 0..2 {
            let response = send(app.clone(), "/api/files/7?attachmentIndex=0").await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[rstest::rstest]
    #[case(None, None, None)]
    #[case(Some(""), None, None)]
    #[case(Some("attachmentIndex=2"), Some("2"), None)]
    #[case(Some("attachmentIndex=2&attachmentIndex=3"), Some("2"), None)]
    #[case(Some("watermark=true&attachmentIndex=0&watermark=no"), Some("0"), Some("true"))]
    #[case(Some("attachmentIndex=%31&other=x"), Some("1"), None)]
    #[case(Some("attachmentIndex"), Some(""), None)]
    fn test_query_parsing(
        #[case] raw: Option<&str>,
        #[case] index: Option<&str>,
        #[case] watermark: Option<&str>,
    ) {
        assert_eq!(
            FileQuery::parse(raw),
            FileQuery {
                attachment_index: index.map(str::to_string),
                watermark: watermark.map(str::to_string),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_project() {
        let app = app(db_with(Vec::new()));

        let response = send(app, "/api/files/99?attachmentIndex=0").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Project or attachments not found" })
        );
    }

    #[tokio::test]
    async fn test_empty_attachment() {
        let app = app(db_with(vec![project(7, &[b""])]));

        let response = send(app, "/api/files/7?attachmentIndex=0").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "Empty attachment" }));
    }

    #[tokio::test]
    async fn test_database_failure_is_internal_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection refused".to_string())])
            .into_connection();

        let response = send(app(db), "/api/files/7?attachmentIndex=0").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(app(db_with(Vec::new())), "/api/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
    }
}
