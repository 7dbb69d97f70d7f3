// HTTP-level tests exercising the real route configuration without a running
// database: storage is a sea-orm MockDatabase primed with the rows each flow
// is expected to read.

use actix_web::cookie::Cookie;
use actix_web::{App, test, web};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use uuid::Uuid;

use fieldops::api::{customers, invoices, jobs, quotes};
use fieldops::app_state::AppState;
use fieldops::config::Config;
use fieldops::database::models;

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8080,
        public_url: None,
        timezone: Some("UTC".to_string()),
        max_body_bytes: None,
    }
}

fn profile_row(user_id: Uuid, company_id: Uuid) -> models::profiles::Model {
    models::profiles::Model {
        id: Uuid::new_v4(),
        user_id,
        company_id,
        email: Some("owner@example.com".to_string()),
        full_name: None,
        created_at: chrono::Utc::now(),
    }
}

fn customer_row(company_id: Uuid, name: &str) -> models::customers::Model {
    models::customers::Model {
        id: Uuid::new_v4(),
        company_id,
        name: name.to_string(),
        email: None,
        phone: None,
        address: None,
        tags: serde_json::json!([]),
        created_at: chrono::Utc::now(),
        updated_at: None,
        deleted_at: None,
    }
}

macro_rules! test_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    db: $db,
                    config: test_config(),
                }))
                .service(
                    web::scope("/api")
                        .configure(customers::init_routes)
                        .configure(jobs::init_routes)
                        .configure(quotes::init_routes)
                        .configure(invoices::init_routes),
                ),
        )
        .await
    };
}

fn session_cookies(user_id: Uuid) -> (Cookie<'static>, Cookie<'static>) {
    (
        Cookie::new("session_id", "test-session"),
        Cookie::new("user_id", user_id.to_string()),
    )
}

fn empty_mock() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

#[actix_web::test]
async fn list_without_session_is_unauthenticated() {
    let app = test_app!(empty_mock());

    let req = test::TestRequest::get().uri("/api/customers").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[actix_web::test]
async fn list_with_malformed_user_cookie_is_unauthenticated() {
    let app = test_app!(empty_mock());

    let req = test::TestRequest::get()
        .uri("/api/jobs")
        .cookie(Cookie::new("session_id", "test-session"))
        .cookie(Cookie::new("user_id", "not-a-uuid"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn list_returns_company_rows() {
    let user_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![profile_row(user_id, company_id)]])
        .append_query_results([vec![
            customer_row(company_id, "Acme Corp"),
            customer_row(company_id, "Globex"),
        ]])
        .into_connection();
    let app = test_app!(db);

    let (session, user) = session_cookies(user_id);
    let req = test::TestRequest::get()
        .uri("/api/customers")
        .cookie(session)
        .cookie(user)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["customers"].as_array().unwrap().len(), 2);
    assert_eq!(body["customers"][0]["name"], "Acme Corp");
}

#[actix_web::test]
async fn session_without_profile_is_profile_missing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<models::profiles::Model>::new()])
        .into_connection();
    let app = test_app!(db);

    let (session, user) = session_cookies(Uuid::new_v4());
    let req = test::TestRequest::get()
        .uri("/api/invoices")
        .cookie(session)
        .cookie(user)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "PROFILE_MISSING");
}

#[actix_web::test]
async fn short_customer_name_is_rejected_before_storage() {
    let user_id = Uuid::new_v4();
    // Only the profile lookup is primed: if the handler tried to insert, the
    // mock would fail the test by running out of results.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![profile_row(user_id, Uuid::new_v4())]])
        .into_connection();
    let app = test_app!(db);

    let (session, user) = session_cookies(user_id);
    let req = test::TestRequest::post()
        .uri("/api/customers")
        .cookie(session)
        .cookie(user)
        .set_json(serde_json::json!({"name": "A"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn unknown_payload_fields_are_rejected() {
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![profile_row(user_id, Uuid::new_v4())]])
        .into_connection();
    let app = test_app!(db);

    let (session, user) = session_cookies(user_id);
    let req = test::TestRequest::post()
        .uri("/api/customers")
        .cookie(session)
        .cookie(user)
        .set_json(serde_json::json!({"name": "Good Name", "company_id": "spoofed"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn invalid_status_value_is_rejected() {
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![profile_row(user_id, Uuid::new_v4())]])
        .into_connection();
    let app = test_app!(db);

    let (session, user) = session_cookies(user_id);
    let req = test::TestRequest::put()
        .uri(&format!("/api/jobs/{}", Uuid::new_v4()))
        .cookie(session)
        .cookie(user)
        .set_json(serde_json::json!({"status": "done"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn update_of_foreign_or_missing_row_is_not_found_class() {
    let user_id = Uuid::new_v4();
    // Profile resolves, the scoped customer lookup matches nothing: same
    // answer whether the row is missing or belongs to another tenant.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![profile_row(user_id, Uuid::new_v4())]])
        .append_query_results([Vec::<models::customers::Model>::new()])
        .into_connection();
    let app = test_app!(db);

    let (session, user) = session_cookies(user_id);
    let req = test::TestRequest::put()
        .uri(&format!("/api/customers/{}", Uuid::new_v4()))
        .cookie(session)
        .cookie(user)
        .set_json(serde_json::json!({"name": "New Name"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn delete_is_idempotent_success() {
    let user_id = Uuid::new_v4();
    // Zero affected rows (already deleted) still answers success.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![profile_row(user_id, Uuid::new_v4())]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let app = test_app!(db);

    let (session, user) = session_cookies(user_id);
    let req = test::TestRequest::delete()
        .uri(&format!("/api/customers/{}", Uuid::new_v4()))
        .cookie(session)
        .cookie(user)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
}
