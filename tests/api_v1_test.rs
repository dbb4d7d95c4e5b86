//! REST approval endpoints over Postgres. Need `TEST_DATABASE_URL`; run with `--ignored`.

mod common;

use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use storyfoundry::auth::middleware::require_actor;
use storyfoundry::auth::USER_ID_HEADER;
use storyfoundry::handlers::api_v1;
use storyfoundry::models::approval::{self, NewPendingChange, NewWorkflowItem};
use storyfoundry::models::collaborator;

use common::{insert_profile, insert_project, setup_test_db};

const PROJECT: i64 = 10;
const OWNER: i64 = 100;
const EDITOR: i64 = 1;
const COAUTHOR: i64 = 2;

macro_rules! api_app {
    ($pool:expr) => {
        test::init_service(
            App::new().app_data(web::Data::new($pool.clone())).service(
                web::scope("/api")
                    .wrap(from_fn(api_v1::require_json_content_type))
                    .wrap(from_fn(require_actor))
                    .configure(api_v1::configure),
            ),
        )
        .await
    };
}

async fn seed(pool: &sqlx::PgPool) -> (i64, i64) {
    insert_profile(pool, OWNER, "Olive Owner").await;
    insert_profile(pool, EDITOR, "Eddie Editor").await;
    insert_profile(pool, COAUTHOR, "Cora Coauthor").await;
    insert_project(pool, PROJECT, OWNER, "The Long Voyage").await;
    collaborator::upsert_role(pool, PROJECT, EDITOR, "editor", "active").await.unwrap();
    collaborator::upsert_role(pool, PROJECT, COAUTHOR, "coauthor", "active").await.unwrap();

    let change_id = approval::create_pending_change(
        pool,
        &NewPendingChange {
            project_id: PROJECT,
            editor_id: EDITOR,
            content_type: "chapter".to_string(),
            title: "Dragon Chapter Edit".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let item_id = approval::create_workflow_item(
        pool,
        &NewWorkflowItem {
            project_id: PROJECT,
            author_id: EDITOR,
            item_type: "translation".to_string(),
            title: "Spanish draft".to_string(),
            priority: "medium".to_string(),
            category: "content".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    (change_id, item_id)
}

#[actix_web::test]
#[ignore]
async fn test_list_approvals() {
    let db = setup_test_db().await;
    let pool = db.pool();
    seed(pool).await;
    let app = api_app!(pool);

    let req = test::TestRequest::get()
        .uri("/api/projects/10/approvals")
        .insert_header((USER_ID_HEADER, EDITOR.to_string()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/projects/999/approvals")
        .insert_header((USER_ID_HEADER, EDITOR.to_string()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[ignore]
async fn test_decide_requires_owner() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (change_id, _) = seed(pool).await;
    let app = api_app!(pool);

    let decision = json!({ "pendingChangeId": change_id, "decision": "approve" });

    let req = test::TestRequest::post()
        .uri("/api/projects/10/approvals")
        .insert_header((USER_ID_HEADER, COAUTHOR.to_string()))
        .set_json(&decision)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/projects/10/approvals")
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .set_json(&decision)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Change approved and applied");

    let req = test::TestRequest::post()
        .uri("/api/projects/10/approvals")
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .set_json(&decision)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
#[ignore]
async fn test_decide_rejects_unknown_decision_word() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (change_id, _) = seed(pool).await;
    let app = api_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/projects/10/approvals")
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .set_json(json!({ "pendingChangeId": change_id, "decision": "maybe" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[ignore]
async fn test_patch_item_checks_approval_rights() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (_, item_id) = seed(pool).await;
    let app = api_app!(pool);
    let uri = format!("/api/projects/10/workflow-items/{item_id}");

    // Translations need a reviewer; a coauthor may not decide them.
    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((USER_ID_HEADER, COAUTHOR.to_string()))
        .set_json(json!({ "status": "approved" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .set_json(json!({ "status": "done" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .set_json(json!({ "status": "approved", "review_notes": "lovely", "priority": "urgent" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["priority"], "urgent");
    assert_eq!(body["reviewer"]["full_name"], "Olive Owner");
}

#[actix_web::test]
#[ignore]
async fn test_patch_cannot_reopen_approved_item() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (_, item_id) = seed(pool).await;
    let app = api_app!(pool);
    let uri = format!("/api/projects/10/workflow-items/{item_id}");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .set_json(json!({ "status": "approved" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .set_json(json!({ "status": "pending_approval" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("approved"));

    let stored = approval::find_workflow_item(pool, PROJECT, item_id).await.unwrap().unwrap();
    assert_eq!(stored.status, "approved");
}

#[actix_web::test]
#[ignore]
async fn test_patch_requires_json() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (_, item_id) = seed(pool).await;
    let app = api_app!(pool);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/projects/10/workflow-items/{item_id}"))
        .insert_header((USER_ID_HEADER, OWNER.to_string()))
        .insert_header(("content-type", "text/plain"))
        .set_payload("status=approved")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
