pub mod approvals;

use actix_web::{
    web, Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::templates_structs::ApiErrorResponse;

/// CSRF guard for API mutations.
///
/// Rejects POST/PUT/PATCH/DELETE requests that don't carry
/// Content-Type: application/json. Browsers cannot send cross-origin JSON
/// via a simple form post. GET requests are exempt.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    use actix_web::http::Method;

    let method = req.method().clone();
    if method == Method::POST || method == Method::PUT || method == Method::PATCH || method == Method::DELETE {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "Content-Type must be application/json for mutation requests".to_string(),
                details: None,
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Approval store routes, mounted under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/projects/{project_id}/approvals",
        web::get().to(approvals::list),
    )
    .route(
        "/projects/{project_id}/approvals",
        web::post().to(approvals::decide),
    )
    .route(
        "/projects/{project_id}/workflow-items/{item_id}",
        web::patch().to(approvals::update_item),
    );
}
