use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use super::actor::actor_id;
use crate::templates_structs::ApiErrorResponse;

/// Middleware function that rejects requests without an authenticated user.
pub async fn require_actor(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if actor_id(req.request()).is_none() {
        let response = HttpResponse::Unauthorized().json(ApiErrorResponse {
            error: "Authentication required".to_string(),
            details: None,
        });
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
