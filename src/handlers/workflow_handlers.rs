//! Approval screen: the tabbed, filterable view plus decision endpoints.
//!
//! Handlers are generic over the approval store so the same routes serve
//! Postgres in production and an in-memory store in tests.

use std::sync::Arc;

use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};

use crate::auth::{csrf, Actor};
use crate::errors::{render, AppError};
use crate::handlers::AppState;
use crate::templates_structs::{
    ApiBulkDecisionRequest, ApiBulkDecisionResponse, ApiDecisionRequest, ApiDecisionResponse,
    ApiRefreshResponse, ApiViewRow, ApiWorkflowView, ApprovalRow, ApprovalsTemplate, DecisionForm,
    FacetOption, TabLink, WorkflowQuery,
};
use crate::workflow::{
    resolve_roles, Action, ApprovalBackend, ApprovalBoard, DispatchError, Dispatcher, Facets,
    ItemKey, RoleState, SuppliedNotes, Tab, WorkflowItem,
};

/// Build the viewer's board for a project from the query string and the cache.
async fn load_board<B: ApprovalBackend>(
    state: &AppState<B>,
    project_id: i64,
    actor: Actor,
    query: &WorkflowQuery,
) -> Result<(ApprovalBoard, Arc<Vec<WorkflowItem>>), AppError> {
    let inputs = state.backend.load_role_inputs(project_id).await?;
    let mut board = ApprovalBoard::new(actor.id);
    board.sync_roles(&inputs);

    if let Some(raw) = query.tab.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let tab = Tab::parse(raw).ok_or_else(|| AppError::BadRequest(format!("Unknown tab '{raw}'")))?;
        if !board.select_tab(tab) {
            return Err(AppError::PermissionDenied(format!(
                "The {} tab is not available to you",
                tab.label()
            )));
        }
    }

    let facets = Facets::from_raw(
        query.search.as_deref(),
        query.status.as_deref(),
        query.role.as_deref(),
        query.category.as_deref(),
    )
    .map_err(AppError::BadRequest)?;
    board.set_facets(facets);

    let items = state.cache.get_or_fetch(&state.backend, project_id).await;
    Ok((board, items))
}

async fn actor_roles<B: ApprovalBackend>(
    state: &AppState<B>,
    project_id: i64,
    actor: Actor,
) -> Result<RoleState, AppError> {
    let inputs = state.backend.load_role_inputs(project_id).await?;
    Ok(resolve_roles(inputs.owner_id, actor.id, &inputs.records))
}

fn dispatch_status(e: &DispatchError) -> StatusCode {
    match e {
        DispatchError::UnknownItem(_) => StatusCode::NOT_FOUND,
        DispatchError::NotPermitted(_) => StatusCode::FORBIDDEN,
        DispatchError::AlreadyDecided { .. } => StatusCode::CONFLICT,
        DispatchError::Remote { error, .. } => AppError::from(error.clone()).status_code(),
    }
}

/// GET /api/projects/{project_id}/workflow
pub async fn view_json<B: ApprovalBackend + 'static>(
    state: web::Data<AppState<B>>,
    actor: Actor,
    path: web::Path<i64>,
    query: web::Query<WorkflowQuery>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let (board, items) = load_board(&state, project_id, actor, &query).await?;

    let rows: Vec<ApiViewRow> = board
        .rows(&items)
        .into_iter()
        .map(|row| ApiViewRow {
            item: row.item.clone(),
            can_approve: row.can_approve,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiWorkflowView {
        roles: board.roles().clone(),
        tabs: board.tabs(),
        active_tab: board.active_tab(),
        total: rows.len(),
        items: rows,
    }))
}

/// GET /projects/{project_id}/workflow
pub async fn view_page<B: ApprovalBackend + 'static>(
    state: web::Data<AppState<B>>,
    session: Session,
    actor: Actor,
    path: web::Path<i64>,
    query: web::Query<WorkflowQuery>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let (board, items) = load_board(&state, project_id, actor, &query).await?;

    let active = board.active_tab();
    let facets = board.facets();
    let tmpl = ApprovalsTemplate {
        project_id,
        csrf_token: csrf::get_or_create_token(&session),
        role_labels: board.roles().labels().join(", "),
        notice: query.notice.clone().filter(|n| !n.trim().is_empty()),
        active_tab: active.as_str(),
        tabs: board.tabs().into_iter().map(|tab| TabLink::from((tab, active))).collect(),
        search: facets.search.clone(),
        status_options: FacetOption::statuses(facets.status),
        role_options: FacetOption::roles(facets.role),
        category_options: FacetOption::categories(facets.category),
        rows: board.rows(&items).iter().map(ApprovalRow::from).collect(),
    };
    render(tmpl)
}

/// POST /api/projects/{project_id}/workflow/decisions
pub async fn decide<B: ApprovalBackend + 'static>(
    state: web::Data<AppState<B>>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Json<ApiDecisionRequest>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let request = body.into_inner();
    let roles = actor_roles(&state, project_id, actor).await?;
    let dispatcher = Dispatcher::new(&state.backend, &state.cache, project_id, actor.id, &roles);

    match dispatcher
        .decide(request.item, request.action, &SuppliedNotes(request.notes))
        .await
    {
        Ok(notice) => Ok(HttpResponse::Ok().json(ApiDecisionResponse { notice })),
        Err(e) => Ok(HttpResponse::build(dispatch_status(&e)).json(ApiDecisionResponse { notice: e.notice() })),
    }
}

/// POST /api/projects/{project_id}/workflow/decisions/bulk
pub async fn decide_bulk<B: ApprovalBackend + 'static>(
    state: web::Data<AppState<B>>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Json<ApiBulkDecisionRequest>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let request = body.into_inner();
    if request.items.is_empty() {
        return Err(AppError::BadRequest("No items selected".to_string()));
    }

    let inputs = state.backend.load_role_inputs(project_id).await?;
    let mut board = ApprovalBoard::new(actor.id);
    board.sync_roles(&inputs);
    for key in request.items {
        board.select(key);
    }

    let dispatcher = Dispatcher::new(&state.backend, &state.cache, project_id, actor.id, board.roles());
    let report = dispatcher
        .decide_many(board.selection(), request.action, &SuppliedNotes(request.notes))
        .await;

    let notice = report.notice(request.action);
    Ok(HttpResponse::Ok().json(ApiBulkDecisionResponse {
        applied: report.applied,
        failed: report.failed,
        notice,
    }))
}

/// POST /projects/{project_id}/workflow/decide - Row form on the approvals page.
/// Always redirects back to the page; the outcome travels as a notice.
pub async fn decide_form<B: ApprovalBackend + 'static>(
    state: web::Data<AppState<B>>,
    session: Session,
    actor: Actor,
    path: web::Path<i64>,
    form: web::Form<DecisionForm>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let form = form.into_inner();
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let key: ItemKey = form.item.parse().map_err(AppError::BadRequest)?;
    let action = Action::parse(&form.action)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown action '{}'", form.action)))?;

    let roles = actor_roles(&state, project_id, actor).await?;
    let dispatcher = Dispatcher::new(&state.backend, &state.cache, project_id, actor.id, &roles);
    let notice = match dispatcher.decide(key, action, &SuppliedNotes(form.notes)).await {
        Ok(notice) => notice,
        Err(e) => e.notice(),
    };

    let mut params = Vec::new();
    if let Some(tab) = form.tab.as_deref().filter(|t| !t.is_empty()) {
        params.push(("tab", tab.to_string()));
    }
    params.push(("notice", notice.message));
    let query = serde_urlencoded::to_string(&params).map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", format!("/projects/{project_id}/workflow?{query}")))
        .finish())
}

/// POST /api/projects/{project_id}/workflow/refresh - Unconditional refetch.
pub async fn refresh<B: ApprovalBackend + 'static>(
    state: web::Data<AppState<B>>,
    _actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let project_id = path.into_inner();
    let items = state.cache.invalidate_and_refetch(&state.backend, project_id).await;
    Ok(HttpResponse::Ok().json(ApiRefreshResponse { total: items.len() }))
}

/// JSON routes, mounted under `/api`.
pub fn configure_api<B: ApprovalBackend + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/projects/{project_id}/workflow", web::get().to(view_json::<B>))
        .route("/projects/{project_id}/workflow/decisions", web::post().to(decide::<B>))
        .route("/projects/{project_id}/workflow/decisions/bulk", web::post().to(decide_bulk::<B>))
        .route("/projects/{project_id}/workflow/refresh", web::post().to(refresh::<B>));
}

/// HTML routes, mounted at the root.
pub fn configure_pages<B: ApprovalBackend + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/projects/{project_id}/workflow", web::get().to(view_page::<B>))
        .route("/projects/{project_id}/workflow/decide", web::post().to(decide_form::<B>));
}
