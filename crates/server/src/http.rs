use crate::flow::{FlowController, FlowState, StepOneForm};
use crate::pages;
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fairfight_protocol::{non_blank, LinkParams, Step};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const MAX_RECENT_LIMIT: usize = 100;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub flow: FlowController,
}

impl AppState {
    pub fn new(flow: FlowController) -> SharedState {
        Arc::new(Self { flow })
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/cases", post(create_case))
        .route("/verdicts", post(submit_verdict))
        .route("/api/verdicts/recent", get(recent_verdicts))
        .route("/healthz", get(health))
        .with_state(state)
}

/// Party B's form: the link parameters as hidden fields plus the answer.
#[derive(Debug, Deserialize)]
pub struct ResponseForm {
    #[serde(flatten)]
    pub link: LinkParams,
    #[serde(default)]
    pub user2_input: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<usize>,
}

async fn index(State(state): State<SharedState>, Query(params): Query<LinkParams>) -> Response {
    match params.step() {
        Step::Collect => {
            let theme = params.theme().unwrap_or_default();
            render_state(state.flow.collect_a(theme), &params)
        }
        Step::Respond => render_state(state.flow.open_response(&params).await, &params),
    }
}

async fn create_case(State(state): State<SharedState>, Form(form): Form<StepOneForm>) -> Response {
    match state.flow.submit_case(form.clone()).await {
        Ok(next) => render_state(next, &LinkParams::default()),
        Err(err) => {
            log::debug!("Step one rejected: {err}");
            let page = pages::collect_a(form.theme(), &form, Some(&err.to_string()));
            (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response()
        }
    }
}

async fn submit_verdict(
    State(state): State<SharedState>,
    Form(form): Form<ResponseForm>,
) -> Response {
    match state
        .flow
        .submit_response(&form.link, &form.user2_input)
        .await
    {
        Ok(next) => render_state(next, &form.link),
        Err(err) => {
            log::debug!("Response rejected: {err}");
            match state.flow.open_response(&form.link).await {
                FlowState::CollectB(case) => {
                    let page = pages::collect_b(&case, &form.user2_input, Some(&err.to_string()));
                    (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response()
                }
                other => render_state(other, &form.link),
            }
        }
    }
}

async fn recent_verdicts(
    State(state): State<SharedState>,
    Query(params): Query<RecentParams>,
) -> Response {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    match state.flow.store().recent_verdicts(limit).await {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            log::error!("Listing recent verdicts failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "could not read verdicts" })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "fairfight" }))
}

fn render_state(state: FlowState, params: &LinkParams) -> Response {
    log::debug!("Rendering {} page", state.name());
    match state {
        FlowState::CorruptedLink => (
            StatusCode::BAD_REQUEST,
            Html(pages::corrupted_link(non_blank(&params.user1_name))),
        )
            .into_response(),
        other => Html(pages::state(&other)).into_response(),
    }
}
