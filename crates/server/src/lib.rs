//! # FairFight Server
//!
//! The web flow around JudgeBot: party A files a conflict, receives a link
//! for party B, party B answers and both get a verdict.
//!
//! ## Architecture
//!
//! ```text
//! HTTP (axum)
//!     ├──> GET  /                      step-one form | step-two form | corrupted link
//!     ├──> POST /cases                 FlowController::submit_case
//!     ├──> POST /verdicts              FlowController::submit_response
//!     ├──> GET  /api/verdicts/recent   CaseStore::recent_verdicts (JSON)
//!     └──> GET  /healthz
//!
//! FlowController
//!     ├──> CaseStore (fairfight-store)   case handoff + verdict log
//!     ├──> Judge (fairfight-judge)       one chat completion per verdict
//!     └──> links                          share links, mailto / WhatsApp deep-links
//! ```
//!
//! Pages are askama templates; everything user-supplied is escaped and the
//! verdict's markdown is rendered without raw HTML.

pub mod config;
pub mod flow;
pub mod http;
pub mod links;
mod pages;

pub use config::{AppConfig, LlmConfig, LlmMode, ServeArgs, StoreArgs, StoreBackend, StoreConfig};
pub use flow::{
    FlowController, FlowSettings, FlowState, LinkIssued, ResolvedCase, StepOneForm,
    ValidationError, VerdictShown,
};
pub use http::{router, AppState, SharedState};

use anyhow::Result;
use axum::Router;
use std::sync::Arc;

/// Open the store, build the judge and wire the router.
pub async fn build_app(config: &AppConfig) -> Result<Router> {
    let store = config.store.open().await?;
    let judge = config.llm.build_judge()?;
    log::info!(
        "Store: {} ({}), verdicts: {} ({})",
        store.backend_name(),
        config.store.data_dir.display(),
        config.llm.mode.as_str(),
        judge.config().model
    );
    let flow = FlowController::new(store, Arc::new(judge), config.flow.clone());
    Ok(router(AppState::new(flow)))
}
