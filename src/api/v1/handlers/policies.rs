/*
 * Responsibility
 * - GET /policies, POST /policies, POST /policies/reload
 * - 認可自体は pipeline (route_layer) 側で済んでいる前提
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::api::v1::dto::policies::{
    AddPoliciesRequest, AddPoliciesResponse, PolicyListResponse, PolicyRuleDto, ReloadResponse,
};
use crate::api::v1::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::services::policy::PolicyRule;
use crate::state::AppState;

pub async fn list_policies(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.policies.snapshot()?;
    let rules: Vec<PolicyRuleDto> = snapshot.rules().iter().map(PolicyRuleDto::from).collect();

    Ok(Json(PolicyListResponse {
        total: rules.len(),
        rules,
    }))
}

pub async fn add_policies(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    payload: Result<Json<AddPoliciesRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    if req.rules.is_empty() {
        return Err(AppError::bad_request("rules must not be empty"));
    }

    // Validate everything before touching the store.
    let rules = req
        .rules
        .into_iter()
        .enumerate()
        .map(|(i, dto)| {
            PolicyRule::try_from(dto)
                .map_err(|e| AppError::bad_request(format!("rules[{i}]: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = state.policies.add_rules(rules).await?;
    info!(
        subject = ctx.subject(),
        added = outcome.added,
        total = outcome.total,
        "policy rules submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(AddPoliciesResponse {
            added: outcome.added,
            total: outcome.total,
        }),
    ))
}

pub async fn reload_policies(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<impl IntoResponse, AppError> {
    let total = state.policies.load().await?;
    info!(subject = ctx.subject(), total, "policy set reloaded");

    Ok(Json(ReloadResponse { total }))
}
