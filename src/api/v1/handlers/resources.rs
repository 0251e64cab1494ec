/*
 * Responsibility
 * - 保護された resource route の dispatch 先
 * - backend への転送は行わず、認可済みの内容をそのまま返す
 */
use std::collections::BTreeMap;

use axum::{
    Json,
    extract::RawPathParams,
    http::Method,
    response::IntoResponse,
};
use serde::Serialize;

use crate::api::v1::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
pub struct DispatchAck {
    pub route: String,
    pub method: String,
    pub subject: String,
    pub role: String,
    pub params: BTreeMap<String, String>,
}

pub async fn dispatch(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    method: Method,
    params: RawPathParams,
) -> impl IntoResponse {
    let params = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Json(DispatchAck {
        route: ctx.resource.clone(),
        method: method.to_string(),
        subject: ctx.subject().to_string(),
        role: ctx.role().to_string(),
        params,
    })
}

