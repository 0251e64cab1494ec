#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use api_gateway::app::{build_router, build_state};
use api_gateway::config::Config;
use api_gateway::services::policy::{MemoryPolicyBackend, PolicyRecord};
use api_gateway::state::AppState;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

pub const SECRET: &str = "integration-test-secret";

pub fn config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("ACCESS_TOKEN_SECRET".to_string(), SECRET.to_string()),
        ("POLICY_SEED_DEFAULTS".to_string(), "false".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: Arc<MemoryPolicyBackend>,
}

pub async fn app_with(records: Vec<PolicyRecord>, extra: &[(&str, &str)]) -> TestApp {
    let config = config(extra);
    let backend = Arc::new(MemoryPolicyBackend::with_records(records));
    let state = build_state(&config, backend.clone()).await.unwrap();
    TestApp {
        router: build_router(state.clone(), &config),
        state,
        backend,
    }
}

pub async fn app(records: Vec<PolicyRecord>) -> TestApp {
    app_with(records, &[]).await
}

pub fn grant(role: &str, resource: &str, action: &str) -> PolicyRecord {
    PolicyRecord::new(role, resource, action)
}

pub fn token_with_secret(claims: &Value, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn token(claims: &Value) -> String {
    token_with_secret(claims, SECRET)
}

pub fn claims(sub: &str, role: &str) -> Value {
    json!({
        "sub": sub,
        "role": role,
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + 300,
    })
}

pub fn token_for(sub: &str, role: &str) -> String {
    token(&claims(sub, role))
}

pub fn request(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, bearer: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
