//! Bearer token 検証 → 認可 → Identity を extensions に入れて handler へ渡す
//!
//! - 判定ロジックは `pipeline.rs`、ここは axum との配線と dispatch の timeout / cancel
//! - reject 時はレスポンスを 1 回だけ返し、handler には到達しない

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, State},
    http::{Method, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::auth::pipeline::{AuthFailure, PipelineStage, Rejection};
use crate::state::AppState;

/// Prefix under which the v1 router is nested. Policy resources are relative to it.
pub const API_PREFIX: &str = "/api/v1";

/// Protect every route currently registered on `router`.
///
/// `route_layer` runs after routing, so `MatchedPath` is available and
/// unmatched paths still get a plain 404.
///
/// 例：
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

/// Route template relative to [`API_PREFIX`].
pub fn resource_from_route(route: &str) -> &str {
    match route.strip_prefix(API_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => route,
    }
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());
    let resource = route.as_deref().map(resource_from_route);

    let authorized = match state.pipeline.evaluate(req.headers(), resource, &method) {
        Ok(authorized) => authorized,
        Err(rejection) => return reject(&rejection, &method, resource),
    };

    let ctx = AuthCtx::new(authorized.identity.clone(), authorized.resource.clone());
    req.extensions_mut().insert(ctx);

    let mut guard = DispatchGuard::new(&method, &authorized.resource);
    let outcome = tokio::time::timeout(state.dispatch_timeout, next.run(req)).await;
    guard.finish();

    match outcome {
        Ok(response) => {
            debug!(
                stage = PipelineStage::Dispatched.as_str(),
                method = %method,
                route = %authorized.resource,
                subject = %authorized.identity.subject,
                status = response.status().as_u16(),
                "request dispatched"
            );
            response
        }
        Err(_) => {
            let rejection = Rejection {
                stage: PipelineStage::Authorized,
                failure: AuthFailure::DispatchTimeout,
                identity: Some(authorized.identity),
                detail: Some(format!("handler exceeded {:?}", state.dispatch_timeout)),
            };
            reject(&rejection, &method, Some(&authorized.resource))
        }
    }
}

/// Log once and build the single error response for a rejected request.
fn reject(rejection: &Rejection, method: &Method, route: Option<&str>) -> Response {
    let failure = rejection.failure;
    let subject = rejection.identity.as_ref().map(|i| i.subject.as_str());
    let role = rejection.identity.as_ref().map(|i| i.role.as_str());
    let route = route.unwrap_or("<unmatched>");
    let detail = rejection.detail.as_deref().unwrap_or("");

    if failure.is_fault() {
        error!(
            kind = failure.kind(),
            stage = rejection.stage.as_str(),
            method = %method,
            route,
            subject,
            role,
            detail,
            "request rejected"
        );
    } else {
        warn!(
            kind = failure.kind(),
            stage = rejection.stage.as_str(),
            method = %method,
            route,
            subject,
            role,
            detail,
            "request rejected"
        );
    }

    AppError::from(failure).into_response()
}

/// Notices when the dispatch future is dropped before completing, which is
/// how client disconnects show up. Nothing is written in that case.
struct DispatchGuard {
    method: Method,
    route: String,
    finished: bool,
}

impl DispatchGuard {
    fn new(method: &Method, route: &str) -> Self {
        Self {
            method: method.clone(),
            route: route.to_string(),
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                stage = PipelineStage::Rejected.as_str(),
                method = %self.method,
                route = %self.route,
                "request cancelled during dispatch"
            );
        }
    }
}
