/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /healthz 以外はすべて pipeline (route_layer) で保護する
 * - resource route は dispatch へ、/policies は管理 API へ
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::api::v1::handlers::{
    health::health,
    policies::{add_policies, list_policies, reload_policies},
    resources::dispatch,
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // users
        .route("/users/profile/{id}", get(dispatch))
        .route("/users/email/{email}", get(dispatch))
        .route("/users/{id}", put(dispatch))
        // health insights
        .route("/health/recommendations", post(dispatch))
        .route("/health/monitoring/{user_id}/realtime", get(dispatch))
        .route("/health/summary/{user_id}/daily/{date}", get(dispatch))
        .route("/health/summary/{user_id}/weekly/{start_date}", get(dispatch))
        // lifestyle
        .route("/lifestyle", post(dispatch))
        .route("/lifestyle/user/{user_id}", get(dispatch))
        .route(
            "/lifestyle/{id}",
            get(dispatch).put(dispatch).delete(dispatch),
        )
        // medical records
        .route("/medical-records", post(dispatch))
        .route("/medical-records/user/{user_id}", get(dispatch))
        .route(
            "/medical-records/{id}",
            get(dispatch).put(dispatch).delete(dispatch),
        )
        // wearable data
        .route("/wearable/data", post(dispatch))
        .route("/wearable/data/user/{user_id}", get(dispatch))
        .route(
            "/wearable/data/{id}",
            get(dispatch).put(dispatch).delete(dispatch),
        )
        // policy administration
        .route("/policies", get(list_policies).post(add_policies))
        .route("/policies/reload", post(reload_policies));

    let protected = middleware::auth::access::apply(protected, state);

    Router::new().route("/healthz", get(health)).merge(protected)
}
