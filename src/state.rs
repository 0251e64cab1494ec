/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - pipeline: token 検証 + policy enforcer
 *   - policies: 管理 API 用に同じ PolicyStore を共有
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;
use std::time::Duration;

use crate::middleware::auth::AuthPipeline;
use crate::services::policy::PolicyStore;

#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: Arc<AuthPipeline>,
    pub policies: Arc<PolicyStore>,
    pub dispatch_timeout: Duration,
}

impl AppState {
    pub fn new(
        pipeline: Arc<AuthPipeline>,
        policies: Arc<PolicyStore>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            policies,
            dispatch_timeout,
        }
    }
}
