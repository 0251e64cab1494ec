/*
 * Responsibility
 * - Handler から見える「認証・認可済みコンテキスト」の型
 * - middleware が pipeline を通した後に request extensions に格納し、handler はこの型だけを受け取る
 */

use crate::services::auth::Identity;

/// 認可済みのリクエストに付与されるコンテキスト
///
/// - `identity` は token から解決した subject / role
/// - `resource` は認可に使った route template (`/api/v1` を除いたもの)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: Identity,
    pub resource: String,
}

impl AuthCtx {
    pub fn new(identity: Identity, resource: String) -> Self {
        Self { identity, resource }
    }

    pub fn subject(&self) -> &str {
        &self.identity.subject
    }

    pub fn role(&self) -> &str {
        &self.identity.role
    }
}
