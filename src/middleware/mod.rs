/*
 * Responsibility
 * - middlware の公開インターフェース
 * - auth (pipeline), cors, http (request-id / trace / limit / timeout / headers)
 */
pub mod auth;
pub mod cors;
pub mod http;
