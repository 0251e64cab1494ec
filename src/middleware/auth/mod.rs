/*
 * Responsibility
 * - 認証 (bearer token) → 認可 (policy) → dispatch の request pipeline
 */
pub mod access;
pub mod credential;
pub mod pipeline;

pub use pipeline::{AuthFailure, AuthPipeline, Authorized, PipelineStage, Rejection};
