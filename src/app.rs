/*
 * Responsibility
 * - Config 読み込み → 依存生成 (policy backend / store / token validator) → Router 組み立て
 * - Middleware の適用 (auth pipeline / CORS / HTTP 共通 layer)
 * - axum::serve() で起動 (ctrl_c で graceful shutdown)
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::middleware::auth::AuthPipeline;
use crate::repos::PgPolicyRepo;
use crate::services::auth::build_token_validator;
use crate::services::policy::{
    MemoryPolicyBackend, PolicyBackend, PolicyEnforcer, PolicyStore, seed,
};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG が優先。未設定なら info。
    // 例: RUST_LOG=info,api_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr が見えない起動方法でも panic を落とさない
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let backend = build_backend(&config).await?;
    let state = build_state(&config, backend).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gateway stopped");
    Ok(())
}

async fn build_backend(config: &Config) -> Result<Arc<dyn PolicyBackend>> {
    match &config.database_url {
        Some(url) => {
            let repo = PgPolicyRepo::connect(url, config.database_max_connections)
                .await
                .context("failed to open policy database")?;
            Ok(Arc::new(repo))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; policies are kept in memory only");
            Ok(Arc::new(MemoryPolicyBackend::new()))
        }
    }
}

/// Load the policy set (fatal on failure), apply the default grants when
/// configured, and wire the request pipeline.
pub async fn build_state(config: &Config, backend: Arc<dyn PolicyBackend>) -> Result<AppState> {
    let store = Arc::new(PolicyStore::new(backend));
    store
        .load()
        .await
        .context("initial policy load failed")?;

    if config.policy_seed_defaults {
        let outcome = store
            .add_rules(seed::default_rules()?)
            .await
            .context("failed to store default policy grants")?;
        tracing::info!(
            added = outcome.added,
            total = outcome.total,
            "default policy grants applied"
        );
    }

    let pipeline = AuthPipeline::new(
        build_token_validator(config),
        PolicyEnforcer::new(store.clone()),
    );

    Ok(AppState::new(
        Arc::new(pipeline),
        store,
        config.dispatch_timeout,
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
