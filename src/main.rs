//! Cooking Timers - guided-cooking timer server
//!
//! This is the main entry point for the cooking-timers application.

use std::{fs, path::Path, sync::Arc};
use anyhow::Context;
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tracing::info;

use cooking_timers::{
    api::create_router,
    config::Config,
    plan::TimerOrchestration,
    recipe::Recipe,
    state::{AppState, SystemClock},
    utils::shutdown_signal,
};

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("cooking_timers={},tower_http=info", config.log_level()))
        .init();

    info!("Starting cooking-timers server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms",
          config.host, config.port, config.tick_interval().as_millis());

    let recipe: Recipe = load_json(&config.recipe)?;
    info!("Loaded recipe '{}' ({} steps, {} servings)",
          recipe.name, recipe.steps.len(), recipe.default_servings);

    let mut app_state = AppState::new(
        recipe,
        Arc::new(SystemClock),
        config.tick_interval(),
        config.host.clone(),
        config.port,
    );
    if let Some(plan_path) = &config.plan {
        let orchestration: TimerOrchestration = load_json(plan_path)?;
        info!("Using precomputed orchestration with {} timers", orchestration.timer_sequence.len());
        app_state = app_state.with_external_plan(orchestration);
    }
    let state = Arc::new(app_state);

    if let Some(servings) = config.servings {
        state.begin_session(servings).await
            .context("Failed to open initial cooking session")?;
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /recipe/scaled?servings=N      - Scale the recipe");
    info!("  POST   /session                       - Start a cooking session");
    info!("  GET    /session                       - Session, timers and plan");
    info!("  DELETE /session                       - End the cooking session");
    info!("  POST   /session/steps/next|previous   - Move the current step");
    info!("  POST   /session/timers/:id/start      - Start a planned timer");
    info!("  POST   /session/timers/:id/pause      - Pause a timer");
    info!("  POST   /session/timers/:id/resume     - Resume a timer");
    info!("  GET    /session/events                - Timer event stream");
    info!("  GET    /health                        - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if state.end_session().await? {
        info!("Active cooking session ended");
    }

    info!("Server shutdown complete");
    Ok(())
}
