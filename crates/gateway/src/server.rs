use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        extract::State,
        response::IntoResponse,
        routing::{get, post},
    },
    tower_http::trace::TraceLayer,
    tracing::info,
};

use crate::{ajax::AJAX_PATH, state::GatewayState};

/// Router state shared by every handler, including the page routes merged in
/// by the web crate.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the application router. `pages` carries the admin pages and assets;
/// tests pass an empty router to exercise the endpoints alone.
pub fn build_gateway_app(state: Arc<GatewayState>, pages: Router<AppState>) -> Router {
    let app_state = AppState { gateway: state };

    Router::new()
        .route("/health", get(health_handler))
        .route(AJAX_PATH, post(crate::ajax::ajax_handler))
        .merge(pages)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the HTTP server and serve until the process exits.
pub async fn start_gateway(
    bind: &str,
    port: u16,
    state: Arc<GatewayState>,
    pages: Router<AppState>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let base_url = state.base_url();
    let assistant = state.users.find_assistant().await?;
    let app = build_gateway_app(Arc::clone(&state), pages);

    // Startup banner.
    let mut lines = vec![
        format!("clawpress v{}", state.version),
        format!("listening on http://{addr}"),
        format!("site: {base_url}"),
    ];
    match assistant {
        Some(user) => lines.push(format!("assistant: {}", user.display_name)),
        None => lines.push(format!(
            "no assistant yet: {base_url}{}",
            clawpress_onboarding::service::SETUP_PAGE_PATH
        )),
    }
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.gateway.version,
    }))
}
