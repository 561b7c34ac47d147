use axum::{
    Router,
    body::Bytes,
    extract::State,
    response::Json,
    routing::get,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::{ChainResponse, PromptRequest};
use crate::pages;
use crate::services::chain::PromptChain;
use crate::services::llm::CompletionService;

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn CompletionService>,
    pub chain: Arc<PromptChain>,
}

/// Builds the complete route table. Nothing is bound here.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(pages::index).post(generate))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChainResponse>, AppError> {
    let request = PromptRequest::from_body(&body);

    let response = state.chain.handle(state.llm.as_ref(), &request).await?;
    tracing::info!(title = %response.title, script = %response.script, "Chain response");

    Ok(Json(response))
}
