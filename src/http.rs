use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{suggestions, Ctx};

/// Initialize HTTP routes.
pub fn init_handlers(ctx: Arc<Ctx>) -> Router {
    Router::new()
        .route("/suggestions", get(suggestions::get_suggestions))
        .with_state(ctx)
}
