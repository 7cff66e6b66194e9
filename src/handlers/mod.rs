pub mod suggestions;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ranker::Ranker;

/// Application context passed to all handlers.
pub struct Ctx {
    pub ranker: Arc<dyn Ranker>,
}

/// API error type. Client errors carry a JSON body naming the problem;
/// internal errors are logged and surfaced as an opaque, empty 500 so no
/// detail leaks to the caller.
#[derive(Debug)]
pub struct ApiErr {
    pub message: String,
    pub status: StatusCode,
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl ApiErr {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }
}

impl<E: std::fmt::Display> From<E> for ApiErr {
    fn from(err: E) -> Self {
        Self::new(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("internal error: {}", self.message);
            return self.status.into_response();
        }

        (
            self.status,
            Json(ErrBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiErr>;
