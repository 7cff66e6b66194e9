use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{ApiErr, Ctx, Result};
use crate::models::SuggestionResults;

/// Suggestion query params. Coordinates arrive as raw strings so that
/// non-numeric values produce a 400 naming the field instead of a generic
/// deserialization rejection.
#[derive(Debug, serde::Deserialize, Default)]
pub struct SuggestParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

/// GET /suggestions — the single public query endpoint.
pub async fn get_suggestions(
    State(ctx): State<Arc<Ctx>>,
    Query(params): Query<SuggestParams>,
) -> Result<Response> {
    let q = params.q.as_deref().unwrap_or("").trim();
    if q.is_empty() {
        return Err(ApiErr::new(
            "`q` parameter is required",
            StatusCode::BAD_REQUEST,
        ));
    }

    // The ranker never sees unvalidated coordinates.
    let location = parse_location(&params)?;

    let suggestions = ctx.ranker.suggest(q, location)?;

    // An empty match set is a valid response, reported as a 404 with an
    // empty array rather than an error object.
    let status = if suggestions.is_empty() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    Ok((status, Json(SuggestionResults { suggestions })).into_response())
}

/// Validate the optional coordinate pair: both present or both absent, each
/// a finite number within geographic range. A 400 names every offending
/// field.
fn parse_location(params: &SuggestParams) -> Result<Option<(f64, f64)>> {
    let (lat, lon) = match (&params.latitude, &params.longitude) {
        (None, None) => return Ok(None),
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(ApiErr::new(
                "latitude and longitude must be provided together",
                StatusCode::BAD_REQUEST,
            ));
        }
    };

    let mut invalid = Vec::new();
    let lat = parse_coord(lat, -90.0, 90.0).unwrap_or_else(|| {
        invalid.push("latitude");
        0.0
    });
    let lon = parse_coord(lon, -180.0, 180.0).unwrap_or_else(|| {
        invalid.push("longitude");
        0.0
    });

    if !invalid.is_empty() {
        return Err(ApiErr::new(
            format!("invalid {} parameter(s)", invalid.join(", ")),
            StatusCode::BAD_REQUEST,
        ));
    }

    Ok(Some((lat, lon)))
}

fn parse_coord(s: &str, min: f64, max: f64) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() && (min..=max).contains(&v) {
        Some(v)
    } else {
        None
    }
}
