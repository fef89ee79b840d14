//! HTTP API handlers for Hazardwatch.
//!
//! A read-only view over the [`Aggregator`]:
//!
//! - **GET /events**: every hazard type, fetched concurrently.
//! - **GET /events/:hazard**: current events for one hazard type. An empty
//!   list is a normal `200` response meaning "no current events".
//! - **GET /events/:hazard/:id**: one event from the most recent fetch, or
//!   `404` if it is no longer there. Clients should re-list on `404`.
//! - **GET /health**: liveness.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::{info, instrument, warn};

use crate::aggregator::Aggregator;
use crate::error::SelectError;
use crate::model::{EventsResponse, HazardEvent, HazardFeeds, HazardType};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", get(list_all_events))
        .route("/events/:hazard", get(list_events))
        .route("/events/:hazard/:id", get(get_event))
        .route("/health", get(health_check))
        .with_state(state)
}

fn parse_hazard(raw: &str) -> Result<HazardType, StatusCode> {
    raw.parse().map_err(|e| {
        warn!(error = %e, "Invalid hazard type");
        StatusCode::BAD_REQUEST
    })
}

/// GET /events - Current events for every hazard type.
///
/// # Response
///
/// ```json
/// {
///     "timestamp": "2024-08-01T12:00:00Z",
///     "feeds": [
///         { "hazard_type": "seismic", "count": 1, "events": [ ... ] },
///         { "hazard_type": "wildfire", "count": 0, "events": [] }
///     ]
/// }
/// ```
#[instrument(skip(state))]
pub async fn list_all_events(State(state): State<AppState>) -> Json<HazardFeeds> {
    let feeds = state.aggregator.fetch_all().await;
    info!(feed_count = feeds.feeds.len(), "All feeds queried");
    Json(feeds)
}

/// GET /events/:hazard - Current events for one hazard type.
///
/// `:hazard` accepts `seismic`, `wildfire`, `cyclone`, `tsunami` and common
/// aliases such as `earthquakes` or `hurricanes`.
///
/// # Response
///
/// ```json
/// {
///     "hazard_type": "seismic",
///     "count": 1,
///     "events": [
///         {
///             "id": "ci40567128",
///             "hazard_type": "seismic",
///             "location": { "latitude": 34.0, "longitude": -118.2 },
///             "primary_magnitude": 5.2,
///             "attributes": { "place": "12 km NE of Los Angeles, CA" },
///             "observed_at": "2024-08-01T11:58:00Z",
///             "severity": { "band": "moderate", "color": "orange", "marker_radius": 10.4 }
///         }
///     ]
/// }
/// ```
#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Path(hazard): Path<String>,
) -> Result<Json<EventsResponse>, StatusCode> {
    let hazard_type = parse_hazard(&hazard)?;

    let events = state.aggregator.fetch_events(hazard_type).await;
    info!(hazard = %hazard_type, count = events.len(), "Events queried");

    Ok(Json(EventsResponse::new(hazard_type, events)))
}

/// GET /events/:hazard/:id - One event from the most recent fetch.
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path((hazard, id)): Path<(String, String)>,
) -> Result<Json<HazardEvent>, StatusCode> {
    let hazard_type = parse_hazard(&hazard)?;

    match state.aggregator.select_event(hazard_type, &id).await {
        Ok(event) => Ok(Json(event)),
        Err(e @ SelectError::NotFound { .. }) => {
            info!(error = %e, "Selected event not found");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
