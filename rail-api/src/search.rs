use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use rail_shared::Train;
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    source: Option<String>,
    destination: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/booking/availability", get(availability))
}

/// GET /booking/availability?source=..&destination=..
async fn availability(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<Vec<Train>>, AppError> {
    let Query(q) = query?;
    let trains = state
        .trains
        .query_availability(q.source.as_deref(), q.destination.as_deref())
        .await?;
    Ok(Json(trains))
}
