use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::post,
    Json, Router,
};
use rail_shared::{NewTrain, Train};
use serde::Deserialize;

use crate::{error::AppError, middleware::admin_key_middleware, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateTrainRequest {
    pub name: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub seats: Option<i32>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/train", post(create_train))
        .route_layer(middleware::from_fn_with_state(state, admin_key_middleware))
}

/// POST /admin/train
async fn create_train(
    State(state): State<AppState>,
    payload: Result<Json<CreateTrainRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Train>), AppError> {
    let Json(req) = payload?;
    let seats = req
        .seats
        .ok_or_else(|| AppError::ValidationError("seats is required".to_string()))?;

    let train = state
        .trains
        .create_train(NewTrain {
            name: req.name.unwrap_or_default(),
            source: req.source.unwrap_or_default(),
            destination: req.destination.unwrap_or_default(),
            seats,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(train)))
}
