use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use rail_shared::{Booking, BookingWithTrain};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{customer_auth_middleware, Claims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookRequest {
    train_id: Option<Uuid>,
    seats: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookResponse {
    message: &'static str,
    booking: Booking,
    remaining_seats: i32,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/booking/book", post(book))
        .route("/booking/booking", get(list_bookings))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware))
}

/// POST /booking/book
async fn book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let Json(req) = payload?;
    let user_id = claims.user_id()?;
    let train_id = req
        .train_id
        .ok_or_else(|| AppError::ValidationError("trainId is required".to_string()))?;

    let receipt = state.bookings.book(user_id, train_id, req.seats).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            message: "Booking successful",
            booking: receipt.booking,
            remaining_seats: receipt.remaining_seats,
        }),
    ))
}

/// GET /booking/booking
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingWithTrain>>, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(state.bookings.list_bookings(user_id).await?))
}
