use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::train::Train;

/// A committed seat reservation. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub train_id: Uuid,
    pub seats: i32,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, train_id: Uuid, seats: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            train_id,
            seats,
            created_at: Utc::now(),
        }
    }
}

/// Booking joined with the train it reserves seats on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingWithTrain {
    #[serde(flatten)]
    pub booking: Booking,
    pub train: Train,
}
