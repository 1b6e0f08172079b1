use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A train and its currently available seat count.
///
/// `seats` only ever moves down (bookings) after creation and never drops
/// below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub id: Uuid,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub seats: i32,
    pub created_at: DateTime<Utc>,
}

/// Admin input for creating a train.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrain {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub seats: i32,
}

impl Train {
    pub fn from_new(new: NewTrain) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            source: new.source,
            destination: new.destination,
            seats: new.seats,
            created_at: Utc::now(),
        }
    }

    /// True when the train runs between the given stations. `None` matches anything.
    pub fn matches_route(&self, source: Option<&str>, destination: Option<&str>) -> bool {
        source.map_or(true, |s| self.source == s) && destination.map_or(true, |d| self.destination == d)
    }
}
