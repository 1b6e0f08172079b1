use rail_shared::{Booking, BookingWithTrain};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::repository::{CommitOutcome, Rejection, SeatGuard, TransactionalStore, UnitOp};
use crate::{CoreError, CoreResult};

/// How the seat decrement is conditioned at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardStrategy {
    /// Apply the decrement while committed seats still cover the request.
    #[default]
    Floor,
    /// Apply the decrement only if committed seats still equal the value read.
    Snapshot,
}

#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Attempts per `book` call, the first one included.
    pub max_attempts: u32,
    /// Deadline for a whole `book` call across all attempts.
    ///
    /// With a networked store the deadline can expire while the commit is in
    /// flight after the server has already applied it, so a `TimeoutError`
    /// does not prove that no booking was made.
    pub timeout: Duration,
    pub guard: GuardStrategy,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(5),
            guard: GuardStrategy::Floor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub booking: Booking,
    pub remaining_seats: i32,
    pub attempts: u32,
}

enum Attempt {
    Booked(BookingReceipt),
    Raced { current: i32 },
}

/// Reserves seats on trains without ever overselling them.
///
/// Holds no locks of its own: correctness comes entirely from the store
/// re-checking the seat guard against the latest committed value.
pub struct BookingService {
    store: Arc<dyn TransactionalStore>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(store: Arc<dyn TransactionalStore>, policy: BookingPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub async fn book(
        &self,
        user_id: Uuid,
        train_id: Uuid,
        requested: Option<i32>,
    ) -> CoreResult<BookingReceipt> {
        let requested = match requested {
            Some(n) if n > 0 => n,
            Some(n) => {
                return Err(CoreError::ValidationError(format!(
                    "seats must be a positive integer, got {}",
                    n
                )))
            }
            None => return Err(CoreError::ValidationError("seats is required".to_string())),
        };

        let deadline = Instant::now() + self.policy.timeout;
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self
                .within(deadline, self.try_book(user_id, train_id, requested, attempt))
                .await?
            {
                Attempt::Booked(receipt) => {
                    info!(
                        booking_id = %receipt.booking.id,
                        %train_id,
                        %user_id,
                        seats = requested,
                        remaining = receipt.remaining_seats,
                        attempt,
                        "Booking committed"
                    );
                    return Ok(receipt);
                }
                Attempt::Raced { current } => {
                    warn!(
                        %train_id,
                        requested,
                        current,
                        attempt,
                        max_attempts,
                        "Seat guard failed at commit, another booking won the race"
                    );
                }
            }
        }

        Err(CoreError::ConflictError { train_id, attempts: max_attempts })
    }

    async fn try_book(
        &self,
        user_id: Uuid,
        train_id: Uuid,
        requested: i32,
        attempt: u32,
    ) -> CoreResult<Attempt> {
        // 1. Snapshot
        let train = self
            .store
            .read_train(train_id)
            .await?
            .ok_or(CoreError::NotFoundError(train_id))?;

        // 2. Capacity check against the snapshot
        if train.seats - requested < 0 {
            return Err(CoreError::InsufficientCapacityError {
                requested,
                available: train.seats,
            });
        }

        // 3. Conditional decrement + booking insert as one unit
        let guard = match self.policy.guard {
            GuardStrategy::Floor => SeatGuard::AtLeast(requested),
            GuardStrategy::Snapshot => SeatGuard::Equals(train.seats),
        };
        let booking = Booking::new(user_id, train_id, requested);
        let ops = vec![
            UnitOp::ReserveSeats { train_id, guard, seats: requested },
            UnitOp::InsertBooking(booking.clone()),
        ];

        match self.store.commit_unit(ops).await? {
            CommitOutcome::Committed { trains } => {
                let remaining_seats = trains
                    .iter()
                    .find(|t| t.id == train_id)
                    .map(|t| t.seats)
                    .unwrap_or(train.seats - requested);
                Ok(Attempt::Booked(BookingReceipt { booking, remaining_seats, attempts: attempt }))
            }
            CommitOutcome::Rejected { reason: Rejection::GuardFailed { current }, .. } => {
                Ok(Attempt::Raced { current })
            }
            CommitOutcome::Rejected { reason: Rejection::MissingTrain, .. } => {
                Err(CoreError::NotFoundError(train_id))
            }
            CommitOutcome::Rejected { reason: Rejection::NonPositiveSeats { seats }, .. } => {
                Err(CoreError::ValidationError(format!("seats must be positive, got {}", seats)))
            }
        }
    }

    pub async fn list_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingWithTrain>> {
        Ok(self.store.bookings_for_user(user_id).await?)
    }

    async fn within<T>(
        &self,
        deadline: Instant,
        fut: impl Future<Output = CoreResult<T>>,
    ) -> CoreResult<T> {
        tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| CoreError::TimeoutError(self.policy.timeout))?
    }
}
