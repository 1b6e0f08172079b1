use async_trait::async_trait;
use rail_shared::{Booking, BookingWithTrain, NewTrain, NewUser, Train, User};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Record already exists: {0}")]
    Duplicate(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Predicate a seat update must satisfy against the *committed* seat count
/// at the moment the unit of work is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatGuard {
    /// Committed seats must be at least this many.
    AtLeast(i32),
    /// Committed seats must still equal a previously read snapshot.
    Equals(i32),
}

impl SeatGuard {
    pub fn holds(&self, committed: i32) -> bool {
        match *self {
            SeatGuard::AtLeast(min) => committed >= min,
            SeatGuard::Equals(expected) => committed == expected,
        }
    }
}

/// One operation inside an atomic unit of work.
#[derive(Debug, Clone)]
pub enum UnitOp {
    /// Decrement `seats` on the train if `guard` holds and the result stays non-negative.
    ReserveSeats {
        train_id: Uuid,
        guard: SeatGuard,
        seats: i32,
    },
    InsertBooking(Booking),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    GuardFailed { current: i32 },
    MissingTrain,
    /// Reservations and bookings must carry at least one seat.
    NonPositiveSeats { seats: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every operation applied; `trains` holds the rows as committed.
    Committed { trains: Vec<Train> },
    /// Nothing applied. `op_index` points at the operation that refused.
    Rejected { op_index: usize, reason: Rejection },
}

/// Storage the booking core runs against.
///
/// Implementations must apply a `commit_unit` batch all-or-nothing and must
/// evaluate every [`SeatGuard`] against the latest committed value, not a
/// value read earlier by the caller.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn read_train(&self, id: Uuid) -> StoreResult<Option<Train>>;

    async fn insert_train(&self, train: NewTrain) -> StoreResult<Train>;

    async fn find_trains(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> StoreResult<Vec<Train>>;

    async fn commit_unit(&self, ops: Vec<UnitOp>) -> StoreResult<CommitOutcome>;

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<BookingWithTrain>>;

    /// Conditionally decrement a single train's seats.
    async fn atomic_update_if(
        &self,
        train_id: Uuid,
        guard: SeatGuard,
        seats: i32,
    ) -> StoreResult<CommitOutcome> {
        self.commit_unit(vec![UnitOp::ReserveSeats { train_id, guard, seats }])
            .await
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_guard() {
        assert!(SeatGuard::AtLeast(2).holds(2));
        assert!(SeatGuard::AtLeast(2).holds(5));
        assert!(!SeatGuard::AtLeast(2).holds(1));
        assert!(SeatGuard::Equals(4).holds(4));
        assert!(!SeatGuard::Equals(4).holds(3));
    }
}
