use async_trait::async_trait;
use rail_shared::{Booking, BookingWithTrain, NewTrain, NewUser, Train, User};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::{
    CommitOutcome, Rejection, StoreError, StoreResult, TransactionalStore, UnitOp, UserRepository,
};

#[derive(Default)]
struct Tables {
    trains: HashMap<Uuid, Train>,
    bookings: Vec<Booking>,
    users: HashMap<Uuid, User>,
}

/// In-process transactional store.
///
/// A unit of work is validated and applied while holding the write lock, so
/// concurrent commits are serialized and a rejected unit leaves no trace.
/// Used for local runs (`storage.backend = "memory"`) and tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    commit_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a slow backend: every commit waits this long before taking the lock.
    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    pub async fn bookings_for_train(&self, train_id: Uuid) -> Vec<Booking> {
        let tables = self.tables.read().await;
        tables
            .bookings
            .iter()
            .filter(|b| b.train_id == train_id)
            .cloned()
            .collect()
    }

    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    async fn read_train(&self, id: Uuid) -> StoreResult<Option<Train>> {
        Ok(self.tables.read().await.trains.get(&id).cloned())
    }

    async fn insert_train(&self, train: NewTrain) -> StoreResult<Train> {
        let train = Train::from_new(train);
        let mut tables = self.tables.write().await;
        tables.trains.insert(train.id, train.clone());
        Ok(train)
    }

    async fn find_trains(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> StoreResult<Vec<Train>> {
        let tables = self.tables.read().await;
        let mut trains: Vec<Train> = tables
            .trains
            .values()
            .filter(|t| t.matches_route(source, destination))
            .cloned()
            .collect();
        trains.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(trains)
    }

    async fn commit_unit(&self, ops: Vec<UnitOp>) -> StoreResult<CommitOutcome> {
        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }

        let mut tables = self.tables.write().await;

        // Stage against the committed rows first; only touch the tables once
        // every operation has been accepted.
        let mut staged: HashMap<Uuid, i32> = HashMap::new();
        for (op_index, op) in ops.iter().enumerate() {
            match op {
                UnitOp::ReserveSeats { train_id, guard, seats } => {
                    if *seats <= 0 {
                        return Ok(CommitOutcome::Rejected {
                            op_index,
                            reason: Rejection::NonPositiveSeats { seats: *seats },
                        });
                    }
                    let Some(train) = tables.trains.get(train_id) else {
                        return Ok(CommitOutcome::Rejected { op_index, reason: Rejection::MissingTrain });
                    };
                    let current = *staged.get(train_id).unwrap_or(&train.seats);
                    let remaining = current.checked_sub(*seats).filter(|left| *left >= 0);
                    let Some(remaining) = remaining.filter(|_| guard.holds(current)) else {
                        return Ok(CommitOutcome::Rejected {
                            op_index,
                            reason: Rejection::GuardFailed { current },
                        });
                    };
                    staged.insert(*train_id, remaining);
                }
                UnitOp::InsertBooking(booking) => {
                    if booking.seats <= 0 {
                        return Ok(CommitOutcome::Rejected {
                            op_index,
                            reason: Rejection::NonPositiveSeats { seats: booking.seats },
                        });
                    }
                    if !tables.trains.contains_key(&booking.train_id) {
                        return Ok(CommitOutcome::Rejected { op_index, reason: Rejection::MissingTrain });
                    }
                    if tables.bookings.iter().any(|b| b.id == booking.id) {
                        return Err(StoreError::Duplicate(format!("booking {}", booking.id)));
                    }
                }
            }
        }

        let mut updated = Vec::with_capacity(staged.len());
        for (train_id, seats) in staged {
            if let Some(train) = tables.trains.get_mut(&train_id) {
                train.seats = seats;
                updated.push(train.clone());
            }
        }
        for op in ops {
            if let UnitOp::InsertBooking(booking) = op {
                tables.bookings.push(booking);
            }
        }

        Ok(CommitOutcome::Committed { trains: updated })
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<BookingWithTrain>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<BookingWithTrain> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| {
                tables.trains.get(&b.train_id).map(|train| BookingWithTrain {
                    booking: b.clone(),
                    train: train.clone(),
                })
            })
            .collect();
        bookings.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        let user = User::from_new(user);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}
