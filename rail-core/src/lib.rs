pub mod booking;
pub mod memory;
pub mod repository;
pub mod trains;

use std::time::Duration;
use uuid::Uuid;

pub use booking::{BookingPolicy, BookingReceipt, BookingService, GuardStrategy};
pub use memory::MemoryStore;
pub use repository::{StoreError, StoreResult, TransactionalStore, UserRepository};
pub use trains::TrainService;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Train not found: {0}")]
    NotFoundError(Uuid),
    #[error("Not enough seats available: requested {requested}, available {available}")]
    InsufficientCapacityError { requested: i32, available: i32 },
    #[error("Concurrent booking conflict on train {train_id} after {attempts} attempts")]
    ConflictError { train_id: Uuid, attempts: u32 },
    #[error("Store did not settle the booking within {0:?}")]
    TimeoutError(Duration),
    #[error(transparent)]
    StoreError(#[from] StoreError),
}

impl CoreError {
    /// Stable identifier the access layer puts on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::ValidationError(_) => "validation",
            CoreError::NotFoundError(_) => "not_found",
            CoreError::InsufficientCapacityError { .. } => "insufficient_capacity",
            CoreError::ConflictError { .. } => "conflict",
            CoreError::TimeoutError(_) => "timeout",
            CoreError::StoreError(StoreError::Duplicate(_)) => "duplicate",
            CoreError::StoreError(StoreError::Unavailable(_)) => "unavailable",
            CoreError::StoreError(StoreError::Backend(_)) => "internal",
        }
    }

    /// Whether re-submitting the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::ConflictError { .. }
                | CoreError::TimeoutError(_)
                | CoreError::StoreError(StoreError::Unavailable(_))
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinct() {
        let train_id = Uuid::new_v4();
        let errors = [
            CoreError::ValidationError("seats".into()),
            CoreError::NotFoundError(train_id),
            CoreError::InsufficientCapacityError { requested: 2, available: 1 },
            CoreError::ConflictError { train_id, attempts: 3 },
            CoreError::TimeoutError(Duration::from_secs(1)),
        ];
        let mut kinds: Vec<_> = errors.iter().map(CoreError::kind).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_only_races_and_outages_are_transient() {
        let train_id = Uuid::new_v4();
        assert!(CoreError::ConflictError { train_id, attempts: 3 }.is_transient());
        assert!(CoreError::TimeoutError(Duration::from_millis(10)).is_transient());
        assert!(CoreError::from(StoreError::Unavailable("pool".into())).is_transient());
        assert!(!CoreError::InsufficientCapacityError { requested: 1, available: 0 }.is_transient());
        assert!(!CoreError::NotFoundError(train_id).is_transient());
    }
}
