use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rail_core::repository::{
    CommitOutcome, Rejection, SeatGuard, StoreError, StoreResult, TransactionalStore, UnitOp,
};
use rail_shared::{Booking, BookingWithTrain, NewTrain, Train};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

/// Postgres-backed transactional store.
///
/// Seat reservations are a single guarded `UPDATE ... RETURNING`. Under READ
/// COMMITTED a concurrent writer on the same row blocks on the row lock and
/// then re-evaluates the `WHERE` clause against the newly committed version,
/// so the guard always sees the latest seats. The `CHECK (seats >= 0)`
/// constraint backs it up.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct TrainRow {
    id: Uuid,
    name: String,
    source: String,
    destination: String,
    seats: i32,
    created_at: DateTime<Utc>,
}

impl From<TrainRow> for Train {
    fn from(row: TrainRow) -> Self {
        Train {
            id: row.id,
            name: row.name,
            source: row.source,
            destination: row.destination,
            seats: row.seats,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingTrainRow {
    id: Uuid,
    user_id: Uuid,
    train_id: Uuid,
    seats: i32,
    created_at: DateTime<Utc>,
    train_name: String,
    train_source: String,
    train_destination: String,
    train_seats: i32,
    train_created_at: DateTime<Utc>,
}

impl From<BookingTrainRow> for BookingWithTrain {
    fn from(row: BookingTrainRow) -> Self {
        BookingWithTrain {
            booking: Booking {
                id: row.id,
                user_id: row.user_id,
                train_id: row.train_id,
                seats: row.seats,
                created_at: row.created_at,
            },
            train: Train {
                id: row.train_id,
                name: row.train_name,
                source: row.train_source,
                destination: row.train_destination,
                seats: row.train_seats,
                created_at: row.train_created_at,
            },
        }
    }
}

pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

const TRAIN_COLUMNS: &str = "id, name, source, destination, seats, created_at";

async fn reserve_seats(
    tx: &mut Transaction<'_, Postgres>,
    train_id: Uuid,
    guard: SeatGuard,
    seats: i32,
) -> StoreResult<Result<Train, Rejection>> {
    if seats <= 0 {
        return Ok(Err(Rejection::NonPositiveSeats { seats }));
    }

    let (floor, expected) = match guard {
        SeatGuard::AtLeast(min) => (min.max(seats), None),
        SeatGuard::Equals(snapshot) => (seats, Some(snapshot)),
    };

    let row = sqlx::query_as::<_, TrainRow>(&format!(
        "UPDATE trains SET seats = seats - $2 \
         WHERE id = $1 AND seats >= $3 AND ($4::INTEGER IS NULL OR seats = $4) \
         RETURNING {}",
        TRAIN_COLUMNS
    ))
    .bind(train_id)
    .bind(seats)
    .bind(floor)
    .bind(expected)
    .fetch_optional(&mut **tx)
    .await
    .map_err(store_error)?;

    if let Some(row) = row {
        return Ok(Ok(row.into()));
    }

    let current: Option<i32> = sqlx::query_scalar("SELECT seats FROM trains WHERE id = $1")
        .bind(train_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(store_error)?;

    Ok(Err(match current {
        Some(current) => Rejection::GuardFailed { current },
        None => Rejection::MissingTrain,
    }))
}

async fn insert_booking(
    tx: &mut Transaction<'_, Postgres>,
    booking: &Booking,
) -> StoreResult<Result<(), Rejection>> {
    if booking.seats <= 0 {
        return Ok(Err(Rejection::NonPositiveSeats { seats: booking.seats }));
    }

    let result = sqlx::query(
        "INSERT INTO bookings (id, user_id, train_id, seats, created_at) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(booking.id)
    .bind(booking.user_id)
    .bind(booking.train_id)
    .bind(booking.seats)
    .bind(booking.created_at)
    .execute(&mut **tx)
    .await;

    match result {
        Ok(_) => Ok(Ok(())),
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            Ok(Err(Rejection::MissingTrain))
        }
        Err(err) => Err(store_error(err)),
    }
}

#[async_trait]
impl TransactionalStore for PgStore {
    async fn read_train(&self, id: Uuid) -> StoreResult<Option<Train>> {
        let row = sqlx::query_as::<_, TrainRow>(&format!(
            "SELECT {} FROM trains WHERE id = $1",
            TRAIN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Train::from))
    }

    async fn insert_train(&self, train: NewTrain) -> StoreResult<Train> {
        let train = Train::from_new(train);
        let row = sqlx::query_as::<_, TrainRow>(&format!(
            "INSERT INTO trains ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = TRAIN_COLUMNS
        ))
        .bind(train.id)
        .bind(&train.name)
        .bind(&train.source)
        .bind(&train.destination)
        .bind(train.seats)
        .bind(train.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.into())
    }

    async fn find_trains(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> StoreResult<Vec<Train>> {
        let rows = sqlx::query_as::<_, TrainRow>(&format!(
            "SELECT {} FROM trains \
             WHERE ($1::TEXT IS NULL OR source = $1) AND ($2::TEXT IS NULL OR destination = $2) \
             ORDER BY created_at, id",
            TRAIN_COLUMNS
        ))
        .bind(source)
        .bind(destination)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(Train::from).collect())
    }

    async fn commit_unit(&self, ops: Vec<UnitOp>) -> StoreResult<CommitOutcome> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;
        let mut trains = Vec::new();

        for (op_index, op) in ops.iter().enumerate() {
            let applied = match op {
                UnitOp::ReserveSeats { train_id, guard, seats } => {
                    reserve_seats(&mut tx, *train_id, *guard, *seats)
                        .await?
                        .map(|train| trains.push(train))
                }
                UnitOp::InsertBooking(booking) => insert_booking(&mut tx, booking).await?,
            };

            if let Err(reason) = applied {
                debug!(op_index, ?reason, "Unit of work rejected, rolling back");
                tx.rollback().await.map_err(store_error)?;
                return Ok(CommitOutcome::Rejected { op_index, reason });
            }
        }

        tx.commit().await.map_err(store_error)?;
        Ok(CommitOutcome::Committed { trains })
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<BookingWithTrain>> {
        let rows = sqlx::query_as::<_, BookingTrainRow>(
            r#"
            SELECT
                b.id, b.user_id, b.train_id, b.seats, b.created_at,
                t.name AS train_name, t.source AS train_source,
                t.destination AS train_destination, t.seats AS train_seats,
                t.created_at AS train_created_at
            FROM bookings b
            JOIN trains t ON t.id = b.train_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(BookingWithTrain::from).collect())
    }
}
