use rail_shared::{NewTrain, Train};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::repository::TransactionalStore;
use crate::{CoreError, CoreResult};

/// Train administration and read-only availability queries.
pub struct TrainService {
    store: Arc<dyn TransactionalStore>,
}

impl TrainService {
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    pub async fn create_train(&self, new: NewTrain) -> CoreResult<Train> {
        let new = NewTrain {
            name: required("name", new.name)?,
            source: required("source", new.source)?,
            destination: required("destination", new.destination)?,
            seats: new.seats,
        };
        if new.seats < 0 {
            return Err(CoreError::ValidationError(format!(
                "seats must not be negative, got {}",
                new.seats
            )));
        }

        let train = self.store.insert_train(new).await?;
        info!(train_id = %train.id, name = %train.name, seats = train.seats, "Train created");
        Ok(train)
    }

    pub async fn get_train(&self, id: Uuid) -> CoreResult<Train> {
        self.store
            .read_train(id)
            .await?
            .ok_or(CoreError::NotFoundError(id))
    }

    /// Trains on the given route. Reflects some committed state; booking re-checks anyway.
    pub async fn query_availability(
        &self,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> CoreResult<Vec<Train>> {
        Ok(self.store.find_trains(source, destination).await?)
    }
}

fn required(field: &str, value: String) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
