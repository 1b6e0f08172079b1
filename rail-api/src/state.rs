use rail_core::{BookingPolicy, BookingService, TrainService, TransactionalStore, UserRepository};
use rail_shared::Secret;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Secret<String>,
    /// Token lifetime in seconds.
    pub expiration: u64,
    pub admin_api_key: Secret<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub trains: Arc<TrainService>,
    pub bookings: Arc<BookingService>,
    pub users: Arc<dyn UserRepository>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire every service onto one backing store.
    pub fn new<S>(store: Arc<S>, policy: BookingPolicy, auth: AuthConfig) -> Self
    where
        S: TransactionalStore + UserRepository + 'static,
    {
        Self {
            trains: Arc::new(TrainService::new(store.clone())),
            bookings: Arc::new(BookingService::new(store.clone(), policy)),
            users: store,
            auth,
        }
    }
}
