pub mod models;
pub mod secret;

pub use models::booking::{Booking, BookingWithTrain};
pub use models::train::{NewTrain, Train};
pub use models::user::{NewUser, Role, User};
pub use secret::Secret;
