pub mod booking;
pub mod train;
pub mod user;
