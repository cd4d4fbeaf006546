pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod error;
pub mod events;
pub mod filters;
pub mod visitor_repo;

pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use error::{StoreError, StoreResult};
pub use events::{ChangeFeed, CHANGE_CHANNEL};
pub use visitor_repo::StoreVisitorRepository;
