pub mod models;
pub mod pii;

pub use models::booking::{Booking, BookingRow, BookingStatus};
pub use models::events::{ChangeEvent, ChangeKind, Collection};
pub use models::visitor::Visitor;
pub use pii::Masked;
