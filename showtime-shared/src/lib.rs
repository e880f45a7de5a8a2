pub mod models;
pub mod pii;

pub use models::events::{
    BookingConfirmedEvent, HoldCreatedEvent, HoldReleasedEvent, ReleaseReason, SeatEvent,
};
pub use pii::Masked;
