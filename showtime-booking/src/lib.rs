pub mod models;
pub mod error;
pub mod finalizer;
pub mod engine;

pub use models::{Booking, BookingStatus};
pub use error::BookingError;
pub use finalizer::BookingFinalizer;
pub use engine::{BookingEngine, SeatMap};
