pub mod ids;
pub mod clock;
pub mod show;
pub mod identity;
pub mod repository;

pub use ids::{BookingId, HoldId, SeatId, ShowId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use show::{Show, ShowWindow};
pub use identity::UserIdentity;
pub use repository::ShowCatalog;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Catalog unavailable: {0}")]
    CatalogError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
