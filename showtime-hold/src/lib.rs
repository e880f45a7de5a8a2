pub mod models;
pub mod manager;
pub mod sweeper;

pub use models::{Hold, HoldState};
pub use manager::{HoldError, HoldManager};
pub use sweeper::{ExpirySweeper, SweepReport};
