pub mod show_catalog;
pub mod ledger;

pub use show_catalog::InMemoryCatalog;
pub use ledger::{LedgerError, SeatAvailability, SeatLedger, SeatStatus};
