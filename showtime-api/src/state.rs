use showtime_booking::BookingEngine;
use showtime_catalog::{InMemoryCatalog, SeatLedger};
use showtime_core::Clock;
use showtime_hold::HoldManager;
use showtime_store::{Config, ConfigError, EventProducer};
use std::collections::HashSet;
use std::sync::Arc;

/// Pass/fail key check in front of `/v1`. No configured keys means open access.
#[derive(Clone, Default)]
pub struct ApiKeyGate {
    keys: Arc<HashSet<String>>,
}

impl ApiKeyGate {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: Arc::new(keys.into_iter().filter(|k| !k.is_empty()).collect()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub events: EventProducer,
    pub auth: ApiKeyGate,
}

impl AppState {
    pub fn new(engine: Arc<BookingEngine>, events: EventProducer, auth: ApiKeyGate) -> Self {
        Self { engine, events, auth }
    }

    /// Wire catalog, ledger, hold manager and engine from configuration.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let rules = &config.business_rules;
        let events = EventProducer::default();
        let catalog = Arc::new(InMemoryCatalog::from_shows(config.shows()));
        let holds = Arc::new(HoldManager::new(
            Arc::new(SeatLedger::new()),
            clock,
            events.clone(),
            rules.hold_ttl()?,
        ));
        let engine = Arc::new(BookingEngine::new(catalog, holds, rules.max_seats_per_hold));

        Ok(Self::new(engine, events, ApiKeyGate::new(config.auth.api_keys.clone())))
    }
}
