use async_trait::async_trait;
use showtime_core::{CoreResult, Show, ShowCatalog, ShowId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local catalog, seeded from configuration. Stands in for the
/// external catalog service.
#[derive(Default)]
pub struct InMemoryCatalog {
    shows: RwLock<HashMap<ShowId, Show>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shows(shows: impl IntoIterator<Item = Show>) -> Self {
        Self {
            shows: RwLock::new(shows.into_iter().map(|show| (show.id, show)).collect()),
        }
    }

    pub async fn insert(&self, show: Show) {
        self.shows.write().await.insert(show.id, show);
    }
}

#[async_trait]
impl ShowCatalog for InMemoryCatalog {
    async fn get_show(&self, show_id: ShowId) -> CoreResult<Option<Show>> {
        Ok(self.shows.read().await.get(&show_id).cloned())
    }

    async fn list_shows(&self) -> CoreResult<Vec<Show>> {
        let mut shows: Vec<Show> = self.shows.read().await.values().cloned().collect();
        shows.sort_by_key(|show| show.id);
        Ok(shows)
    }
}
