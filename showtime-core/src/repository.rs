use async_trait::async_trait;

use crate::ids::ShowId;
use crate::show::Show;
use crate::CoreResult;

/// Read access to the external show catalog. Show existence and seat maps are
/// assumed stable for the lifetime of a show.
#[async_trait]
pub trait ShowCatalog: Send + Sync {
    async fn get_show(&self, show_id: ShowId) -> CoreResult<Option<Show>>;

    async fn list_shows(&self) -> CoreResult<Vec<Show>>;
}
