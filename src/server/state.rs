use axum::extract::FromRef;

use crate::discovery_store::{CatalogStore, InteractionStore};
use std::sync::Arc;
use std::time::Instant;

pub type SharedCatalogStore = Arc<dyn CatalogStore>;
pub type SharedInteractionStore = Arc<dyn InteractionStore>;

#[derive(Clone)]
pub struct ServerState {
    pub start_time: Instant,
    pub catalog: SharedCatalogStore,
    pub interactions: SharedInteractionStore,
}

impl FromRef<ServerState> for SharedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for SharedInteractionStore {
    fn from_ref(input: &ServerState) -> Self {
        input.interactions.clone()
    }
}
