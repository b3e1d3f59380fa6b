#[allow(clippy::module_inception)]
mod server;
pub mod state;

pub use server::run_server;
pub use state::{ServerState, SharedCatalogStore, SharedInteractionStore};
