use std::sync::Arc;

use grover_service::GroverService;
use grover_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<GroverService>,
}
impl AppState {
	pub async fn new(config: grover_config::Config) -> color_eyre::Result<Self> {
		let store = QdrantStore::new(&config.storage.qdrant)?;

		store.ensure_collection().await?;

		Ok(Self { service: Arc::new(GroverService::new(config, store)) })
	}
}
