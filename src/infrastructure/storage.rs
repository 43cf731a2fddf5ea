use crate::config::Settings;
use crate::services::storage::{FileStorage, LocalFileStorage};
use std::sync::Arc;
use tracing::info;

/// Folder (under the storage root) that holds images served by URL.
pub const IMAGES_FOLDER: &str = "images";

pub async fn setup_storage(settings: &Settings) -> anyhow::Result<Arc<LocalFileStorage>> {
    info!("🗄️  File storage root: {}", settings.file_server_root_path);

    let storage = LocalFileStorage::new(&settings.file_server_root_path);
    storage.create_folder_if_not_exists(IMAGES_FOLDER).await?;

    Ok(Arc::new(storage))
}
