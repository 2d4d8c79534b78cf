//! Application state wiring the chat service to its concrete adapters.
//!
//! ChatService is generic over its storage and sender ports; AppState pins
//! it to the SQLite store and the configured push sender.

use std::path::PathBuf;
use std::sync::Arc;

use haggle_core::chat::ChatService;
use haggle_core::notify::NotificationDispatcher;
use haggle_infra::config::load_config;
use haggle_infra::push::ConfiguredSender;
use haggle_infra::sqlite::pool::database_url;
use haggle_infra::sqlite::{DatabasePool, SqliteChatStore};

pub type ConcreteChatService = ChatService<SqliteChatStore, ConfiguredSender>;

/// Shared application state, used by both CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Create the data directory, open the database, and wire the service.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        let sender = ConfiguredSender::from_settings(&config.notifications)?;
        let dispatcher = NotificationDispatcher::new(sender, config.notifications.title.clone());
        let chat_service = ChatService::new(
            SqliteChatStore::new(db_pool),
            dispatcher,
            config.chat.clone(),
        );

        tracing::info!(data_dir = %data_dir.display(), "Application state initialized");

        Ok(Self {
            chat_service: Arc::new(chat_service),
            data_dir,
        })
    }
}
