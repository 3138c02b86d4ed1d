//! Application wiring - configuration, shared state, and the update loop.
//!
//! Architecture:
//! - Single process owning one roster, restored from disk at startup
//! - All mutating interactions serialize through one lock on [`SharedState`]
//! - Long-poll update loop against the Telegram Bot API
//! - HTTP health endpoint served in the background

use crate::error::{Error, Result};
use crate::handlers::Dispatcher;
use crate::health;
use crate::storage::Store;
use crate::sync::StatusMessage;
use crate::telegram::TelegramClient;
use rollcall_core::Roster;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Configuration for the bot.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bot API token. Required; startup fails without it.
    pub token: String,

    /// Data directory for roster state and the journal
    pub data_dir: PathBuf,

    /// Health endpoint listen address
    pub health_addr: SocketAddr,

    /// Bot API base URL (overridable for tests)
    pub api_url: String,

    /// Long-poll timeout in seconds
    pub poll_timeout_secs: u64,
}

impl AppConfig {
    /// Create config from environment variables with sensible defaults.
    ///
    /// A missing `ROLLCALL_BOT_TOKEN` is a configuration error and fatal to
    /// startup; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("ROLLCALL_BOT_TOKEN")
            .map_err(|_| Error::Config("ROLLCALL_BOT_TOKEN is not set".to_string()))?;

        let data_dir = PathBuf::from(
            std::env::var("ROLLCALL_DATA_DIR").unwrap_or_else(|_| "./rollcall-data".to_string()),
        );

        let health_addr = std::env::var("ROLLCALL_HEALTH_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| Error::Config("invalid ROLLCALL_HEALTH_ADDR".to_string()))?;

        let api_url = std::env::var("ROLLCALL_API_URL")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());

        let poll_timeout_secs = std::env::var("ROLLCALL_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            token,
            data_dir,
            health_addr,
            api_url,
            poll_timeout_secs,
        })
    }
}

/// Shared mutable state - one roster, its status message tracker, storage,
/// and the pending `/settitle` prompts. Held behind a single lock; every
/// interaction runs its whole check-mutate-journal-save-render-sync sequence
/// inside one acquisition.
pub struct SharedState {
    pub roster: Roster,
    pub status: StatusMessage,
    pub store: Store,
    /// Actors that were prompted for a title and whose next plain-text
    /// message will be captured as the new title.
    pub pending_titles: HashSet<i64>,
}

/// The bot application.
pub struct App {
    config: AppConfig,
    client: TelegramClient,
    state: Arc<Mutex<SharedState>>,
}

impl App {
    /// Restore state from disk and wire up the transport.
    pub fn new(config: AppConfig) -> Result<Self> {
        let store = Store::open(&config.data_dir)?;
        let persisted = store.load_state();

        let state = SharedState {
            roster: persisted.roster,
            status: StatusMessage::new(persisted.message_id),
            store,
            pending_titles: HashSet::new(),
        };

        // leave the long poll room to complete before the client gives up
        let request_timeout = Duration::from_secs(config.poll_timeout_secs + 30);
        let client = TelegramClient::new(&config.api_url, &config.token, request_timeout)?;

        Ok(Self {
            config,
            client,
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Run the bot (starts the health endpoint and the update loop).
    pub async fn run(self) -> Result<()> {
        tracing::info!("rollcall bot starting");
        tracing::info!("  Health: http://{}", self.config.health_addr);
        tracing::info!("  Data: {:?}", self.config.data_dir);

        let health_addr = self.config.health_addr;
        tokio::spawn(async move {
            if let Err(err) = health::serve(health_addr).await {
                tracing::error!("health endpoint error: {err}");
            }
        });

        let dispatcher = Dispatcher::new(
            self.client.clone(),
            self.client.clone(),
            Arc::clone(&self.state),
        );

        let mut offset = 0i64;
        loop {
            let updates = match self
                .client
                .get_updates(offset, self.config.poll_timeout_secs)
                .await
            {
                Ok(updates) => updates,
                Err(err) => {
                    tracing::error!("polling failed: {err}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Err(err) = dispatcher.handle_update(update).await {
                    // best-effort: state is saved, the chat view catches up
                    // on the next successful render
                    tracing::error!("update handling failed: {err}");
                }
            }
        }
    }
}
