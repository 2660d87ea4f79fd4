//! CampusPay Core - session store and payment service client
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Core entities (Session, Operation, Pin, DeviceInfo, errors)
//! - **ports**: Trait definitions for external dependencies (SessionStore, DeviceInfoProvider)
//! - **services**: Local infrastructure (migrations, key derivation, event log)
//! - **adapters**: Concrete implementations (DuckDB store, HTTP client, host device)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::device::HostDevice;
use adapters::duckdb_store::DuckDbSessionStore;
use adapters::identity::EnvIdentityProvider;

// Re-export commonly used types at crate root
pub use adapters::payment_api::PaymentClient;
pub use config::{ClientConfig, Config};
pub use domain::result::Error;
pub use domain::{
    AuthOutcome, DeviceIdentity, DeviceInfo, Operation, Pin, Session, SessionKey,
    TransactionHistory, UserType,
};
pub use ports::{DeviceInfoProvider, IdentityProvider, SessionStore};
pub use services::{EntryPoint, LogEntry, LogEvent, LoggingService};

/// Main context for CampusPay operations
///
/// Wires the persistent session store, the event log and the payment client
/// for one data directory.
pub struct CampusPayContext {
    pub data_dir: PathBuf,
    pub config: Config,
    pub store: Arc<DuckDbSessionStore>,
    pub events: Option<Arc<LoggingService>>,
    pub client: PaymentClient,
}

impl CampusPayContext {
    /// Open the context for `data_dir`
    ///
    /// `passphrase` unlocks (or creates) an encrypted session database.
    /// `api_url` overrides the configured service URL.
    pub fn new(
        data_dir: &Path,
        passphrase: Option<&str>,
        api_url: Option<&str>,
        entry_point: EntryPoint,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

        let mut config = Config::load(data_dir)?;
        if let Some(url) = api_url {
            config.api_url = Some(url.to_string());
        }
        let client_config = config.client_config()?;

        let store = Arc::new(
            DuckDbSessionStore::open(data_dir, passphrase)
                .context("Failed to open session store")?,
        );

        // The event log is best-effort
        let events = match LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION")) {
            Ok(service) => Some(Arc::new(service)),
            Err(e) => {
                log::warn!("[CampusPay] Event log unavailable: {}", e);
                None
            }
        };

        let mut client = PaymentClient::new(client_config, store.clone())?
            .with_device(Arc::new(HostDevice::new()))
            .with_identity_provider(Arc::new(EnvIdentityProvider::new()));
        if let Some(events) = &events {
            client = client.with_event_log(events.clone());
        }

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            config,
            store,
            events,
            client,
        })
    }
}
