//! Service layer
//!
//! Local infrastructure shared by the adapters: schema migrations, session
//! key derivation and the event log.

pub mod encryption;
pub mod logging;
pub mod migration;

pub use encryption::EncryptionService;
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
