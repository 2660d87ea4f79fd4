//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The payment client
//! depends only on these traits, not on concrete implementations.

mod device;
mod identity;
mod session_store;

pub use device::DeviceInfoProvider;
pub use identity::IdentityProvider;
pub use session_store::SessionStore;
