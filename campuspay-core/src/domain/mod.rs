//! Core domain entities
//!
//! Pure data structures shared by the client, the session store and callers.
//! No I/O happens here.

mod device;
mod encryption;
mod operation;
mod payment;
pub mod result;
mod session;

pub use device::{or_unknown, DeviceIdentity, DeviceInfo, UNKNOWN};
pub use encryption::{Argon2Params, EncryptionMetadata};
pub use operation::Operation;
pub use payment::{json_amount, PaymentRequest, Pin, TransactionHistory};
pub use session::{AuthOutcome, Session, SessionKey, UserType};
