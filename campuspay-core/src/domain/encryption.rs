//! Encryption-at-rest models for the session database

use serde::{Deserialize, Serialize};

/// Default Argon2id parameters
pub const DEFAULT_TIME_COST: u32 = 3;
pub const DEFAULT_MEMORY_COST: u32 = 65536; // 64 MiB
pub const DEFAULT_PARALLELISM: u32 = 4;
pub const DEFAULT_HASH_LEN: u32 = 32;

/// Argon2id parameters for key derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    pub time_cost: u32,
    pub memory_cost: u32,
    pub parallelism: u32,
    pub hash_len: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
            hash_len: DEFAULT_HASH_LEN,
        }
    }
}

/// Key-derivation metadata stored next to an encrypted session database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    /// Base64-encoded random salt
    pub salt: String,
    pub algorithm: String,
    pub version: u32,
    pub argon2_params: Argon2Params,
}

impl EncryptionMetadata {
    pub fn new(salt: String, argon2_params: Argon2Params) -> Self {
        Self {
            salt,
            algorithm: "argon2id".to_string(),
            version: 1,
            argon2_params,
        }
    }
}
